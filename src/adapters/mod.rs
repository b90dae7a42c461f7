//! Concrete adapter implementations for ports.

pub mod cached_provider;
pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod fallback_provider;
pub mod file_config_adapter;
pub mod json_report_adapter;
pub mod synthetic_adapter;
