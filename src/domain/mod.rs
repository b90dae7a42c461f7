//! Core domain types and logic: price data, indicators, the simulation
//! engine and the metrics reducer. Nothing here performs I/O.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
