//! Configuration validation.
//!
//! `validate_params` checks a fully built `BacktestConfig` before any run.
//! `validate_config_file` checks the raw INI keys that never reach the
//! engine (data sources, dates, report format, shorting).

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::BacktestError;
use crate::domain::signal::MIN_SHORT_WINDOW;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub const MAX_SHORT_WINDOW: usize = 200;
pub const MIN_LONG_WINDOW: usize = 5;
pub const MAX_LONG_WINDOW: usize = 400;
pub const MAX_RATE: f64 = 0.01;
pub const MAX_STOP_LOSS_PCT: f64 = 50.0;
pub const MAX_TAKE_PROFIT_PCT: f64 = 100.0;
pub const MAX_TRAILING_STOP_PCT: f64 = 50.0;

pub const KNOWN_SOURCES: [&str; 2] = ["csv", "synthetic"];
pub const KNOWN_FORMATS: [&str; 2] = ["json", "csv"];

pub fn validate_params(config: &BacktestConfig) -> Result<(), BacktestError> {
    validate_windows(config)?;
    validate_initial_capital(config.initial_capital)?;
    validate_range("backtest", "fee_rate", config.fee_rate, 0.0, MAX_RATE)?;
    validate_range("backtest", "slippage_rate", config.slippage_rate, 0.0, MAX_RATE)?;
    validate_range(
        "strategy",
        "stop_loss_pct",
        config.stop_loss_pct,
        0.0,
        MAX_STOP_LOSS_PCT,
    )?;
    validate_range(
        "strategy",
        "take_profit_pct",
        config.take_profit_pct,
        0.0,
        MAX_TAKE_PROFIT_PCT,
    )?;
    validate_range(
        "strategy",
        "trailing_stop_pct",
        config.trailing_stop_pct,
        0.0,
        MAX_TRAILING_STOP_PCT,
    )?;
    validate_position_size(config.position_size_pct)?;
    Ok(())
}

pub fn validate_config_file(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_shorting(config)?;
    validate_sources(config)?;
    validate_dates(config)?;
    validate_report_format(config)?;
    Ok(())
}

fn validate_windows(config: &BacktestConfig) -> Result<(), BacktestError> {
    let short = config.short_window;
    let long = config.long_window;
    if !(MIN_SHORT_WINDOW..=MAX_SHORT_WINDOW).contains(&short) {
        return Err(BacktestError::invalid(
            "strategy",
            "short_window",
            format!("short_window must be between {MIN_SHORT_WINDOW} and {MAX_SHORT_WINDOW}"),
        ));
    }
    if !(MIN_LONG_WINDOW..=MAX_LONG_WINDOW).contains(&long) {
        return Err(BacktestError::invalid(
            "strategy",
            "long_window",
            format!("long_window must be between {MIN_LONG_WINDOW} and {MAX_LONG_WINDOW}"),
        ));
    }
    if short >= long {
        return Err(BacktestError::invalid(
            "strategy",
            "short_window",
            format!("short_window ({short}) must be less than long_window ({long})"),
        ));
    }
    Ok(())
}

fn validate_initial_capital(value: f64) -> Result<(), BacktestError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BacktestError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_range(
    section: &str,
    key: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), BacktestError> {
    if !value.is_finite() || value < min || value > max {
        return Err(BacktestError::invalid(
            section,
            key,
            format!("{key} must be between {min} and {max}"),
        ));
    }
    Ok(())
}

fn validate_position_size(value: f64) -> Result<(), BacktestError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(BacktestError::invalid(
            "strategy",
            "position_size_pct",
            "position_size_pct must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_shorting(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if config.get_bool("backtest", "allow_shorting", false) {
        return Err(BacktestError::invalid(
            "backtest",
            "allow_shorting",
            "short selling is not supported",
        ));
    }
    Ok(())
}

fn validate_sources(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let sources = source_list(config);
    if sources.is_empty() {
        return Err(BacktestError::ConfigMissing {
            section: "data".to_string(),
            key: "sources".to_string(),
        });
    }
    if let Some(unknown) = sources.iter().find(|s| !KNOWN_SOURCES.contains(&s.as_str())) {
        return Err(BacktestError::invalid(
            "data",
            "sources",
            format!("unknown source '{unknown}', expected one of {KNOWN_SOURCES:?}"),
        ));
    }
    if sources.iter().any(|s| s == "csv") && config.get_string("data", "csv_path").is_none() {
        return Err(BacktestError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_path".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start = read_date(config, "data", "start_date")?;
    let end = read_date(config, "data", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(BacktestError::invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    read_date(config, "data", "synthetic_start")?;
    Ok(())
}

fn validate_report_format(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("report", "format") {
        Some(format) if !KNOWN_FORMATS.contains(&format.trim().to_lowercase().as_str()) => {
            Err(BacktestError::invalid(
                "report",
                "format",
                format!("unknown format '{format}', expected json or csv"),
            ))
        }
        _ => Ok(()),
    }
}

/// `[data] sources` as a lowercase, comma-separated fallback order.
/// Defaults to `synthetic` when the key is absent.
pub fn source_list(config: &dyn ConfigPort) -> Vec<String> {
    match config.get_string("data", "sources") {
        Some(value) => value
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec!["synthetic".to_string()],
    }
}

/// Optional `YYYY-MM-DD` value.
pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, BacktestError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                BacktestError::invalid(
                    section,
                    key,
                    format!("invalid {key} '{s}', expected YYYY-MM-DD"),
                )
            }),
    }
}

/// Numeric value with a default for a missing key. A present but
/// unparseable value is an error rather than silently defaulted.
pub fn read_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BacktestError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s.trim().parse().map_err(|_| {
            BacktestError::invalid(section, key, format!("'{s}' is not a valid number"))
        }),
    }
}
