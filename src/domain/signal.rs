//! Dual moving-average crossover signal.
//!
//! `signal[i]` is long iff both averages are defined at `i` and the short
//! average is strictly above the long one. Equal averages resolve to flat.
//! The engine acts on `signal[i - 1]` at bar `i`; bar 0 is always flat.

use super::error::BacktestError;
use super::indicator::sma::calculate_sma;
use super::indicator::IndicatorSeries;
use super::ohlcv::PriceSeries;

pub const MIN_SHORT_WINDOW: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub ma_short: IndicatorSeries,
    pub ma_long: IndicatorSeries,
    pub signals: Vec<bool>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Position acted on at bar `index`: the previous bar's signal.
    pub fn position(&self, index: usize) -> bool {
        index > 0 && self.signals.get(index - 1).copied().unwrap_or(false)
    }
}

pub fn compute_signal(
    prices: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<SignalSeries, BacktestError> {
    if short_window < MIN_SHORT_WINDOW {
        return Err(BacktestError::invalid(
            "strategy",
            "short_window",
            format!("short_window must be at least {MIN_SHORT_WINDOW}"),
        ));
    }
    if short_window >= long_window {
        return Err(BacktestError::invalid(
            "strategy",
            "short_window",
            "short_window must be less than long_window",
        ));
    }
    if prices.len() < long_window {
        return Err(BacktestError::InsufficientData {
            bars: prices.len(),
            minimum: long_window,
        });
    }

    let closes = prices.closes();
    let ma_short = calculate_sma(&closes, short_window);
    let ma_long = calculate_sma(&closes, long_window);

    let signals = ma_short
        .values
        .iter()
        .zip(&ma_long.values)
        .map(|pair| matches!(pair, (Some(s), Some(l)) if s > l))
        .collect();

    Ok(SignalSeries {
        ma_short,
        ma_long,
        signals,
    })
}
