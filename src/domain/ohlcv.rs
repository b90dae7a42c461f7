//! Daily price bars and the validated price series the engine consumes.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar with open/high/low pinned to the close.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        PriceBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Date-ascending sequence of bars with unique dates and positive closes.
///
/// The series is never mutated after construction, so a single instance can
/// be shared read-only across concurrent backtests.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts `bars` by date and validates the series invariants.
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self, BacktestError> {
        if bars.is_empty() {
            return Err(BacktestError::InsufficientData {
                bars: 0,
                minimum: 1,
            });
        }

        bars.sort_by_key(|b| b.date);

        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(BacktestError::InvalidSeries {
                reason: format!("duplicate bar for {}", pair[0].date),
            });
        }

        // A series without a single positive close has no usable bars.
        if bars.iter().all(|b| b.close <= 0.0) {
            return Err(BacktestError::InsufficientData {
                bars: 0,
                minimum: 1,
            });
        }

        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
            return Err(BacktestError::InvalidSeries {
                reason: format!("close on {} must be positive, got {}", bad.date, bad.close),
            });
        }

        Ok(PriceSeries { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Keeps only bars within `[start, end]`, re-validating the remainder.
    pub fn slice_dates(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, BacktestError> {
        let bars = self
            .bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e))
            .cloned()
            .collect();
        PriceSeries::new(bars)
    }
}
