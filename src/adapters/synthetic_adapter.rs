//! Seeded random-walk price generator.
//!
//! Produces one bar per calendar day. Each close moves by a uniform daily
//! change in `[-5%, 5%)` and is floored at a quarter of the start price.
//! Open/high/low are jittered around the close and every price is rounded
//! to cents. The same seed always yields the same series.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::data_port::PriceSeriesProvider;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_BARS: usize = 1500;
pub const DEFAULT_START_PRICE: f64 = 430.0;

const MAX_DAILY_MOVE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticAdapter {
    seed: u64,
    bars: usize,
    start_date: NaiveDate,
    start_price: f64,
}

impl SyntheticAdapter {
    pub fn new(seed: u64, bars: usize, start_date: NaiveDate, start_price: f64) -> Self {
        Self {
            seed,
            bars,
            start_date,
            start_price,
        }
    }

    pub fn default_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default()
    }

    fn generate(&self) -> Vec<PriceBar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let floor = self.start_price / 4.0;
        let mut price = self.start_price;

        (0..self.bars)
            .map(|i| {
                price *= 1.0 + rng.gen_range(-MAX_DAILY_MOVE..MAX_DAILY_MOVE);
                price = price.max(floor);

                let open = price * rng.gen_range(0.98..1.02);
                let high = open.max(price) * rng.gen_range(1.0..1.03);
                let low = open.min(price) * rng.gen_range(0.97..1.0);
                let volume = rng.gen_range(1.0e7..5.0e7);

                PriceBar {
                    date: self.start_date + Duration::days(i as i64),
                    open: round_cents(open),
                    high: round_cents(high),
                    low: round_cents(low),
                    close: round_cents(price),
                    volume: round_cents(volume),
                }
            })
            .collect()
    }
}

impl Default for SyntheticAdapter {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEED,
            DEFAULT_BARS,
            Self::default_start_date(),
            DEFAULT_START_PRICE,
        )
    }
}

impl PriceSeriesProvider for SyntheticAdapter {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self) -> Result<PriceSeries, BacktestError> {
        if !self.start_price.is_finite() || self.start_price <= 0.0 {
            return Err(BacktestError::DataSource {
                source_name: self.name().to_string(),
                reason: format!("start price must be positive, got {}", self.start_price),
            });
        }
        PriceSeries::new(self.generate())
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_series() {
        let a = SyntheticAdapter::default().fetch().unwrap();
        let b = SyntheticAdapter::default().fetch().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_BARS);
    }

    #[test]
    fn different_seed_different_series() {
        let start = SyntheticAdapter::default_start_date();
        let a = SyntheticAdapter::new(1, 50, start, 100.0).fetch().unwrap();
        let b = SyntheticAdapter::new(2, 50, start, 100.0).fetch().unwrap();
        assert_ne!(a.closes(), b.closes());
    }

    #[test]
    fn bars_are_daily_and_well_formed() {
        let start = SyntheticAdapter::default_start_date();
        let series = SyntheticAdapter::new(7, 400, start, 430.0).fetch().unwrap();

        assert_eq!(series.first_date(), start);
        assert_eq!(series.last_date(), start + Duration::days(399));
        for bar in series.bars() {
            assert!(bar.close >= 430.0 / 4.0 - 0.01);
            assert!(bar.high >= bar.low);
            assert!(bar.volume >= 1.0e7);
        }
    }

    #[test]
    fn zero_bars_is_insufficient_data() {
        let start = SyntheticAdapter::default_start_date();
        let err = SyntheticAdapter::new(1, 0, start, 100.0).fetch().unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientData { .. }));
    }

    #[test]
    fn non_positive_start_price_is_rejected() {
        let start = SyntheticAdapter::default_start_date();
        let err = SyntheticAdapter::new(1, 10, start, 0.0).fetch().unwrap_err();
        assert!(matches!(err, BacktestError::DataSource { .. }));
    }
}
