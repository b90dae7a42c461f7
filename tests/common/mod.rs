#![allow(dead_code)]

use chrono::NaiveDate;
use macross::domain::backtest::BacktestConfig;
use macross::domain::error::BacktestError;
pub use macross::domain::ohlcv::{PriceBar, PriceSeries};
use macross::ports::data_port::PriceSeriesProvider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory provider returning fixed bars or a fixed failure.
pub struct MockProvider {
    pub name: String,
    pub bars: Vec<PriceBar>,
    pub error: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bars: Vec::new(),
            error: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_bars(mut self, bars: Vec<PriceBar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    /// Shared handle on the fetch counter, readable after the mock is moved.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PriceSeriesProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<PriceSeries, BacktestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.error {
            return Err(BacktestError::DataSource {
                source_name: self.name.clone(),
                reason: reason.clone(),
            });
        }
        PriceSeries::new(self.bars.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per calendar day from 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(start + chrono::Duration::days(i as i64), c))
        .collect()
}

pub fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new(bars_from_closes(closes)).unwrap()
}

/// `flat` bars at 100 followed by `high`.
pub fn step_series(flat: usize, high: &[f64]) -> PriceSeries {
    let mut closes = vec![100.0; flat];
    closes.extend_from_slice(high);
    series(&closes)
}

/// Deterministic oscillating trend, long enough for default windows.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.1 * t + 12.0 * (t / 15.0).sin()
        })
        .collect()
}

/// Short windows, no costs, no risk exits.
pub fn frictionless(short: usize, long: usize) -> BacktestConfig {
    BacktestConfig {
        short_window: short,
        long_window: long,
        fee_rate: 0.0,
        slippage_rate: 0.0,
        ..BacktestConfig::default()
    }
}

pub fn csv_content(closes: &[f64]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for bar in bars_from_closes(closes) {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    out
}
