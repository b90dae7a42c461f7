//! CSV file price adapter.
//!
//! Reads a daily `date,open,high,low,close,volume` file. Header names are
//! matched case-insensitively and only `date` and `close` are required:
//! missing open/high/low fall back to the close and missing volume to 0.
//! Rows with an empty, `null` or unparseable date or close are skipped.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::data_port::PriceSeriesProvider;
use chrono::NaiveDate;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start_date: None,
            end_date: None,
        }
    }

    /// Keep only bars within `[start, end]`; either bound may be open.
    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    fn source_error(&self, reason: impl Into<String>) -> BacktestError {
        BacktestError::DataSource {
            source_name: self.name().to_string(),
            reason: reason.into(),
        }
    }

    fn read_bars(&self) -> Result<Vec<PriceBar>, BacktestError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.source_error(format!("failed to read {}: {}", self.path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| self.source_error(format!("CSV header error: {}", e)))?
            .clone();
        let columns = Columns::locate(&headers)
            .ok_or_else(|| self.source_error("CSV must have date and close columns"))?;

        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| self.source_error(format!("CSV parse error: {}", e)))?;
            match columns.parse(&record) {
                Some(bar) => bars.push(bar),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("{}: skipped {} unusable rows", self.path.display(), skipped);
        }
        if bars.is_empty() {
            return Err(self.source_error(format!("no usable rows in {}", self.path.display())));
        }
        Ok(bars)
    }
}

impl PriceSeriesProvider for CsvAdapter {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self) -> Result<PriceSeries, BacktestError> {
        let series = PriceSeries::new(self.read_bars()?)?;
        let filtered = series.slice_dates(self.start_date, self.end_date)?;
        debug!(
            "loaded {} bars from {}",
            filtered.len(),
            self.path.display()
        );
        Ok(filtered)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Option<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Some(Columns {
            date: find("date")?,
            close: find("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }

    fn parse(&self, record: &csv::StringRecord) -> Option<PriceBar> {
        let field = |idx: Option<usize>| -> Option<f64> {
            let raw = record.get(idx?)?.trim();
            if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
                return None;
            }
            raw.parse().ok()
        };

        let date = NaiveDate::parse_from_str(record.get(self.date)?.trim(), "%Y-%m-%d").ok()?;
        let close = field(Some(self.close))?;

        Some(PriceBar {
            date,
            open: field(self.open).unwrap_or(close),
            high: field(self.high).unwrap_or(close),
            low: field(self.low).unwrap_or(close),
            close,
            volume: field(self.volume).unwrap_or(0.0),
        })
    }
}
