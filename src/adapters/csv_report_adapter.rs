//! CSV report adapter.
//!
//! Writes two files next to the requested path: `<stem>_equity.csv` with one
//! row per equity point and `<stem>_trades.csv` with one row per trade.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// `(equity, trades)` paths derived from `output_path`.
    pub fn output_paths(output_path: &Path) -> (PathBuf, PathBuf) {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        let dir = output_path.parent().unwrap_or_else(|| Path::new(""));
        (
            dir.join(format!("{stem}_equity.csv")),
            dir.join(format!("{stem}_trades.csv")),
        )
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BacktestError> {
    let mut writer = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
    for row in rows {
        writer.serialize(row).map_err(std::io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let (equity_path, trades_path) = Self::output_paths(output_path);
        write_rows(&equity_path, &result.equity_curve)?;
        write_rows(&trades_path, &result.trades)?;
        Ok(vec![equity_path, trades_path])
    }
}
