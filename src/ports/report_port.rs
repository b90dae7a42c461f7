//! Report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use std::path::{Path, PathBuf};

/// Port for writing backtest reports.
pub trait ReportPort {
    /// Write `result` to `output_path`, returning every file written.
    fn write(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError>;
}
