//! JSON report adapter: the full `BacktestResult` as pretty-printed JSON.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(result: &BacktestResult) -> Result<String, BacktestError> {
        Ok(serde_json::to_string_pretty(result)?)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<Vec<PathBuf>, BacktestError> {
        let json = Self::render(result)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;
        Ok(vec![output_path.to_path_buf()])
    }
}
