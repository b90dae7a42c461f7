//! Domain error types.

/// Top-level error type for macross.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("data source {source_name} failed: {reason}")]
    DataSource { source_name: String, reason: String },

    #[error("price data unavailable, all sources failed: {}", attempts.join("; "))]
    DataUnavailable { attempts: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BacktestError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input (bad parameters, bad or
    /// missing data), false for environment failures and defects.
    pub fn is_client_error(&self) -> bool {
        match self {
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. }
            | BacktestError::InsufficientData { .. }
            | BacktestError::InvalidSeries { .. }
            | BacktestError::DataUnavailable { .. } => true,
            BacktestError::DataSource { .. }
            | BacktestError::Io(_)
            | BacktestError::Json(_) => false,
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Json(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::InsufficientData { .. } | BacktestError::InvalidSeries { .. } => 4,
            BacktestError::DataSource { .. } | BacktestError::DataUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
