//! Ordered fallback across several providers.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::PriceSeriesProvider;
use log::{info, warn};

/// Tries each provider in order and returns the first series fetched.
pub struct FallbackProvider {
    providers: Vec<Box<dyn PriceSeriesProvider>>,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Box<dyn PriceSeriesProvider>>) -> Self {
        Self { providers }
    }
}

impl PriceSeriesProvider for FallbackProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    /// Fails with `DataUnavailable` listing every attempt when no provider
    /// yields a series.
    fn fetch(&self) -> Result<PriceSeries, BacktestError> {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.fetch() {
                Ok(series) => {
                    info!("loaded {} bars from {}", series.len(), provider.name());
                    return Ok(series);
                }
                Err(e) => {
                    warn!("data source {} failed: {}", provider.name(), e);
                    attempts.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        Err(BacktestError::DataUnavailable { attempts })
    }
}
