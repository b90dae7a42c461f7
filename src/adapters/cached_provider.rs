//! Memoizing provider decorator.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::PriceSeriesProvider;
use log::debug;
use std::sync::OnceLock;

/// Fetches from the inner provider once and serves clones afterwards.
///
/// Only a successful fetch is stored; after an error the next call tries the
/// inner provider again.
pub struct CachedProvider<P> {
    inner: P,
    cache: OnceLock<PriceSeries>,
}

impl<P: PriceSeriesProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: OnceLock::new(),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl<P: PriceSeriesProvider> PriceSeriesProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self) -> Result<PriceSeries, BacktestError> {
        if let Some(series) = self.cache.get() {
            debug!("{}: serving {} cached bars", self.name(), series.len());
            return Ok(series.clone());
        }
        let series = self.inner.fetch()?;
        Ok(self.cache.get_or_init(|| series).clone())
    }
}
