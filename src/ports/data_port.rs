//! Price data port.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;

/// A source of one validated daily price series.
///
/// Implementations are shared across sweep workers, hence `Send + Sync`.
pub trait PriceSeriesProvider: Send + Sync {
    /// Short name used in logs and in `DataUnavailable` attempts.
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<PriceSeries, BacktestError>;
}

impl<P: PriceSeriesProvider + ?Sized> PriceSeriesProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self) -> Result<PriceSeries, BacktestError> {
        (**self).fetch()
    }
}
