//! Parameter sweep over moving-average window pairs.

use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

use super::backtest::{run_backtest, BacktestConfig};
use super::error::BacktestError;
use super::metrics::Metrics;
use super::ohlcv::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
}

impl ParamGrid {
    pub fn new(short_windows: Vec<usize>, long_windows: Vec<usize>) -> Self {
        ParamGrid {
            short_windows,
            long_windows,
        }
    }

    /// Window pairs to run, skipping any with `short >= long`.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.short_windows
            .iter()
            .flat_map(|&short| self.long_windows.iter().map(move |&long| (short, long)))
            .filter(|(short, long)| short < long)
            .collect()
    }

    pub fn configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        self.pairs()
            .into_iter()
            .map(|(short_window, long_window)| BacktestConfig {
                short_window,
                long_window,
                ..base.clone()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepOutcome {
    pub short_window: usize,
    pub long_window: usize,
    pub summary: Metrics,
}

/// Run one backtest per grid pair in parallel. Outcomes are ranked by
/// Sharpe ratio, then total return, best first. The first failing run
/// aborts the sweep.
pub fn run_sweep(
    prices: &PriceSeries,
    base: &BacktestConfig,
    grid: &ParamGrid,
) -> Result<Vec<SweepOutcome>, BacktestError> {
    let configs = grid.configs(base);
    log::info!("sweeping {} window pairs over {} bars", configs.len(), prices.len());

    let mut outcomes = configs
        .par_iter()
        .map(|config| {
            run_backtest(prices, config).map(|result| SweepOutcome {
                short_window: config.short_window,
                long_window: config.long_window,
                summary: result.summary,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    outcomes.sort_by(rank);
    Ok(outcomes)
}

fn rank(a: &SweepOutcome, b: &SweepOutcome) -> Ordering {
    b.summary
        .sharpe_ratio
        .total_cmp(&a.summary.sharpe_ratio)
        .then_with(|| b.summary.total_return.total_cmp(&a.summary.total_return))
        .then_with(|| (a.short_window, a.long_window).cmp(&(b.short_window, b.long_window)))
}
