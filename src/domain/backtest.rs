//! Backtest engine and event loop.
//!
//! `BacktestConfig` defines the strategy, cost and risk parameters of a run.
//! `simulate` walks the series bar by bar; `run_backtest` chains validation,
//! signal generation, simulation and metrics into a single `BacktestResult`.

use log::{debug, info};
use serde::Serialize;

use super::config_validation::validate_params;
use super::error::BacktestError;
use super::execution::{
    check_triggers, enter_long, exit_position, EntryResult, ExecutionConfig, ExecutionParams,
};
use super::metrics::Metrics;
use super::ohlcv::PriceSeries;
use super::portfolio::{EquityPoint, PortfolioState};
use super::position::{ExitReason, Trade};
use super::signal::{compute_signal, SignalSeries};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub slippage_rate: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    pub position_size_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            short_window: 10,
            long_window: 50,
            initial_capital: 10_000.0,
            fee_rate: 0.001,
            slippage_rate: 0.0005,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            trailing_stop_pct: 0.0,
            position_size_pct: 1.0,
        }
    }
}

impl BacktestConfig {
    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            fee_rate: self.fee_rate,
            slippage_rate: self.slippage_rate,
            position_size_pct: self.position_size_pct,
        }
    }

    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams {
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            trailing_stop_pct: self.trailing_stop_pct,
        }
    }
}

/// Raw engine output before metrics are reduced from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub params: BacktestConfig,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub summary: Metrics,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.summary.final_equity
    }
}

/// Walk the series and trade the lagged crossover signal.
///
/// Per bar (from the second bar on), the first rule that fires wins:
/// stop-loss, take-profit, trailing stop, then the signal transition.
/// A risk exit forces the previous position to flat, so the next bar
/// re-enters if the lagged signal is still long.
/// A position still open after the final bar is closed at its close with
/// `EndOfData`. Equity is recorded for every bar with both averages defined.
pub fn simulate(prices: &PriceSeries, signal: &SignalSeries, config: &BacktestConfig) -> Simulation {
    assert_eq!(
        prices.len(),
        signal.len(),
        "signal series must be aligned with the price series"
    );

    let bars = prices.bars();
    let exec = config.execution_config();
    let params = config.execution_params();
    let last = bars.len().saturating_sub(1);

    let mut portfolio = PortfolioState::new(config.initial_capital);
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut prev_long = false;

    for (i, bar) in bars.iter().enumerate() {
        let close = bar.close;

        if i > 0 {
            let forced = portfolio
                .position
                .as_mut()
                .and_then(|pos| check_triggers(pos, close, &params));

            if let Some(reason) = forced {
                if let Some(trade) = exit_position(&mut portfolio, close, i, bar.date, reason, &exec) {
                    debug!("bar {i}: exit {reason} at {close:.4}, pnl {:.2}", trade.pnl);
                    trades.push(trade);
                }
                prev_long = false;
            } else {
                let was_long = prev_long;
                let is_long = signal.position(i);
                prev_long = is_long;

                if !was_long && is_long && !portfolio.is_long() {
                    if let EntryResult::Entered { quantity, cost, .. } =
                        enter_long(&mut portfolio, close, i, bar.date, &exec)
                    {
                        debug!("bar {i}: enter {quantity:.6} at {close:.4}, cost {cost:.2}");
                    }
                } else if was_long && !is_long {
                    if let Some(trade) =
                        exit_position(&mut portfolio, close, i, bar.date, ExitReason::Signal, &exec)
                    {
                        debug!("bar {i}: exit signal at {close:.4}, pnl {:.2}", trade.pnl);
                        trades.push(trade);
                    }
                }
            }
        }

        if i == last {
            if let Some(trade) =
                exit_position(&mut portfolio, close, i, bar.date, ExitReason::EndOfData, &exec)
            {
                debug!("bar {i}: exit end_of_data at {close:.4}, pnl {:.2}", trade.pnl);
                trades.push(trade);
            }
        }

        if let (Some(ma_short), Some(ma_long)) = (signal.ma_short.get(i), signal.ma_long.get(i)) {
            equity_curve.push(EquityPoint {
                date: bar.date,
                close,
                ma_short,
                ma_long,
                equity: portfolio.equity(close),
                position: u8::from(portfolio.is_long()),
            });
        }
    }

    Simulation {
        equity_curve,
        trades,
    }
}

/// Validate `config`, derive the signal, simulate and summarize.
pub fn run_backtest(
    prices: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    validate_params(config)?;

    let signal = compute_signal(prices, config.short_window, config.long_window)?;
    let Simulation {
        equity_curve,
        trades,
    } = simulate(prices, &signal, config);
    let summary = Metrics::compute(&equity_curve, &trades, config.initial_capital);

    info!(
        "backtest SMA({})/SMA({}) over {} bars: {} trades, total return {:.2}%",
        config.short_window,
        config.long_window,
        prices.len(),
        summary.num_trades,
        summary.total_return * 100.0,
    );

    Ok(BacktestResult {
        params: config.clone(),
        equity_curve,
        trades,
        summary,
    })
}
