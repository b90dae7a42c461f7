//! Performance metrics reduced from an equity curve and its trade log.
//!
//! Ratios with no meaningful value are `None` (serialized as `null`) rather
//! than an infinite sentinel. Every float goes through a finite-or-null
//! serializer so reports never carry NaN or infinity.

use serde::{Serialize, Serializer};

use super::portfolio::EquityPoint;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    #[serde(serialize_with = "finite_or_null")]
    pub total_return: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub cagr: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub annualized_volatility: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub sharpe_ratio: f64,
    /// `None` when there is no downside and the run made money.
    #[serde(serialize_with = "option_finite_or_null")]
    pub sortino_ratio: Option<f64>,
    #[serde(serialize_with = "finite_or_null")]
    pub calmar_ratio: f64,
    /// Deepest peak-to-trough decline, as a non-positive fraction.
    #[serde(serialize_with = "finite_or_null")]
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub num_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    #[serde(serialize_with = "finite_or_null")]
    pub win_rate: f64,
    #[serde(serialize_with = "option_finite_or_null")]
    pub profit_factor: Option<f64>,
    #[serde(serialize_with = "option_finite_or_null")]
    pub avg_win_pct: Option<f64>,
    #[serde(serialize_with = "option_finite_or_null")]
    pub avg_loss_pct: Option<f64>,
    #[serde(serialize_with = "option_finite_or_null")]
    pub largest_win_pct: Option<f64>,
    #[serde(serialize_with = "option_finite_or_null")]
    pub largest_loss_pct: Option<f64>,
    #[serde(serialize_with = "option_finite_or_null")]
    pub avg_hold_days: Option<f64>,
    #[serde(serialize_with = "finite_or_null")]
    pub exposure: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub final_equity: f64,
}

/// Same as [`Metrics::compute`].
pub fn summarize(equity_curve: &[EquityPoint], trades: &[Trade], initial_capital: f64) -> Metrics {
    Metrics::compute(equity_curve, trades, initial_capital)
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade], initial_capital: f64) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if equity_curve.is_empty() || initial_capital <= 0.0 {
            0.0
        } else {
            final_equity / initial_capital - 1.0
        };

        let cagr = compute_cagr(equity_curve, final_equity, initial_capital);
        let returns = daily_returns(equity_curve);
        let (annualized_volatility, sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&returns, cagr);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let calmar_ratio = if max_drawdown < 0.0 {
            cagr / max_drawdown.abs()
        } else {
            0.0
        };

        let exposure = if equity_curve.is_empty() {
            0.0
        } else {
            let held = equity_curve.iter().filter(|p| p.position == 1).count();
            held as f64 / equity_curve.len() as f64
        };

        let stats = TradeStats::from_trades(trades);

        Metrics {
            total_return,
            cagr,
            annualized_volatility,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            max_drawdown,
            max_drawdown_duration,
            num_trades: trades.len(),
            trades_won: stats.won,
            trades_lost: stats.lost,
            win_rate: stats.win_rate(trades.len()),
            profit_factor: stats.profit_factor(),
            avg_win_pct: mean_of(stats.total_win_pct, stats.won),
            avg_loss_pct: mean_of(stats.total_loss_pct, stats.lost),
            largest_win_pct: stats.largest_win_pct,
            largest_loss_pct: stats.largest_loss_pct,
            avg_hold_days: mean_of(stats.total_hold_days, trades.len()),
            exposure,
            final_equity,
        }
    }
}

#[derive(Default)]
struct TradeStats {
    won: usize,
    lost: usize,
    total_win_pct: f64,
    total_loss_pct: f64,
    largest_win_pct: Option<f64>,
    largest_loss_pct: Option<f64>,
    total_hold_days: f64,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = TradeStats::default();

        for trade in trades {
            let pct = trade.pnl_pct;
            if pct > 0.0 {
                stats.won += 1;
                stats.total_win_pct += pct;
                stats.largest_win_pct = Some(stats.largest_win_pct.map_or(pct, |w| w.max(pct)));
            } else if pct < 0.0 {
                stats.lost += 1;
                stats.total_loss_pct += pct;
                stats.largest_loss_pct = Some(stats.largest_loss_pct.map_or(pct, |l| l.min(pct)));
            }
            stats.total_hold_days += trade.hold_days() as f64;
        }

        stats
    }

    fn win_rate(&self, num_trades: usize) -> f64 {
        if num_trades == 0 {
            0.0
        } else {
            self.won as f64 / num_trades as f64
        }
    }

    /// Gross winning percentage over gross losing percentage.
    fn profit_factor(&self) -> Option<f64> {
        if self.lost == 0 {
            None
        } else {
            Some(self.total_win_pct / self.total_loss_pct.abs())
        }
    }
}

fn mean_of(total: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| total / count as f64)
}

fn compute_cagr(equity_curve: &[EquityPoint], final_equity: f64, initial_capital: f64) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    let days = (last.date - first.date).num_days();
    if days <= 0 || final_equity <= 0.0 || initial_capital <= 0.0 {
        return 0.0;
    }
    (final_equity / initial_capital).powf(DAYS_PER_YEAR / days as f64) - 1.0
}

/// Bar-over-bar returns; bars following a non-positive equity are skipped.
fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| w[1].equity / w[0].equity - 1.0)
        .collect()
}

/// Returns (annualized volatility, sharpe, sortino).
fn compute_risk_adjusted(returns: &[f64], cagr: f64) -> (f64, f64, Option<f64>) {
    if returns.len() < 2 {
        return (0.0, 0.0, Some(0.0));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let volatility = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if volatility > 0.0 { cagr / volatility } else { 0.0 };

    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let sortino = if downside.is_empty() {
        if cagr > 0.0 { None } else { Some(0.0) }
    } else {
        let ds_variance = downside.iter().map(|r| r * r).sum::<f64>() / downside.len() as f64;
        let ds_volatility = ds_variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();
        Some(cagr / ds_volatility)
    };

    (volatility, sharpe, sortino)
}

/// Returns (max drawdown as a non-positive fraction, longest run of bars
/// spent at or below the running peak).
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut run = 0usize;
    let mut longest = 0usize;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
            run = 0;
        } else {
            run += 1;
            longest = longest.max(run);
        }
        if peak > 0.0 {
            max_dd = max_dd.min(point.equity / peak - 1.0);
        }
    }

    (max_dd, longest)
}

fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

fn option_finite_or_null<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() => serializer.serialize_f64(*v),
        _ => serializer.serialize_none(),
    }
}
