//! Trade execution and fill simulation.
//!
//! Implements entry/exit logic with fixed-percentage costs, cash-fraction
//! sizing, and stop-loss/take-profit/trailing-stop trigger checking.

use chrono::NaiveDate;

use super::portfolio::PortfolioState;
use super::position::{ExitReason, OpenPosition, Trade};

/// Cost and sizing parameters applied to every fill.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub fee_rate: f64,
    pub slippage_rate: f64,
    pub position_size_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            fee_rate: 0.0,
            slippage_rate: 0.0,
            position_size_pct: 1.0,
        }
    }
}

/// Risk-exit thresholds in percent; 0 disables a check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionParams {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
}

/// Cost of a fill: price * quantity * (fee_rate + slippage_rate).
pub fn calculate_trade_cost(price: f64, quantity: f64, config: &ExecutionConfig) -> f64 {
    price * quantity * (config.fee_rate + config.slippage_rate)
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: f64,
        committed: f64,
        cost: f64,
    },
    InsufficientCapital,
}

/// Enter a long position at `price`.
///
/// 1. Commit `cash * position_size_pct`
/// 2. Charge costs on the committed notional
/// 3. Convert the remainder to quantity at `price`
/// 4. Deduct the committed cash and record the entry context
pub fn enter_long(
    portfolio: &mut PortfolioState,
    price: f64,
    index: usize,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    let committed = portfolio.cash * config.position_size_pct;
    let cost = committed * (config.fee_rate + config.slippage_rate);
    let quantity = (committed - cost) / price;

    if committed <= 0.0 || quantity <= 0.0 {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= committed;
    portfolio.position = Some(OpenPosition::new(quantity, price, index, date, committed));

    EntryResult::Entered {
        quantity,
        committed,
        cost,
    }
}

/// Close the open position at `price`, returning the closed trade.
///
/// Cash receives the sale proceeds net of costs; any cash left uncommitted
/// at entry is untouched.
pub fn exit_position(
    portfolio: &mut PortfolioState,
    price: f64,
    index: usize,
    date: NaiveDate,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.position.take()?;

    let cost = calculate_trade_cost(price, position.quantity, config);
    let proceeds = position.market_value(price) - cost;
    portfolio.cash += proceeds;

    Some(Trade {
        entry_date: position.entry_date,
        exit_date: date,
        entry_price: position.entry_price,
        exit_price: price,
        quantity: position.quantity,
        pnl: proceeds - position.cost_basis,
        pnl_pct: (price - position.entry_price) / position.entry_price,
        hold_bars: index - position.entry_index,
        exit_reason: reason,
    })
}

/// Evaluate the forced exits in priority order: stop-loss, take-profit, then
/// trailing stop. The trailing high-water mark is only raised when neither
/// fixed level fires.
pub fn check_triggers(
    position: &mut OpenPosition,
    price: f64,
    params: &ExecutionParams,
) -> Option<ExitReason> {
    if position.should_stop_loss(price, params.stop_loss_pct) {
        return Some(ExitReason::StopLoss);
    }
    if position.should_take_profit(price, params.take_profit_pct) {
        return Some(ExitReason::TakeProfit);
    }
    position.update_highest(price);
    if position.should_trailing_stop(price, params.trailing_stop_pct) {
        return Some(ExitReason::TrailingStop);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_config() -> ExecutionConfig {
        ExecutionConfig {
            fee_rate: 0.001,
            slippage_rate: 0.0005,
            position_size_pct: 1.0,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn trade_cost_basic() {
        let cost = calculate_trade_cost(100.0, 10.0, &make_config());
        assert_relative_eq!(cost, 1.5, max_relative = 1e-12);
    }

    #[test]
    fn trade_cost_zero_rates() {
        let cost = calculate_trade_cost(100.0, 10.0, &ExecutionConfig::default());
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn enter_long_full_allocation() {
        let mut portfolio = PortfolioState::new(10_000.0);
        let result = enter_long(&mut portfolio, 100.0, 5, date(), &make_config());

        match result {
            EntryResult::Entered {
                quantity,
                committed,
                cost,
            } => {
                assert_relative_eq!(committed, 10_000.0, max_relative = 1e-12);
                assert_relative_eq!(cost, 15.0, max_relative = 1e-12);
                assert_relative_eq!(quantity, 99.85, max_relative = 1e-12);
                assert_relative_eq!(quantity * 100.0 + cost, 10_000.0, max_relative = 1e-12);
            }
            EntryResult::InsufficientCapital => panic!("Expected entry to succeed"),
        }

        assert_relative_eq!(portfolio.cash, 0.0);
        let pos = portfolio.position.as_ref().unwrap();
        assert_eq!(pos.entry_index, 5);
        assert_relative_eq!(pos.entry_price, 100.0);
        assert_relative_eq!(pos.highest_close, 100.0);
    }

    #[test]
    fn enter_long_partial_allocation_keeps_remaining_cash() {
        let mut portfolio = PortfolioState::new(10_000.0);
        let config = ExecutionConfig {
            position_size_pct: 0.5,
            ..ExecutionConfig::default()
        };
        enter_long(&mut portfolio, 50.0, 1, date(), &config);

        assert_relative_eq!(portfolio.cash, 5_000.0);
        assert_relative_eq!(portfolio.holdings(), 100.0);
        assert_relative_eq!(portfolio.equity(50.0), 10_000.0);
    }

    #[test]
    fn enter_long_without_cash() {
        let mut portfolio = PortfolioState::new(0.0);
        let result = enter_long(&mut portfolio, 100.0, 1, date(), &make_config());
        assert_eq!(result, EntryResult::InsufficientCapital);
        assert!(!portfolio.is_long());
    }

    #[test]
    fn exit_position_realizes_pnl_net_of_costs() {
        let config = make_config();
        let mut portfolio = PortfolioState::new(10_000.0);
        enter_long(&mut portfolio, 100.0, 1, date(), &config);

        let exit_date = date() + chrono::Duration::days(4);
        let trade = exit_position(&mut portfolio, 110.0, 5, exit_date, ExitReason::Signal, &config)
            .expect("position should close");

        let quantity = 99.85;
        let exit_cost = 110.0 * quantity * 0.0015;
        assert_relative_eq!(portfolio.cash, quantity * 110.0 - exit_cost, max_relative = 1e-12);
        assert_relative_eq!(trade.pnl, portfolio.cash - 10_000.0, max_relative = 1e-12);
        assert_relative_eq!(trade.pnl_pct, 0.1, max_relative = 1e-12);
        assert_eq!(trade.hold_bars, 4);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert!(!portfolio.is_long());
    }

    #[test]
    fn exit_position_when_flat_is_none() {
        let mut portfolio = PortfolioState::new(10_000.0);
        let trade = exit_position(
            &mut portfolio,
            100.0,
            1,
            date(),
            ExitReason::Signal,
            &make_config(),
        );
        assert!(trade.is_none());
        assert_relative_eq!(portfolio.cash, 10_000.0);
    }

    #[test]
    fn triggers_prefer_stop_loss() {
        let mut pos = OpenPosition::new(1.0, 100.0, 0, date(), 100.0);
        let params = ExecutionParams {
            stop_loss_pct: 5.0,
            take_profit_pct: 10.0,
            trailing_stop_pct: 2.0,
        };
        // 94 breaches both the fixed stop and the trailing stop.
        assert_eq!(check_triggers(&mut pos, 94.0, &params), Some(ExitReason::StopLoss));
    }

    #[test]
    fn triggers_take_profit_before_trailing() {
        let mut pos = OpenPosition::new(1.0, 100.0, 0, date(), 100.0);
        let params = ExecutionParams {
            stop_loss_pct: 0.0,
            take_profit_pct: 10.0,
            trailing_stop_pct: 2.0,
        };
        assert_eq!(check_triggers(&mut pos, 111.0, &params), Some(ExitReason::TakeProfit));
        // High-water mark untouched by a bar that exited on take-profit.
        assert_relative_eq!(pos.highest_close, 100.0);
    }

    #[test]
    fn triggers_trailing_stop_after_new_high() {
        let mut pos = OpenPosition::new(1.0, 100.0, 0, date(), 100.0);
        let params = ExecutionParams {
            trailing_stop_pct: 5.0,
            ..ExecutionParams::default()
        };
        assert_eq!(check_triggers(&mut pos, 120.0, &params), None);
        assert_eq!(check_triggers(&mut pos, 115.0, &params), None);
        assert_eq!(check_triggers(&mut pos, 113.0, &params), Some(ExitReason::TrailingStop));
    }

    #[test]
    fn triggers_disabled_never_fire() {
        let mut pos = OpenPosition::new(1.0, 100.0, 0, date(), 100.0);
        let params = ExecutionParams::default();
        assert_eq!(check_triggers(&mut pos, 1.0, &params), None);
        assert_eq!(check_triggers(&mut pos, 1_000.0, &params), None);
    }
}
