//! Open position tracking, exit triggers and the closed-trade record.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    /// Cash committed on entry, entry cost included.
    pub cost_basis: f64,
    pub highest_close: f64,
}

impl OpenPosition {
    pub fn new(
        quantity: f64,
        entry_price: f64,
        entry_index: usize,
        entry_date: NaiveDate,
        cost_basis: f64,
    ) -> Self {
        OpenPosition {
            quantity,
            entry_price,
            entry_index,
            entry_date,
            cost_basis,
            highest_close: entry_price,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss_pct: f64) -> bool {
        if stop_loss_pct == 0.0 {
            return false;
        }
        price <= self.entry_price * (1.0 - stop_loss_pct / 100.0)
    }

    pub fn should_take_profit(&self, price: f64, take_profit_pct: f64) -> bool {
        if take_profit_pct == 0.0 {
            return false;
        }
        price >= self.entry_price * (1.0 + take_profit_pct / 100.0)
    }

    /// Raises the high-water mark to `price` if it is a new high.
    pub fn update_highest(&mut self, price: f64) {
        if price > self.highest_close {
            self.highest_close = price;
        }
    }

    pub fn should_trailing_stop(&self, price: f64, trailing_stop_pct: f64) -> bool {
        if trailing_stop_pct == 0.0 {
            return false;
        }
        price <= self.highest_close * (1.0 - trailing_stop_pct / 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    TrailingStop,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Signal => "signal",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Realized cash PnL net of entry and exit costs.
    pub pnl: f64,
    /// Price move over the trade: (exit - entry) / entry.
    pub pnl_pct: f64,
    pub hold_bars: usize,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Calendar days held, floored at one.
    pub fn hold_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> OpenPosition {
        OpenPosition::new(
            10.0,
            50.0,
            3,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            500.0,
        )
    }

    #[test]
    fn new_position_starts_high_water_at_entry() {
        let pos = sample_position();
        assert!((pos.highest_close - 50.0).abs() < f64::EPSILON);
        assert_eq!(pos.entry_index, 3);
    }

    #[test]
    fn market_value() {
        let pos = sample_position();
        assert!((pos.market_value(55.0) - 550.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_loss_triggered() {
        let pos = sample_position();
        // 5% below 50 = 47.5
        assert!(pos.should_stop_loss(47.0, 5.0));
        assert!(pos.should_stop_loss(47.4, 5.0));
        assert!(!pos.should_stop_loss(48.0, 5.0));
    }

    #[test]
    fn stop_loss_disabled() {
        let pos = sample_position();
        assert!(!pos.should_stop_loss(0.01, 0.0));
    }

    #[test]
    fn take_profit_triggered() {
        let pos = sample_position();
        // 10% above 50 = 55
        assert!(pos.should_take_profit(56.0, 10.0));
        assert!(pos.should_take_profit(55.1, 10.0));
        assert!(!pos.should_take_profit(54.0, 10.0));
    }

    #[test]
    fn take_profit_disabled() {
        let pos = sample_position();
        assert!(!pos.should_take_profit(1_000_000.0, 0.0));
    }

    #[test]
    fn trailing_stop_follows_high_water_mark() {
        let mut pos = sample_position();
        pos.update_highest(60.0);
        pos.update_highest(58.0);
        assert!((pos.highest_close - 60.0).abs() < f64::EPSILON);
        // 10% below 60 = 54
        assert!(pos.should_trailing_stop(53.9, 10.0));
        assert!(!pos.should_trailing_stop(55.0, 10.0));
    }

    #[test]
    fn trailing_stop_disabled() {
        let pos = sample_position();
        assert!(!pos.should_trailing_stop(0.01, 0.0));
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::TrailingStop).unwrap();
        assert_eq!(json, "\"trailing_stop\"");
        assert_eq!(ExitReason::EndOfData.to_string(), "end_of_data");
    }

    #[test]
    fn hold_days_has_floor_of_one() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let trade = Trade {
            entry_date: day,
            exit_date: day,
            entry_price: 100.0,
            exit_price: 101.0,
            quantity: 1.0,
            pnl: 1.0,
            pnl_pct: 0.01,
            hold_bars: 0,
            exit_reason: ExitReason::EndOfData,
        };
        assert_eq!(trade.hold_days(), 1);

        let longer = Trade {
            exit_date: day + chrono::Duration::days(7),
            ..trade
        };
        assert_eq!(longer.hold_days(), 7);
    }
}
