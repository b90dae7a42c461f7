//! Portfolio state and equity points.

use chrono::NaiveDate;
use serde::Serialize;

use super::position::OpenPosition;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub ma_short: f64,
    pub ma_long: f64,
    pub equity: f64,
    pub position: u8,
}

/// Cash plus at most one open long position. Owned by a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub position: Option<OpenPosition>,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            position: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    pub fn holdings(&self) -> f64 {
        self.position.as_ref().map_or(0.0, |p| p.quantity)
    }

    /// cash + holdings * price
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.holdings() * price
    }
}
