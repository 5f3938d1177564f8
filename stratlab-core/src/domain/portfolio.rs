//! PortfolioState — cash, open positions, equity history for one engine run.
//!
//! Exclusively owned by a single backtest run; parallel optimizer
//! combinations each construct their own. Positions live in a BTreeMap so
//! every iteration order (exit checks, equity sums) is deterministic.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::Position;

/// One point on the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Mutable portfolio state, evolving bar by bar.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub equity_curve: Vec<EquityPoint>,
    pub peak_equity: f64,
    pub drawdown: f64,
    /// Set when the max-drawdown breach halts new entries.
    pub halted: bool,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            equity_curve: Vec::new(),
            peak_equity: initial_capital,
            drawdown: 0.0,
            halted: false,
        }
    }

    /// Total equity: cash plus every open position marked at the supplied
    /// price lookup.
    pub fn equity(&self, price_of: impl Fn(&str) -> Option<f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = price_of(&pos.symbol).unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Update peak equity and current drawdown from a fresh equity mark.
    /// Returns the drawdown as a fraction of the peak.
    pub fn update_drawdown(&mut self, equity: f64) -> f64 {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.drawdown = if self.peak_equity > 0.0 {
            (self.peak_equity - equity) / self.peak_equity
        } else {
            0.0
        };
        self.drawdown
    }
}
