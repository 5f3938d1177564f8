//! Run result: everything a backtest hands back to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CompositeSignal, EquityPoint, Trade};

/// Complete output of one backtest run. All serialization is the caller's
/// business; the engine only fills the struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Closed trades in close order.
    pub trades: Vec<Trade>,
    /// One point per bar on the common date axis.
    pub equity_curve: Vec<EquityPoint>,
    /// Every composite signal that classified as something other than none.
    pub signals: Vec<CompositeSignal>,
    pub initial_capital: f64,
    pub bar_count: usize,
    pub warmup_bars: usize,
    /// Date the max-drawdown halt engaged, if it did.
    pub halted_on: Option<NaiveDate>,
    /// Entries skipped because cash could not cover the fill.
    pub skipped_entries: usize,
}

impl BacktestReport {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}
