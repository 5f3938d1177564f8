//! Engine configuration, validated before any simulation starts.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// All knobs of a single backtest run. Immutable once the run starts.
///
/// Percentages are expressed as percents (5.0 = 5%), not fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Equity fraction allocated per position.
    pub position_size_percent: f64,
    /// Per-side commission on traded notional.
    pub commission_percent: f64,
    /// Adverse fill adjustment applied to every entry and exit.
    pub slippage_percent: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    /// Calendar days a position may stay open.
    pub max_holding_days: i64,
    /// Drawdown (percent of peak equity) that halts new entries.
    pub max_portfolio_drawdown: f64,
    pub max_positions: usize,
    /// Entry filters on the composite signal.
    pub min_signal_confidence: f64,
    pub min_composite_score: f64,
    /// Opposite-sign composite magnitude that forces an exit.
    pub reversal_confirmation: f64,
    pub allow_short_selling: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            position_size_percent: 5.0,
            commission_percent: 0.1,
            slippage_percent: 0.05,
            stop_loss_percent: 5.0,
            take_profit_percent: 15.0,
            max_holding_days: 30,
            max_portfolio_drawdown: 20.0,
            max_positions: 10,
            min_signal_confidence: 0.3,
            min_composite_score: 30.0,
            reversal_confirmation: 50.0,
            allow_short_selling: false,
        }
    }
}

impl BacktestConfig {
    /// Validate every field. Called once before the bar loop; a failure here
    /// is the only fatal error class in the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, &'static str, f64, bool); 10] = [
            (
                "initial_capital",
                "(0, inf)",
                self.initial_capital,
                self.initial_capital > 0.0,
            ),
            (
                "position_size_percent",
                "(0, 100]",
                self.position_size_percent,
                self.position_size_percent > 0.0 && self.position_size_percent <= 100.0,
            ),
            (
                "commission_percent",
                "[0, 100)",
                self.commission_percent,
                (0.0..100.0).contains(&self.commission_percent),
            ),
            (
                "slippage_percent",
                "[0, 100)",
                self.slippage_percent,
                (0.0..100.0).contains(&self.slippage_percent),
            ),
            (
                "stop_loss_percent",
                "(0, 100]",
                self.stop_loss_percent,
                self.stop_loss_percent > 0.0 && self.stop_loss_percent <= 100.0,
            ),
            (
                "take_profit_percent",
                "(0, inf)",
                self.take_profit_percent,
                self.take_profit_percent > 0.0,
            ),
            (
                "max_portfolio_drawdown",
                "(0, 100]",
                self.max_portfolio_drawdown,
                self.max_portfolio_drawdown > 0.0 && self.max_portfolio_drawdown <= 100.0,
            ),
            (
                "min_signal_confidence",
                "[0, 1]",
                self.min_signal_confidence,
                (0.0..=1.0).contains(&self.min_signal_confidence),
            ),
            (
                "min_composite_score",
                "[0, 100]",
                self.min_composite_score,
                (0.0..=100.0).contains(&self.min_composite_score),
            ),
            (
                "reversal_confirmation",
                "[0, 100]",
                self.reversal_confirmation,
                (0.0..=100.0).contains(&self.reversal_confirmation),
            ),
        ];
        for (name, range, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(ConfigError::OutOfRange { name, range, value });
            }
        }
        if self.max_holding_days < 1 {
            return Err(ConfigError::OutOfRange {
                name: "max_holding_days",
                range: "[1, inf)",
                value: self.max_holding_days as f64,
            });
        }
        if self.max_positions < 1 {
            return Err(ConfigError::OutOfRange {
                name: "max_positions",
                range: "[1, inf)",
                value: self.max_positions as f64,
            });
        }
        Ok(())
    }
}
