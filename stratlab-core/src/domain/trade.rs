//! Trade — immutable record of a closed position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::PositionSide;

/// Why a position was closed. Exactly one reason per trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    MaxHolding,
    SignalReversal,
    EndOfRun,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StopLoss => "stop-loss",
            Self::TakeProfit => "take-profit",
            Self::MaxHolding => "max-holding",
            Self::SignalReversal => "signal-reversal",
            Self::EndOfRun => "end-of-run",
        };
        f.write_str(s)
    }
}

/// A completed round-trip trade. Appended to the trade log on close and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: PositionSide,

    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    pub quantity: f64,

    /// Net of both entry and exit commissions.
    pub pnl: f64,
    /// Net P&L as a percentage of the entry notional.
    pub pnl_percent: f64,
    pub commission: f64,
    pub holding_days: i64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> Trade {
        Trade {
            symbol: "ACME".into(),
            side: PositionSide::Long,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            entry_price: 100.0,
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            exit_price: 110.0,
            quantity: 50.0,
            pnl: 485.0,
            pnl_percent: 9.7,
            commission: 15.0,
            holding_days: 6,
            exit_reason: ExitReason::TakeProfit,
        }
    }

    #[test]
    fn winner_detection() {
        assert!(sample_trade().is_winner());
        let loser = Trade {
            pnl: -20.0,
            ..sample_trade()
        };
        assert!(!loser.is_winner());
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::StopLoss.to_string(), "stop-loss");
        assert_eq!(ExitReason::EndOfRun.to_string(), "end-of-run");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
