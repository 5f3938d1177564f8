//! Position — an open holding managed by the engine's per-bar risk checks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

/// An open position. Created directly OPEN (entries fill at the next bar's
/// open, so there is no pending state) and destroyed on close by conversion
/// into a [`Trade`](super::trade::Trade).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    /// Fill price with slippage applied.
    pub entry_price: f64,
    pub quantity: f64,
    pub entry_commission: f64,
    pub stop_price: f64,
    pub target_price: f64,
    /// Calendar deadline after which the max-holding exit triggers.
    pub deadline: NaiveDate,
    /// Composite score that opened the position.
    pub entry_score: f64,
}

impl Position {
    /// Unrealized gross P&L at `price`.
    pub fn gross_pnl(&self, price: f64) -> f64 {
        match self.side {
            PositionSide::Long => (price - self.entry_price) * self.quantity,
            PositionSide::Short => (self.entry_price - price) * self.quantity,
        }
    }

    /// Equity contribution at `price`: the reserved entry notional plus
    /// unrealized P&L. For longs this is simply `price * quantity`.
    pub fn market_value(&self, price: f64) -> f64 {
        self.entry_price * self.quantity + self.gross_pnl(price)
    }

    /// Whether the bar's range breached the stop price.
    pub fn stop_hit(&self, low: f64, high: f64) -> bool {
        match self.side {
            PositionSide::Long => low <= self.stop_price,
            PositionSide::Short => high >= self.stop_price,
        }
    }

    /// Whether the bar's range breached the take-profit target.
    pub fn target_hit(&self, low: f64, high: f64) -> bool {
        match self.side {
            PositionSide::Long => high >= self.target_price,
            PositionSide::Short => low <= self.target_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> Position {
        Position {
            symbol: "ACME".into(),
            side: PositionSide::Long,
            entry_bar: 5,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            entry_price: 100.0,
            quantity: 50.0,
            entry_commission: 5.0,
            stop_price: 95.0,
            target_price: 115.0,
            deadline: NaiveDate::from_ymd_opt(2024, 2, 7).unwrap(),
            entry_score: 65.0,
        }
    }

    fn short_position() -> Position {
        Position {
            side: PositionSide::Short,
            stop_price: 105.0,
            target_price: 85.0,
            ..long_position()
        }
    }

    #[test]
    fn long_pnl_and_value() {
        let pos = long_position();
        assert_eq!(pos.gross_pnl(110.0), 500.0);
        assert_eq!(pos.market_value(110.0), 5500.0);
    }

    #[test]
    fn short_pnl_and_value() {
        let pos = short_position();
        assert_eq!(pos.gross_pnl(90.0), 500.0);
        // Reserved notional 5000 plus 500 unrealized.
        assert_eq!(pos.market_value(90.0), 5500.0);
    }

    #[test]
    fn long_stop_and_target_breach() {
        let pos = long_position();
        assert!(pos.stop_hit(94.0, 101.0));
        assert!(!pos.stop_hit(96.0, 101.0));
        assert!(pos.target_hit(96.0, 116.0));
        assert!(!pos.target_hit(96.0, 114.0));
    }

    #[test]
    fn short_stop_and_target_breach() {
        let pos = short_position();
        assert!(pos.stop_hit(100.0, 106.0));
        assert!(!pos.stop_hit(100.0, 104.0));
        assert!(pos.target_hit(84.0, 100.0));
        assert!(!pos.target_hit(86.0, 100.0));
    }
}
