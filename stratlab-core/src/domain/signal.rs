//! Strategy and composite signal types.
//!
//! Signals are immutable once emitted — they describe a market event, not a
//! downstream decision. Each strategy kind carries only its own explanatory
//! fields via the `SignalDetail` variant.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Directional intent of a single-strategy signal.
///
/// "Approaching" directions mark setups that have not confirmed yet (e.g.,
/// EMAs converging toward a crossover). The absence of any signal is
/// expressed as `Option::None` at the evaluation site, not a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Bullish,
    Bearish,
    ApproachingBullish,
    ApproachingBearish,
}

impl SignalDirection {
    /// +1 for bullish-leaning directions, -1 for bearish-leaning.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Bullish | Self::ApproachingBullish => 1.0,
            Self::Bearish | Self::ApproachingBearish => -1.0,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Bullish | Self::Bearish)
    }
}

/// Strategy-kind-specific explanatory fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalDetail {
    EmaCrossover {
        short_ema: f64,
        long_ema: f64,
        /// |short - long| / long, in percent.
        convergence_pct: f64,
    },
    Supertrend {
        value: f64,
        atr: f64,
        /// True exactly on the bar the trend direction flipped.
        trend_change: bool,
    },
    Swing {
        rsi: f64,
        upper_band: f64,
        lower_band: f64,
        ema: f64,
    },
}

impl SignalDetail {
    /// The emitting strategy's name (stable identifier used for weights).
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::EmaCrossover { .. } => "ema_crossover",
            Self::Supertrend { .. } => "supertrend",
            Self::Swing { .. } => "swing",
        }
    }
}

/// One strategy's normalized directional signal at one evaluation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySignal {
    pub symbol: String,
    pub date: NaiveDate,
    pub direction: SignalDirection,
    /// Normalized strength in [-100, 100]; sign matches direction.
    pub strength: f64,
    pub detail: SignalDetail,
}

impl StrategySignal {
    pub fn strategy_name(&self) -> &'static str {
        self.detail.strategy_name()
    }
}

/// Composite classification after threshold evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    StrongBuy,
    Buy,
    Sell,
    StrongSell,
    None,
}

impl Classification {
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// One strategy's contribution to a composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub strategy: String,
    /// Strength after the scorer's [-100, 100] clamp.
    pub strength: f64,
    pub weight: f64,
}

/// Weighted combination of all enabled strategies' signals for one
/// symbol/date. Stateless: recomputed from scratch at every evaluation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub symbol: String,
    pub date: NaiveDate,
    /// Weighted mean of contributing strengths, in [-100, 100].
    pub composite_score: f64,
    pub classification: Classification,
    /// Participation x sign-agreement, in [0, 1].
    pub confidence: f64,
    /// Ordered by strategy evaluation order.
    pub contributions: Vec<Contribution>,
}
