//! Error types shared across the core.
//!
//! Configuration problems are fatal and surface before any simulation
//! starts. Everything that can go wrong mid-run is either isolated (a
//! symbol with too little history simply never signals) or reported as a
//! typed engine error that one optimizer combination absorbs without
//! touching its siblings.

use thiserror::Error;

/// Invalid configuration — raised at construction/load time, never mid-run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("short EMA period ({short}) must be less than long period ({long})")]
    EmaPeriodOrder { short: usize, long: usize },

    #[error("{name} period must be >= 1")]
    ZeroPeriod { name: &'static str },

    #[error("{name} must be within {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error(
        "composite thresholds must satisfy strong_buy >= buy >= sell >= strong_sell \
         (got {strong_buy}, {buy}, {sell}, {strong_sell})"
    )]
    ThresholdOrder {
        strong_buy: f64,
        buy: f64,
        sell: f64,
        strong_sell: f64,
    },

    #[error("strategy weight for '{strategy}' must be non-negative, got {weight}")]
    NegativeWeight { strategy: String, weight: f64 },

    #[error("bars for '{symbol}' are not strictly increasing by date at index {index}")]
    UnorderedBars { symbol: String, index: usize },

    #[error("no price history supplied")]
    EmptyUniverse,
}

/// Failures of a single backtest run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("insufficient history: need at least {needed} common bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("run exceeded its deadline after {bars_processed} bars")]
    DeadlineExceeded { bars_processed: usize },
}
