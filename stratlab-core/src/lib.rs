//! StratLab Core — multi-strategy signal generation and backtesting engine.
//!
//! This crate contains the heart of the system:
//! - Domain types (bars, strategy signals, composite signals, positions, trades)
//! - Indicator calculators (EMA, SMA, ATR, RSI, Bollinger, SuperTrend)
//! - Strategy signal generators behind a common trait
//! - Multi-strategy weighted scorer with threshold classification
//! - Deterministic bar-by-bar backtest engine with position lifecycle and
//!   risk exits
//!
//! No I/O happens here: price history arrives pre-loaded, results are
//! returned to the caller.

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod scorer;
pub mod strategies;

pub use error::{ConfigError, EngineError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross the optimizer's thread boundary
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::MarketData>();
        require_sync::<domain::MarketData>();
        require_send::<domain::StrategySignal>();
        require_sync::<domain::StrategySignal>();
        require_send::<domain::CompositeSignal>();
        require_sync::<domain::CompositeSignal>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<engine::BacktestConfig>();
        require_sync::<engine::BacktestConfig>();
        require_send::<engine::BacktestReport>();
        require_sync::<engine::BacktestReport>();
        require_send::<scorer::MultiStrategyScorer>();
        require_sync::<scorer::MultiStrategyScorer>();
    }

    /// Architecture contract: the Strategy trait does NOT accept portfolio
    /// state. Signals describe market events; position decisions belong to
    /// the engine. If this stops compiling, the trait signature changed.
    #[test]
    fn strategy_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            strategy: &dyn strategies::Strategy,
            bars: &[domain::Bar],
            indicators: &indicators::IndicatorSet,
        ) -> Option<domain::StrategySignal> {
            strategy.evaluate(bars, 0, indicators)
        }
    }
}
