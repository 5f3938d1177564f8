//! Strategy signal generators.
//!
//! Strategies are portfolio-agnostic: they see bar history and precomputed
//! indicator values, never positions or cash. "Not enough data yet" is an
//! ordinary outcome expressed as `None`, not an error. Invalid parameters
//! are configuration errors raised at construction, strictly before any
//! simulation starts.

pub mod ema_crossover;
pub mod supertrend;
pub mod swing;

use crate::domain::{Bar, StrategySignal};
use crate::indicators::{Indicator, IndicatorSet};

pub use ema_crossover::EmaCrossover;
pub use supertrend::SupertrendStrategy;
pub use swing::SwingStrategy;

/// Common contract for all strategy signal generators.
///
/// # Architecture invariant
/// `evaluate` receives only market data. If an implementation needs
/// portfolio state, it is not a strategy — that logic belongs in the engine.
pub trait Strategy: Send + Sync {
    /// Stable strategy name; also the key for scorer weights.
    fn name(&self) -> &'static str;

    /// Bars required before the strategy can produce output.
    fn warmup_bars(&self) -> usize;

    /// Indicator instances this strategy reads. The engine precomputes them
    /// once per symbol before the bar loop.
    fn required_indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// Evaluate at `bar_index`, using only `bars[0..=bar_index]` and the
    /// indicator values at or before that index. Returns `None` whenever no
    /// signal fires (including during warm-up).
    fn evaluate(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorSet,
    ) -> Option<StrategySignal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStrategy;

    impl Strategy for NullStrategy {
        fn name(&self) -> &'static str {
            "null"
        }

        fn warmup_bars(&self) -> usize {
            0
        }

        fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
            Vec::new()
        }

        fn evaluate(
            &self,
            _bars: &[Bar],
            _bar_index: usize,
            _indicators: &IndicatorSet,
        ) -> Option<StrategySignal> {
            None
        }
    }

    #[test]
    fn trait_objects_compose() {
        let strategies: Vec<Box<dyn Strategy>> = vec![Box::new(NullStrategy)];
        let set = IndicatorSet::new();
        assert!(strategies[0].evaluate(&[], 0, &set).is_none());
        assert_eq!(strategies[0].name(), "null");
    }
}
