//! EMA crossover strategy — golden/death cross plus "approaching" setups.
//!
//! Fires bullish when the short EMA crosses above the long EMA, bearish for
//! the reverse. When no cross occurred but the EMAs sit within the approach
//! threshold of each other, emits an approaching signal in the direction the
//! gap is moving.

use crate::domain::{Bar, SignalDetail, SignalDirection, StrategySignal};
use crate::error::ConfigError;
use crate::indicators::{Ema, Indicator, IndicatorSet};

use super::Strategy;

/// Convergence (as a fraction of the long EMA) is normalized against this
/// span when deriving signal strength.
const CONVERGENCE_NORM_PCT: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct EmaCrossover {
    short_period: usize,
    long_period: usize,
    approach_threshold: f64,
    short_key: String,
    long_key: String,
}

impl EmaCrossover {
    pub fn new(
        short_period: usize,
        long_period: usize,
        approach_threshold: f64,
    ) -> Result<Self, ConfigError> {
        if short_period < 1 {
            return Err(ConfigError::ZeroPeriod { name: "short EMA" });
        }
        if short_period >= long_period {
            return Err(ConfigError::EmaPeriodOrder {
                short: short_period,
                long: long_period,
            });
        }
        if approach_threshold <= 0.0 || approach_threshold > 0.1 {
            return Err(ConfigError::OutOfRange {
                name: "approach_threshold",
                range: "(0, 0.1]",
                value: approach_threshold,
            });
        }
        Ok(Self {
            short_period,
            long_period,
            approach_threshold,
            short_key: Ema::key(short_period),
            long_key: Ema::key(long_period),
        })
    }

    /// The classic 50/200 configuration with a 2% approach threshold.
    pub fn default_params() -> Self {
        Self::new(50, 200, 0.02).expect("default EMA crossover parameters are valid")
    }

    /// Strength in [0, 1] from convergence magnitude and where price sits
    /// relative to the long EMA.
    fn raw_strength(&self, short: f64, long: f64, close: f64, bullish: bool) -> f64 {
        let convergence_pct = ((short - long) / long * 100.0).abs();
        let convergence_factor = (convergence_pct / CONVERGENCE_NORM_PCT).min(1.0);
        let price_confirms = if bullish { close > long } else { close < long };
        let price_factor = if price_confirms { 1.0 } else { 0.5 };
        (price_factor + convergence_factor) / 2.0
    }
}

impl Strategy for EmaCrossover {
    fn name(&self) -> &'static str {
        "ema_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.long_period
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Ema::new(self.short_period)),
            Box::new(Ema::new(self.long_period)),
        ]
    }

    fn evaluate(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorSet,
    ) -> Option<StrategySignal> {
        // Crossover detection needs the previous bar too.
        if bar_index == 0 || bar_index < self.warmup_bars() {
            return None;
        }
        let bar = bars.get(bar_index)?;
        if bar.close.is_nan() {
            return None;
        }

        let short_cur = indicators.get_valid(&self.short_key, bar_index)?;
        let long_cur = indicators.get_valid(&self.long_key, bar_index)?;
        let short_prev = indicators.get_valid(&self.short_key, bar_index - 1)?;
        let long_prev = indicators.get_valid(&self.long_key, bar_index - 1)?;

        let gap_cur = (short_cur - long_cur) / long_cur;
        let gap_prev = (short_prev - long_prev) / long_prev;

        let crossed_up = short_prev <= long_prev && short_cur > long_cur;
        let crossed_down = short_prev >= long_prev && short_cur < long_cur;

        let (direction, confidence) = if crossed_up || crossed_down {
            let raw = self.raw_strength(short_cur, long_cur, bar.close, crossed_up);
            let direction = if crossed_up {
                SignalDirection::Bullish
            } else {
                SignalDirection::Bearish
            };
            (direction, raw.clamp(0.6, 0.9))
        } else if gap_cur.abs() <= self.approach_threshold {
            // Converging EMAs: signal the direction the gap is moving.
            let direction = if gap_cur > gap_prev {
                SignalDirection::ApproachingBullish
            } else if gap_cur < gap_prev {
                SignalDirection::ApproachingBearish
            } else {
                return None;
            };
            let bullish = direction == SignalDirection::ApproachingBullish;
            let raw = self.raw_strength(short_cur, long_cur, bar.close, bullish);
            (direction, (raw * 0.7).clamp(0.3, 0.5))
        } else {
            return None;
        };

        Some(StrategySignal {
            symbol: bar.symbol.clone(),
            date: bar.date,
            direction,
            strength: direction.sign() * confidence * 100.0,
            detail: SignalDetail::EmaCrossover {
                short_ema: short_cur,
                long_ema: long_cur,
                convergence_pct: gap_cur.abs() * 100.0,
            },
        })
    }
}
