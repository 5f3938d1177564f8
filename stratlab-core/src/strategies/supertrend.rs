//! SuperTrend strategy — trend following with reversal flags.
//!
//! Emits a signal on every bar the trend is defined: direction mirrors the
//! SuperTrend direction, `trend_change` marks the exact flip bar, and
//! strength scales with how far price sits from the line in ATR units.

use crate::domain::{Bar, SignalDetail, SignalDirection, StrategySignal};
use crate::error::ConfigError;
use crate::indicators::{Atr, Indicator, IndicatorSet, Supertrend, SupertrendBand};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct SupertrendStrategy {
    atr_period: usize,
    multiplier: f64,
    line_key: String,
    dir_key: String,
    atr_key: String,
}

impl SupertrendStrategy {
    pub fn new(atr_period: usize, multiplier: f64) -> Result<Self, ConfigError> {
        if atr_period < 1 || atr_period > 100 {
            return Err(ConfigError::OutOfRange {
                name: "atr_period",
                range: "[1, 100]",
                value: atr_period as f64,
            });
        }
        if multiplier <= 0.0 || multiplier > 10.0 {
            return Err(ConfigError::OutOfRange {
                name: "multiplier",
                range: "(0, 10]",
                value: multiplier,
            });
        }
        Ok(Self {
            atr_period,
            multiplier,
            line_key: Supertrend::key(atr_period, multiplier, SupertrendBand::Line),
            dir_key: Supertrend::key(atr_period, multiplier, SupertrendBand::Direction),
            atr_key: Atr::key(atr_period),
        })
    }

    /// The conventional 10-period, 3x configuration.
    pub fn default_params() -> Self {
        Self::new(10, 3.0).expect("default SuperTrend parameters are valid")
    }
}

impl Strategy for SupertrendStrategy {
    fn name(&self) -> &'static str {
        "supertrend"
    }

    fn warmup_bars(&self) -> usize {
        self.atr_period
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Supertrend::line(self.atr_period, self.multiplier)),
            Box::new(Supertrend::direction(self.atr_period, self.multiplier)),
            Box::new(Atr::new(self.atr_period)),
        ]
    }

    fn evaluate(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorSet,
    ) -> Option<StrategySignal> {
        let bar = bars.get(bar_index)?;
        if bar.close.is_nan() {
            return None;
        }

        let line = indicators.get_valid(&self.line_key, bar_index)?;
        let dir = indicators.get_valid(&self.dir_key, bar_index)?;
        let atr = indicators.get_valid(&self.atr_key, bar_index)?;
        if atr <= 0.0 {
            // Zero-volatility series: the line degenerates onto price.
            return None;
        }

        let direction = if dir > 0.0 {
            SignalDirection::Bullish
        } else {
            SignalDirection::Bearish
        };
        let trend_change = bar_index > 0
            && indicators
                .get_valid(&self.dir_key, bar_index - 1)
                .is_some_and(|prev| prev != dir);

        let strength = (100.0 * (bar.close - line) / (self.multiplier * atr)).clamp(-100.0, 100.0);

        Some(StrategySignal {
            symbol: bar.symbol.clone(),
            date: bar.date,
            direction,
            strength,
            detail: SignalDetail::Supertrend {
                value: line,
                atr,
                trend_change,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    fn strategy() -> SupertrendStrategy {
        SupertrendStrategy::new(3, 2.0).unwrap()
    }

    fn precompute(bars: &[Bar]) -> IndicatorSet {
        IndicatorSet::compute_all(bars, &strategy().required_indicators())
    }

    fn uptrend_bars(len: usize) -> Vec<Bar> {
        let data: Vec<(f64, f64, f64, f64)> = (0..len)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                (base - 1.0, base + 3.0, base - 3.0, base + 1.0)
            })
            .collect();
        make_ohlc_bars(&data)
    }

    #[test]
    fn emits_every_bar_once_defined() {
        let bars = uptrend_bars(15);
        let set = precompute(&bars);
        let strat = strategy();

        assert!(strat.evaluate(&bars, 1, &set).is_none(), "warmup is silent");
        for t in 4..15 {
            let signal = strat.evaluate(&bars, t, &set).expect("defined trend fires");
            assert_eq!(signal.direction, SignalDirection::Bullish);
            assert!(signal.strength > 0.0);
        }
    }

    #[test]
    fn flags_trend_change_exactly_once() {
        let mut data: Vec<(f64, f64, f64, f64)> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                (base - 1.0, base + 3.0, base - 3.0, base + 1.0)
            })
            .collect();
        data.push((118.0, 118.0, 48.0, 50.0)); // crash bar flips bearish
        data.push((50.0, 52.0, 46.0, 48.0));
        let bars = make_ohlc_bars(&data);
        let set = precompute(&bars);
        let strat = strategy();

        let flags: Vec<bool> = (4..12)
            .map(|t| match strat.evaluate(&bars, t, &set).unwrap().detail {
                SignalDetail::Supertrend { trend_change, .. } => trend_change,
                _ => panic!("wrong detail variant"),
            })
            .collect();

        // Only the crash bar (index 10, position 6 in the window) flips.
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        assert!(flags[6]);

        let crash = strat.evaluate(&bars, 10, &set).unwrap();
        assert_eq!(crash.direction, SignalDirection::Bearish);
        assert!(crash.strength < 0.0);
    }

    #[test]
    fn strength_is_clamped() {
        let bars = uptrend_bars(20);
        let set = precompute(&bars);
        for t in 4..20 {
            let signal = strategy().evaluate(&bars, t, &set).unwrap();
            assert!(signal.strength >= -100.0 && signal.strength <= 100.0);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(SupertrendStrategy::new(0, 3.0).is_err());
        assert!(SupertrendStrategy::new(101, 3.0).is_err());
        assert!(SupertrendStrategy::new(10, 0.0).is_err());
        assert!(SupertrendStrategy::new(10, 11.0).is_err());
    }

    #[test]
    fn default_params_are_valid() {
        let strat = SupertrendStrategy::default_params();
        assert_eq!(strat.name(), "supertrend");
        assert_eq!(strat.warmup_bars(), 10);
        assert_eq!(strat.required_indicators().len(), 3);
    }
}
