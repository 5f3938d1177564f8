//! Swing strategy — RSI + Bollinger + EMA triple condition.
//!
//! Buy when RSI is oversold AND close is below the lower Bollinger band AND
//! close is above the EMA; sell on the mirrored condition; otherwise nothing.
//! One interchangeable generator under the common contract — nothing else in
//! the system treats it specially.

use crate::domain::{Bar, SignalDetail, SignalDirection, StrategySignal};
use crate::error::ConfigError;
use crate::indicators::{Bollinger, Ema, Indicator, IndicatorSet, Rsi};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct SwingStrategy {
    rsi_period: usize,
    rsi_oversold: f64,
    rsi_overbought: f64,
    bollinger_period: usize,
    bollinger_multiplier: f64,
    ema_period: usize,
    rsi_key: String,
    upper_key: String,
    lower_key: String,
    ema_key: String,
}

impl SwingStrategy {
    pub fn new(
        rsi_period: usize,
        rsi_oversold: f64,
        rsi_overbought: f64,
        bollinger_period: usize,
        bollinger_multiplier: f64,
        ema_period: usize,
    ) -> Result<Self, ConfigError> {
        if rsi_period < 1 {
            return Err(ConfigError::ZeroPeriod { name: "RSI" });
        }
        if bollinger_period < 1 {
            return Err(ConfigError::ZeroPeriod { name: "Bollinger" });
        }
        if ema_period < 1 {
            return Err(ConfigError::ZeroPeriod { name: "EMA" });
        }
        for (name, value) in [("rsi_oversold", rsi_oversold), ("rsi_overbought", rsi_overbought)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    range: "[0, 100]",
                    value,
                });
            }
        }
        if rsi_oversold >= rsi_overbought {
            return Err(ConfigError::OutOfRange {
                name: "rsi_oversold",
                range: "below rsi_overbought",
                value: rsi_oversold,
            });
        }
        if bollinger_multiplier <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "bollinger_multiplier",
                range: "(0, inf)",
                value: bollinger_multiplier,
            });
        }
        Ok(Self {
            rsi_period,
            rsi_oversold,
            rsi_overbought,
            bollinger_period,
            bollinger_multiplier,
            ema_period,
            rsi_key: Rsi::key(rsi_period),
            upper_key: Bollinger::upper(bollinger_period, bollinger_multiplier)
                .name()
                .to_string(),
            lower_key: Bollinger::lower(bollinger_period, bollinger_multiplier)
                .name()
                .to_string(),
            ema_key: Ema::key(ema_period),
        })
    }

    pub fn default_params() -> Self {
        Self::new(14, 30.0, 70.0, 20, 2.0, 20).expect("default swing parameters are valid")
    }
}

impl Strategy for SwingStrategy {
    fn name(&self) -> &'static str {
        "swing"
    }

    fn warmup_bars(&self) -> usize {
        self.rsi_period
            .max(self.bollinger_period)
            .max(self.ema_period)
    }

    fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Rsi::new(self.rsi_period)),
            Box::new(Bollinger::upper(
                self.bollinger_period,
                self.bollinger_multiplier,
            )),
            Box::new(Bollinger::lower(
                self.bollinger_period,
                self.bollinger_multiplier,
            )),
            Box::new(Ema::new(self.ema_period)),
        ]
    }

    fn evaluate(
        &self,
        bars: &[Bar],
        bar_index: usize,
        indicators: &IndicatorSet,
    ) -> Option<StrategySignal> {
        let bar = bars.get(bar_index)?;
        let close = bar.close;
        if close.is_nan() {
            return None;
        }

        let rsi = indicators.get_valid(&self.rsi_key, bar_index)?;
        let upper = indicators.get_valid(&self.upper_key, bar_index)?;
        let lower = indicators.get_valid(&self.lower_key, bar_index)?;
        let ema = indicators.get_valid(&self.ema_key, bar_index)?;

        let buy = rsi < self.rsi_oversold && close < lower && close > ema;
        let sell = rsi > self.rsi_overbought && close > upper && close < ema;

        let (direction, confidence) = if buy {
            let rsi_margin = (self.rsi_oversold - rsi) / self.rsi_oversold;
            let band_margin = (lower - close) / lower;
            let ema_margin = (close - ema) / ema;
            let avg = (rsi_margin + band_margin + ema_margin) / 3.0;
            (SignalDirection::Bullish, avg.clamp(0.5, 0.9))
        } else if sell {
            let rsi_margin = (rsi - self.rsi_overbought) / (100.0 - self.rsi_overbought);
            let band_margin = (close - upper) / upper;
            let ema_margin = (ema - close) / ema;
            let avg = (rsi_margin + band_margin + ema_margin) / 3.0;
            (SignalDirection::Bearish, avg.clamp(0.5, 0.9))
        } else {
            return None;
        };

        Some(StrategySignal {
            symbol: bar.symbol.clone(),
            date: bar.date,
            direction,
            strength: direction.sign() * confidence * 100.0,
            detail: SignalDetail::Swing {
                rsi,
                upper_band: upper,
                lower_band: lower,
                ema,
            },
        })
    }
}
