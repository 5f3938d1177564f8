//! Simple Moving Average (SMA).
//!
//! Rolling mean of close over `period` bars. Lookback: period - 1.

use crate::domain::Bar;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[i + 1 - self.period..=i];
            let mut sum = 0.0;
            let mut valid = true;
            for bar in window {
                if bar.close.is_nan() {
                    valid = false;
                    break;
                }
                sum += bar.close;
            }
            if valid {
                result[i] = sum / self.period as f64;
            }
        }

        result
    }
}
