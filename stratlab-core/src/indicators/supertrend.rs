//! SuperTrend — ATR-offset bands with directional hysteresis.
//!
//! Inherently sequential: every bar's final bands carry forward from the
//! previous bar's, so this cannot be expressed as a per-bar map.
//!
//! Recurrence (per bar, after ATR warm-up):
//! - basic_upper = hl2 + mult * ATR, basic_lower = hl2 - mult * ATR
//! - final_upper tightens: basic_upper replaces it only when lower, unless
//!   the previous close already escaped above it (symmetric for the lower
//!   band)
//! - trend flips bullish when close crosses above the previous final upper
//!   band, bearish when it crosses below the previous final lower band,
//!   otherwise the prior direction persists
//! - the active line is the lower band while bullish, the upper while bearish
//!
//! Two named series per parameterization: the line and the direction
//! (+1 bullish / -1 bearish, NaN during warm-up).

use crate::domain::Bar;

use super::atr::{true_range, wilder_smooth};
use super::Indicator;

/// Which SuperTrend series to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupertrendBand {
    Line,
    Direction,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    band: SupertrendBand,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64, band: SupertrendBand) -> Self {
        assert!(period >= 1, "SuperTrend period must be >= 1");
        let name = match band {
            SupertrendBand::Line => format!("supertrend_{period}_{multiplier}"),
            SupertrendBand::Direction => format!("supertrend_dir_{period}_{multiplier}"),
        };
        Self {
            period,
            multiplier,
            band,
            name,
        }
    }

    pub fn line(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, SupertrendBand::Line)
    }

    pub fn direction(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, SupertrendBand::Direction)
    }

    pub fn key(period: usize, multiplier: f64, band: SupertrendBand) -> String {
        Self::new(period, multiplier, band).name
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (line, direction) = compute_supertrend(bars, self.period, self.multiplier);
        match self.band {
            SupertrendBand::Line => line,
            SupertrendBand::Direction => direction,
        }
    }
}

/// Run the full SuperTrend recurrence once, producing both series.
fn compute_supertrend(bars: &[Bar], period: usize, multiplier: f64) -> (Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut line = vec![f64::NAN; n];
    let mut direction = vec![f64::NAN; n];

    let mut tr = true_range(bars);
    if !tr.is_empty() {
        tr[0] = f64::NAN;
    }
    let atr = wilder_smooth(&tr, period);

    let start = match atr.iter().position(|v| !v.is_nan()) {
        Some(idx) => idx,
        None => return (line, direction),
    };

    // Initialize from the first valid ATR bar; the run starts bullish.
    let hl2 = (bars[start].high + bars[start].low) / 2.0;
    let mut final_upper = hl2 + multiplier * atr[start];
    let mut final_lower = hl2 - multiplier * atr[start];
    let mut bullish = true;
    line[start] = final_lower;
    direction[start] = 1.0;

    for i in (start + 1)..n {
        let bar = &bars[i];
        if atr[i].is_nan() || bar.has_nan() {
            continue;
        }

        let hl2 = (bar.high + bar.low) / 2.0;
        let basic_upper = hl2 + multiplier * atr[i];
        let basic_lower = hl2 - multiplier * atr[i];
        let prev_close = bars[i - 1].close;

        // Flip test runs against the previous bar's final bands.
        if bullish && bar.close < final_lower {
            bullish = false;
        } else if !bullish && bar.close > final_upper {
            bullish = true;
        }

        // Band carry-forward with hysteresis.
        final_upper = if basic_upper < final_upper || prev_close > final_upper {
            basic_upper
        } else {
            final_upper
        };
        final_lower = if basic_lower > final_lower || prev_close < final_lower {
            basic_lower
        } else {
            final_lower
        };

        line[i] = if bullish { final_lower } else { final_upper };
        direction[i] = if bullish { 1.0 } else { -1.0 };
    }

    (line, direction)
}
