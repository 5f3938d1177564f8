//! Seeded synthetic price series for demos and tests.
//!
//! A geometric random walk with configurable drift and volatility. Seeded,
//! so every consumer (tests, the demo command) gets reproducible bars.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stratlab_core::domain::Bar;

/// Parameters of a synthetic daily series.
#[derive(Debug, Clone)]
pub struct SyntheticSeries {
    pub start_price: f64,
    /// Mean daily log-return.
    pub drift: f64,
    /// Daily return standard deviation.
    pub volatility: f64,
    pub len: usize,
    pub start_date: NaiveDate,
}

impl Default for SyntheticSeries {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0003,
            volatility: 0.015,
            len: 500,
            start_date: NaiveDate::from_ymd_opt(2022, 1, 3).expect("valid date"),
        }
    }
}

impl SyntheticSeries {
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }
}

/// Generate a seeded random-walk bar series for one symbol.
pub fn random_walk_bars(symbol: &str, series: &SyntheticSeries, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = series.start_price;
    let mut bars = Vec::with_capacity(series.len);

    for i in 0..series.len {
        let open = close;
        let shock: f64 = rng.gen_range(-1.0..1.0);
        let ret = series.drift + series.volatility * shock;
        close = (open * (1.0 + ret)).max(0.01);

        let body_high = open.max(close);
        let body_low = open.min(close);
        let wick: f64 = rng.gen_range(0.0..series.volatility) * open;

        bars.push(Bar {
            symbol: symbol.to_string(),
            date: series.start_date + chrono::Duration::days(i as i64),
            open,
            high: body_high + wick,
            low: (body_low - wick).max(0.01),
            close,
            volume: rng.gen_range(50_000..500_000),
        });
    }

    bars
}
