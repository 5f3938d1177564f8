//! MarketData — validated per-symbol bar series plus a common date axis.
//!
//! The engine steps over the intersection of all symbols' trading dates, so
//! every symbol has exactly one bar per axis slot. Per-symbol index maps are
//! built once at construction; the bar loop never searches by date.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::bar::Bar;
use crate::error::ConfigError;

/// Pre-loaded, validated price history for a universe of symbols.
#[derive(Debug, Clone)]
pub struct MarketData {
    symbols: Vec<String>,
    bars: HashMap<String, Vec<Bar>>,
    dates: Vec<NaiveDate>,
    /// aligned[symbol][t] = index into bars[symbol] for axis date t.
    aligned: HashMap<String, Vec<usize>>,
}

impl MarketData {
    /// Build market data from per-symbol bar series.
    ///
    /// Each series must be strictly increasing by date. The common date axis
    /// is the sorted intersection of all symbols' dates.
    pub fn new(bars_by_symbol: HashMap<String, Vec<Bar>>) -> Result<Self, ConfigError> {
        if bars_by_symbol.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }

        let mut symbols: Vec<String> = bars_by_symbol.keys().cloned().collect();
        symbols.sort();

        for symbol in &symbols {
            let series = &bars_by_symbol[symbol];
            for (i, pair) in series.windows(2).enumerate() {
                if pair[1].date <= pair[0].date {
                    return Err(ConfigError::UnorderedBars {
                        symbol: symbol.clone(),
                        index: i + 1,
                    });
                }
            }
        }

        // Common axis: dates present in every symbol's series.
        let mut dates: Vec<NaiveDate> = bars_by_symbol[&symbols[0]]
            .iter()
            .map(|b| b.date)
            .collect();
        for symbol in &symbols[1..] {
            let have: std::collections::HashSet<NaiveDate> =
                bars_by_symbol[symbol].iter().map(|b| b.date).collect();
            dates.retain(|d| have.contains(d));
        }

        // Per-symbol index map aligned to the axis. Both sides are sorted,
        // so a single forward scan suffices.
        let mut aligned = HashMap::new();
        for symbol in &symbols {
            let series = &bars_by_symbol[symbol];
            let mut indices = Vec::with_capacity(dates.len());
            let mut cursor = 0;
            for date in &dates {
                while series[cursor].date != *date {
                    cursor += 1;
                }
                indices.push(cursor);
            }
            aligned.insert(symbol.clone(), indices);
        }

        Ok(Self {
            symbols,
            bars: bars_by_symbol,
            dates,
            aligned,
        })
    }

    /// Convenience constructor for a single symbol.
    pub fn single(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, ConfigError> {
        let mut map = HashMap::new();
        map.insert(symbol.into(), bars);
        Self::new(map)
    }

    /// Symbols in deterministic (sorted) order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The common date axis.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of bars on the common axis.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// A symbol's full bar series (its own history, not axis-trimmed).
    pub fn series(&self, symbol: &str) -> Option<&[Bar]> {
        self.bars.get(symbol).map(|v| v.as_slice())
    }

    /// The bar for `symbol` at axis slot `t`.
    pub fn bar(&self, symbol: &str, t: usize) -> Option<&Bar> {
        let idx = *self.aligned.get(symbol)?.get(t)?;
        self.bars.get(symbol)?.get(idx)
    }

    /// Index into `series(symbol)` corresponding to axis slot `t`.
    pub fn series_index(&self, symbol: &str, t: usize) -> Option<usize> {
        self.aligned.get(symbol)?.get(t).copied()
    }
}
