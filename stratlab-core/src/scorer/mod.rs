//! Multi-strategy scorer — weighted composite score and classification.
//!
//! The scorer is stateless: every evaluation point recomputes the composite
//! from the strategy signals emitted for that symbol/date. It is also the
//! single place strength normalization is enforced — every contributing
//! strength is clamped to [-100, 100] before weighting.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Classification, CompositeSignal, Contribution, StrategySignal};
use crate::error::ConfigError;

/// Classification thresholds, checked in strong-buy/buy/strong-sell/sell
/// order. Must satisfy `strong_buy >= buy >= sell >= strong_sell`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub strong_buy: f64,
    pub buy: f64,
    pub sell: f64,
    pub strong_sell: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            strong_buy: 60.0,
            buy: 30.0,
            sell: -30.0,
            strong_sell: -60.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strong_buy >= self.buy && self.buy >= self.sell && self.sell >= self.strong_sell {
            Ok(())
        } else {
            Err(ConfigError::ThresholdOrder {
                strong_buy: self.strong_buy,
                buy: self.buy,
                sell: self.sell,
                strong_sell: self.strong_sell,
            })
        }
    }

    fn classify(&self, score: f64) -> Classification {
        if score >= self.strong_buy {
            Classification::StrongBuy
        } else if score >= self.buy {
            Classification::Buy
        } else if score <= self.strong_sell {
            Classification::StrongSell
        } else if score <= self.sell {
            Classification::Sell
        } else {
            Classification::None
        }
    }
}

/// Scorer configuration: per-strategy weights plus thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Weight per strategy name; strategies without an entry weigh 1.0.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// When set, every strategy weighs 1.0 regardless of `weights`.
    #[serde(default)]
    pub equal_weighting: bool,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            equal_weighting: false,
            thresholds: Thresholds::default(),
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        for (strategy, &weight) in &self.weights {
            if weight < 0.0 || !weight.is_finite() {
                return Err(ConfigError::NegativeWeight {
                    strategy: strategy.clone(),
                    weight,
                });
            }
        }
        Ok(())
    }
}

const DEFAULT_WEIGHT: f64 = 1.0;

/// Combines the signals of all enabled strategies into one composite score.
#[derive(Debug, Clone)]
pub struct MultiStrategyScorer {
    config: ScorerConfig,
}

impl MultiStrategyScorer {
    /// Validates the configuration; invalid thresholds or weights are fatal
    /// here, never at evaluation time.
    pub fn new(config: ScorerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    fn weight_for(&self, strategy: &str) -> f64 {
        if self.config.equal_weighting {
            return DEFAULT_WEIGHT;
        }
        self.config
            .weights
            .get(strategy)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Compute the composite signal for one symbol/date.
    ///
    /// `signals` holds the contributing (non-none) strategy signals;
    /// `enabled` is the number of strategies that were asked, contributing
    /// or not — the participation part of confidence.
    pub fn score(
        &self,
        symbol: &str,
        date: NaiveDate,
        signals: &[StrategySignal],
        enabled: usize,
    ) -> CompositeSignal {
        if signals.is_empty() {
            return CompositeSignal {
                symbol: symbol.to_string(),
                date,
                composite_score: 0.0,
                classification: Classification::None,
                confidence: 0.0,
                contributions: Vec::new(),
            };
        }

        let mut contributions: Vec<Contribution> = signals
            .iter()
            .map(|signal| Contribution {
                strategy: signal.strategy_name().to_string(),
                strength: signal.strength.clamp(-100.0, 100.0),
                weight: self.weight_for(signal.strategy_name()),
            })
            .collect();

        let mut total_weight: f64 = contributions.iter().map(|c| c.weight).sum();
        if total_weight == 0.0 {
            // Every contributing strategy was weighted to zero. Fall back to
            // equal weighting rather than dividing by zero.
            warn!(symbol, %date, "all contributing strategy weights are zero; using equal weighting");
            for c in &mut contributions {
                c.weight = DEFAULT_WEIGHT;
            }
            total_weight = contributions.len() as f64;
        }

        let composite_score = contributions
            .iter()
            .map(|c| c.weight * c.strength)
            .sum::<f64>()
            / total_weight;

        let classification = self.config.thresholds.classify(composite_score);
        let confidence = confidence(&contributions, enabled);

        CompositeSignal {
            symbol: symbol.to_string(),
            date,
            composite_score,
            classification,
            confidence,
            contributions,
        }
    }
}

/// Participation x sign-agreement.
///
/// Participation: contributing strategies over enabled strategies.
/// Agreement: the majority sign's share of contributing signals — full
/// agreement gives 1.0, an even split halves it.
fn confidence(contributions: &[Contribution], enabled: usize) -> f64 {
    if contributions.is_empty() || enabled == 0 {
        return 0.0;
    }
    let participation = (contributions.len() as f64 / enabled as f64).min(1.0);

    let positive = contributions.iter().filter(|c| c.strength > 0.0).count();
    let negative = contributions.iter().filter(|c| c.strength < 0.0).count();
    let agreement = positive.max(negative) as f64 / contributions.len() as f64;

    participation * agreement
}
