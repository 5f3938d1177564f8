//! Parameter optimizer — grid enumeration, parallel execution, ranking.
//!
//! Every combination runs a fresh, independent engine against the same
//! read-only market data; there is no shared mutable state, so rayon may
//! fan the grid out across cores. A combination that fails or times out is
//! recorded as a failed entry without disturbing its siblings.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use stratlab_core::domain::MarketData;
use stratlab_core::error::EngineError;

use crate::config::RunConfig;
use crate::metrics::PerformanceMetrics;
use crate::runner::{run_single_backtest_with_deadline, RunError};

/// Named parameter ranges to sweep. An empty dimension holds the base
/// config's value, so grids only need to name what they vary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub ema_short_periods: Vec<usize>,
    pub ema_long_periods: Vec<usize>,
    pub supertrend_periods: Vec<usize>,
    pub supertrend_multipliers: Vec<f64>,
    pub stop_loss_percents: Vec<f64>,
    pub take_profit_percents: Vec<f64>,
}

impl ParamGrid {
    /// A small default sweep over the crossover and SuperTrend parameters.
    pub fn standard() -> Self {
        Self {
            ema_short_periods: vec![20, 50],
            ema_long_periods: vec![100, 200],
            supertrend_periods: vec![7, 10, 14],
            supertrend_multipliers: vec![2.0, 3.0],
            ..Default::default()
        }
    }

    /// Enumerate the Cartesian product, skipping invalid members
    /// (`short >= long`).
    pub fn combinations(&self, base: &RunConfig) -> Vec<Combination> {
        let base_ema = base.strategies.ema_crossover.clone().unwrap_or_default();
        let base_st = base.strategies.supertrend.clone().unwrap_or_default();

        let shorts = dim(&self.ema_short_periods, base_ema.short_period);
        let longs = dim(&self.ema_long_periods, base_ema.long_period);
        let st_periods = dim(&self.supertrend_periods, base_st.atr_period);
        let st_mults = dim(&self.supertrend_multipliers, base_st.multiplier);
        let stops = dim(&self.stop_loss_percents, base.backtest.stop_loss_percent);
        let targets = dim(&self.take_profit_percents, base.backtest.take_profit_percent);

        let mut combos = Vec::new();
        for &ema_short in &shorts {
            for &ema_long in &longs {
                if ema_short >= ema_long {
                    continue;
                }
                for &supertrend_period in &st_periods {
                    for &supertrend_multiplier in &st_mults {
                        for &stop_loss_percent in &stops {
                            for &take_profit_percent in &targets {
                                combos.push(Combination {
                                    ema_short,
                                    ema_long,
                                    supertrend_period,
                                    supertrend_multiplier,
                                    stop_loss_percent,
                                    take_profit_percent,
                                });
                            }
                        }
                    }
                }
            }
        }
        combos
    }
}

fn dim<T: Clone>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// One point of the parameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub ema_short: usize,
    pub ema_long: usize,
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
}

impl Combination {
    /// Content-addressed identifier, stable across runs.
    pub fn id(&self) -> String {
        let json = serde_json::to_string(self).expect("Combination serializes");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Overlay this combination onto a base configuration.
    pub fn apply(&self, base: &RunConfig) -> RunConfig {
        let mut config = base.clone();
        if let Some(ema) = &mut config.strategies.ema_crossover {
            ema.short_period = self.ema_short;
            ema.long_period = self.ema_long;
        }
        if let Some(st) = &mut config.strategies.supertrend {
            st.atr_period = self.supertrend_period;
            st.multiplier = self.supertrend_multiplier;
        }
        config.backtest.stop_loss_percent = self.stop_loss_percent;
        config.backtest.take_profit_percent = self.take_profit_percent;
        config
    }
}

/// Which §4.5 metric orders the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    Sharpe,
    Sortino,
    TotalReturn,
    Cagr,
    ProfitFactor,
    WinRate,
}

impl RankingMetric {
    pub fn extract(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            Self::Sharpe => metrics.sharpe,
            Self::Sortino => metrics.sortino,
            Self::TotalReturn => metrics.total_return,
            Self::Cagr => metrics.cagr,
            Self::ProfitFactor => metrics.profit_factor,
            Self::WinRate => metrics.win_rate,
        }
    }
}

/// Optimizer execution settings.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub metric: RankingMetric,
    pub parallel: bool,
    /// Wall-clock budget per combination; `None` means unbounded.
    pub run_timeout: Option<Duration>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            metric: RankingMetric::Sharpe,
            parallel: true,
            run_timeout: None,
        }
    }
}

/// How one combination ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComboOutcome {
    Completed { metrics: PerformanceMetrics },
    TimedOut,
    Failed { reason: String },
}

impl ComboOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// One ranked entry of the optimization report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboResult {
    pub combo_id: String,
    pub combination: Combination,
    pub outcome: ComboOutcome,
}

/// Ranked results of a full sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub metric: RankingMetric,
    /// Completed entries first (best score on top), then failures.
    pub results: Vec<ComboResult>,
}

impl OptimizationReport {
    pub fn best(&self) -> Option<&ComboResult> {
        self.results.first().filter(|r| r.outcome.is_completed())
    }

    pub fn completed(&self) -> impl Iterator<Item = &ComboResult> {
        self.results.iter().filter(|r| r.outcome.is_completed())
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.outcome.is_completed())
            .count()
    }
}

/// Sweep the grid: one independent engine run per combination, ranked by the
/// chosen metric.
pub fn optimize(
    data: &MarketData,
    base: &RunConfig,
    grid: &ParamGrid,
    opts: &OptimizerConfig,
) -> OptimizationReport {
    let combos = grid.combinations(base);
    info!(
        combinations = combos.len(),
        parallel = opts.parallel,
        "starting parameter sweep"
    );

    let run_one = |combo: &Combination| -> ComboResult {
        let config = combo.apply(base);
        let deadline = opts.run_timeout.map(|budget| Instant::now() + budget);
        let outcome = match run_single_backtest_with_deadline(&config, data, deadline) {
            Ok(result) => ComboOutcome::Completed {
                metrics: result.metrics,
            },
            Err(RunError::Engine(EngineError::DeadlineExceeded { bars_processed })) => {
                warn!(combo = %combo.id(), bars_processed, "combination timed out");
                ComboOutcome::TimedOut
            }
            Err(err) => {
                warn!(combo = %combo.id(), error = %err, "combination failed");
                ComboOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        ComboResult {
            combo_id: combo.id(),
            combination: combo.clone(),
            outcome,
        }
    };

    let mut results: Vec<ComboResult> = if opts.parallel {
        combos.par_iter().map(run_one).collect()
    } else {
        combos.iter().map(run_one).collect()
    };

    // Completed entries first, best score on top; NaN scores and failures
    // sink to the bottom. Combination ID breaks exact ties deterministically.
    let metric = opts.metric;
    results.sort_by(|a, b| {
        score_key(b, metric)
            .partial_cmp(&score_key(a, metric))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.combo_id.cmp(&b.combo_id))
    });

    OptimizationReport { metric, results }
}

fn score_key(result: &ComboResult, metric: RankingMetric) -> f64 {
    match &result.outcome {
        ComboOutcome::Completed { metrics } => {
            let score = metric.extract(metrics);
            if score.is_nan() {
                f64::NEG_INFINITY
            } else {
                score
            }
        }
        _ => f64::NEG_INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dimensions_collapse_to_the_base_value() {
        let grid = ParamGrid::default();
        let combos = grid.combinations(&RunConfig::default());
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].ema_short, 50);
        assert_eq!(combos[0].ema_long, 200);
        assert_eq!(combos[0].stop_loss_percent, 5.0);
    }

    #[test]
    fn invalid_period_orders_are_skipped() {
        let grid = ParamGrid {
            ema_short_periods: vec![10, 50, 100],
            ema_long_periods: vec![50, 100],
            ..Default::default()
        };
        let combos = grid.combinations(&RunConfig::default());
        // Valid: (10,50), (10,100), (50,100).
        assert_eq!(combos.len(), 3);
        assert!(combos.iter().all(|c| c.ema_short < c.ema_long));
    }

    #[test]
    fn combination_ids_are_stable_and_distinct() {
        let grid = ParamGrid {
            supertrend_periods: vec![7, 14],
            ..Default::default()
        };
        let combos = grid.combinations(&RunConfig::default());
        assert_eq!(combos.len(), 2);
        assert_eq!(combos[0].id(), combos[0].id());
        assert_ne!(combos[0].id(), combos[1].id());
    }

    #[test]
    fn apply_overlays_only_the_swept_fields() {
        let combo = Combination {
            ema_short: 20,
            ema_long: 100,
            supertrend_period: 14,
            supertrend_multiplier: 2.5,
            stop_loss_percent: 8.0,
            take_profit_percent: 20.0,
        };
        let config = combo.apply(&RunConfig::default());
        assert_eq!(config.strategies.ema_crossover.unwrap().short_period, 20);
        assert_eq!(config.strategies.supertrend.unwrap().atr_period, 14);
        assert_eq!(config.backtest.stop_loss_percent, 8.0);
        // Untouched base settings survive.
        assert_eq!(config.backtest.initial_capital, 100_000.0);
    }
}
