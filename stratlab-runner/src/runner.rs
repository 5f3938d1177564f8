//! Single-backtest runner — wires config, strategies, scorer, engine, and
//! metrics together.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use stratlab_core::domain::MarketData;
use stratlab_core::engine::{run_backtest_with_deadline, BacktestReport};
use stratlab_core::error::EngineError;
use stratlab_core::scorer::MultiStrategyScorer;

use crate::config::{RunConfig, RunConfigError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRunResult {
    /// Content hash of the producing configuration.
    pub run_id: String,
    pub metrics: PerformanceMetrics,
    pub report: BacktestReport,
}

/// Run one backtest over pre-loaded market data.
pub fn run_single_backtest(
    config: &RunConfig,
    data: &MarketData,
) -> Result<BacktestRunResult, RunError> {
    run_single_backtest_with_deadline(config, data, None)
}

/// Deadline-aware variant used by the optimizer's per-combination timeout.
pub fn run_single_backtest_with_deadline(
    config: &RunConfig,
    data: &MarketData,
    deadline: Option<Instant>,
) -> Result<BacktestRunResult, RunError> {
    let strategies = config.build_strategies()?;
    let scorer = MultiStrategyScorer::new(config.scorer.clone())
        .map_err(RunConfigError::Invalid)?;

    let report = run_backtest_with_deadline(data, &strategies, &scorer, &config.backtest, deadline)?;
    let metrics =
        PerformanceMetrics::compute(&report.equity_curve, &report.trades, config.backtest.initial_capital);

    info!(
        symbols = data.symbols().len(),
        bars = report.bar_count,
        trades = report.trades.len(),
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestRunResult {
        run_id: config.run_id(),
        metrics,
        report,
    })
}
