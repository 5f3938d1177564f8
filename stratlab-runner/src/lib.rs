//! StratLab Runner — backtest orchestration on top of `stratlab-core`.
//!
//! This crate provides:
//! - TOML-loadable run configuration with load-time validation
//! - A single-run entry point wiring strategies, scorer, engine, metrics
//! - Performance metrics (pure functions of equity curve + trade log)
//! - A rayon-parallel parameter optimizer with per-combination timeouts
//! - A seeded synthetic bar generator for demos and tests

pub mod config;
pub mod metrics;
pub mod optimizer;
pub mod runner;
pub mod synthetic;

pub use config::{
    EmaCrossoverParams, RunConfig, RunConfigError, StrategiesConfig, SupertrendParams,
    SwingParams,
};
pub use metrics::PerformanceMetrics;
pub use optimizer::{
    optimize, Combination, ComboOutcome, ComboResult, OptimizationReport, OptimizerConfig,
    ParamGrid, RankingMetric,
};
pub use runner::{run_single_backtest, BacktestRunResult, RunError};
pub use synthetic::{random_walk_bars, SyntheticSeries};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn optimizer_types_cross_threads() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<ComboResult>();
        assert_sync::<ComboResult>();
    }
}
