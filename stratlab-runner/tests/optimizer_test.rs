//! Optimizer integration: parallel sweeps, failure isolation, timeouts,
//! ranking.

use std::time::Duration;

use stratlab_core::domain::MarketData;
use stratlab_runner::{
    optimize, ComboOutcome, OptimizerConfig, ParamGrid, RankingMetric, RunConfig,
};
use stratlab_runner::synthetic::{random_walk_bars, SyntheticSeries};

fn market() -> MarketData {
    let spec = SyntheticSeries::default().with_len(400);
    let mut universe = std::collections::HashMap::new();
    universe.insert("ACME".to_string(), random_walk_bars("ACME", &spec, 11));
    universe.insert("BOLT".to_string(), random_walk_bars("BOLT", &spec, 23));
    MarketData::new(universe).unwrap()
}

/// Small periods keep runs cheap against the 400-bar fixture.
fn base_config() -> RunConfig {
    let mut config = RunConfig::default();
    let ema = config.strategies.ema_crossover.as_mut().unwrap();
    ema.short_period = 10;
    ema.long_period = 30;
    config
}

#[test]
fn sweep_completes_every_valid_combination() {
    let grid = ParamGrid {
        ema_short_periods: vec![5, 10],
        ema_long_periods: vec![20, 40],
        supertrend_multipliers: vec![2.0, 3.0],
        ..Default::default()
    };
    let report = optimize(&market(), &base_config(), &grid, &OptimizerConfig::default());

    assert_eq!(report.results.len(), 8);
    assert_eq!(report.failed_count(), 0);
    assert!(report.best().is_some());
}

#[test]
fn ranking_is_descending_by_the_chosen_metric() {
    let grid = ParamGrid {
        ema_short_periods: vec![5, 10, 15],
        ema_long_periods: vec![30],
        ..Default::default()
    };
    let opts = OptimizerConfig {
        metric: RankingMetric::TotalReturn,
        ..Default::default()
    };
    let report = optimize(&market(), &base_config(), &grid, &opts);

    let scores: Vec<f64> = report
        .completed()
        .map(|r| match &r.outcome {
            ComboOutcome::Completed { metrics } => metrics.total_return,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(scores.len(), 3);
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1], "ranking must be descending: {scores:?}");
    }
}

#[test]
fn one_bad_combination_does_not_poison_the_sweep() {
    // A negative stop-loss fails config validation inside its own run.
    let grid = ParamGrid {
        stop_loss_percents: vec![5.0, -1.0],
        ..Default::default()
    };
    let report = optimize(&market(), &base_config(), &grid, &OptimizerConfig::default());

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failed_count(), 1);
    let failed = report
        .results
        .iter()
        .find(|r| !r.outcome.is_completed())
        .unwrap();
    assert!(matches!(failed.outcome, ComboOutcome::Failed { .. }));
    assert_eq!(failed.combination.stop_loss_percent, -1.0);
    // The healthy sibling still ranks on top.
    assert!(report.best().is_some());
}

#[test]
fn zero_timeout_marks_combinations_incomplete() {
    let grid = ParamGrid {
        supertrend_periods: vec![7, 10],
        ..Default::default()
    };
    let opts = OptimizerConfig {
        run_timeout: Some(Duration::ZERO),
        ..Default::default()
    };
    let report = optimize(&market(), &base_config(), &grid, &opts);

    assert_eq!(report.results.len(), 2);
    assert!(report
        .results
        .iter()
        .all(|r| matches!(r.outcome, ComboOutcome::TimedOut)));
    assert!(report.best().is_none());
}

#[test]
fn parallel_and_sequential_sweeps_agree() {
    let grid = ParamGrid {
        ema_short_periods: vec![5, 10],
        ema_long_periods: vec![25],
        stop_loss_percents: vec![4.0, 6.0],
        ..Default::default()
    };
    let data = market();
    let base = base_config();

    let parallel = optimize(&data, &base, &grid, &OptimizerConfig::default());
    let sequential = optimize(
        &data,
        &base,
        &grid,
        &OptimizerConfig {
            parallel: false,
            ..Default::default()
        },
    );

    assert_eq!(parallel.results.len(), sequential.results.len());
    for (p, s) in parallel.results.iter().zip(&sequential.results) {
        assert_eq!(p.combo_id, s.combo_id, "identical deterministic ordering");
    }
}
