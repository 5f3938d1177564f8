//! Property tests for the metrics layer.

use chrono::NaiveDate;
use proptest::prelude::*;

use stratlab_core::domain::{EquityPoint, ExitReason, PositionSide, Trade};
use stratlab_runner::metrics::{max_drawdown, profit_factor, win_rate, PerformanceMetrics};

fn curve(values: &[f64]) -> Vec<EquityPoint> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, &equity)| EquityPoint {
            date: base + chrono::Duration::days(i as i64),
            equity,
        })
        .collect()
}

fn trade(pnl: f64) -> Trade {
    let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    Trade {
        symbol: "ACME".into(),
        side: PositionSide::Long,
        entry_date: date,
        entry_price: 100.0,
        exit_date: date + chrono::Duration::days(3),
        exit_price: 100.0 + pnl / 10.0,
        quantity: 10.0,
        pnl,
        pnl_percent: pnl / 1000.0 * 100.0,
        commission: 2.0,
        holding_days: 3,
        exit_reason: ExitReason::EndOfRun,
    }
}

proptest! {
    #[test]
    fn win_rate_is_a_fraction(pnls in prop::collection::vec(-1000.0f64..1000.0, 0..50)) {
        let trades: Vec<Trade> = pnls.iter().map(|&p| trade(p)).collect();
        let w = win_rate(&trades);
        prop_assert!((0.0..=1.0).contains(&w));
    }

    #[test]
    fn max_drawdown_is_a_nonnegative_fraction(
        values in prop::collection::vec(1.0f64..1_000_000.0, 1..200),
    ) {
        let dd = max_drawdown(&curve(&values));
        prop_assert!((0.0..=1.0).contains(&dd));
    }

    #[test]
    fn profit_factor_never_panics_and_never_goes_negative(
        pnls in prop::collection::vec(-1000.0f64..1000.0, 0..50),
    ) {
        let trades: Vec<Trade> = pnls.iter().map(|&p| trade(p)).collect();
        let pf = profit_factor(&trades);
        prop_assert!(pf >= 0.0); // INFINITY compares greater than anything finite
    }

    #[test]
    fn aggregate_metrics_are_never_nan(
        values in prop::collection::vec(1_000.0f64..1_000_000.0, 2..150),
        pnls in prop::collection::vec(-1000.0f64..1000.0, 0..30),
    ) {
        let trades: Vec<Trade> = pnls.iter().map(|&p| trade(p)).collect();
        let m = PerformanceMetrics::compute(&curve(&values), &trades, values[0]);
        prop_assert!(!m.total_return.is_nan());
        prop_assert!(!m.cagr.is_nan());
        prop_assert!(!m.sharpe.is_nan());
        prop_assert!(!m.sortino.is_nan());
        prop_assert!(!m.max_drawdown.is_nan());
        prop_assert!(!m.win_rate.is_nan());
        prop_assert!(!m.profit_factor.is_nan());
    }
}
