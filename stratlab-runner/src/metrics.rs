//! Performance metrics — pure functions of the equity curve and trade log.
//!
//! No dependencies on the runner or engine internals: everything here takes
//! the engine's outputs and returns scalars.

use serde::{Deserialize, Serialize};
use stratlab_core::domain::{EquityPoint, Trade};

/// Trading days per year, used to annualize Sharpe/Sortino.
const TRADING_DAYS: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
///
/// `profit_factor` is `f64::INFINITY` when there are profits but no losses —
/// the undefined case is reported as a sentinel, never a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Fractional total return: (final - initial) / initial.
    pub total_return: f64,
    /// Compound annual growth rate over the elapsed calendar span.
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    /// Largest peak-to-trough decline as a positive fraction.
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_holding_days: f64,
    pub initial_equity: f64,
    pub final_equity: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve and trade log.
    pub fn compute(equity_curve: &[EquityPoint], trades: &[Trade], initial_capital: f64) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let winners: Vec<&Trade> = trades.iter().filter(|t| t.is_winner()).collect();
        let losers: Vec<&Trade> = trades.iter().filter(|t| !t.is_winner()).collect();

        Self {
            total_return: total_return(equity_curve, initial_capital),
            cagr: cagr(equity_curve, initial_capital),
            sharpe: sharpe_ratio(equity_curve),
            sortino: sortino_ratio(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            avg_win: mean(winners.iter().map(|t| t.pnl)),
            avg_loss: mean(losers.iter().map(|t| t.pnl)),
            avg_holding_days: mean(trades.iter().map(|t| t.holding_days as f64)),
            initial_equity: initial_capital,
            final_equity,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fractional total return against initial capital.
pub fn total_return(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    match equity_curve.last() {
        Some(last) => (last.equity - initial_capital) / initial_capital,
        None => 0.0,
    }
}

/// CAGR using the elapsed calendar span of the equity curve.
pub fn cagr(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if initial_capital <= 0.0 || last.equity <= 0.0 {
        return 0.0;
    }
    let days = (last.date - first.date).num_days() as f64;
    let years = days / 365.25;
    if years <= 0.0 {
        return 0.0;
    }
    (last.equity / initial_capital).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio: mean(daily return) / stdev(daily return) * sqrt(252).
pub fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(returns.iter().copied());
    let sd = std_dev(&returns);
    if sd < 1e-15 {
        return 0.0;
    }
    (m / sd) * TRADING_DAYS.sqrt()
}

/// Annualized Sortino ratio: same numerator as Sharpe, downside deviation
/// in the denominator.
pub fn sortino_ratio(equity_curve: &[EquityPoint]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(returns.iter().copied());
    let downside_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_count = returns.iter().filter(|&&r| r < 0.0).count();
    if downside_count == 0 {
        return 0.0; // no downside: ratio undefined
    }
    let downside_dev = (downside_sq / returns.len() as f64).sqrt();
    if downside_dev < 1e-15 {
        return 0.0;
    }
    (m / downside_dev) * TRADING_DAYS.sqrt()
}

/// Largest peak-to-trough drawdown as a positive fraction.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of closed trades with positive net P&L.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit / |gross loss|. `f64::INFINITY` when there are profits but
/// zero gross loss; 0.0 with no trades or no profits.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();
    if gross_loss < 1e-12 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-bar fractional returns of the equity curve.
pub fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        return 0.0;
    }
    collected.iter().sum::<f64>() / collected.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stratlab_core::domain::{ExitReason, PositionSide};

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
            exit_date: date + chrono::Duration::days(5),
            exit_price: 100.0 + pnl / 50.0,
            quantity: 50.0,
            pnl,
            pnl_percent: pnl / 5000.0 * 100.0,
            commission: 10.0,
            holding_days: 5,
            exit_reason: ExitReason::TakeProfit,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_positive() {
        let eq = curve(&[100_000.0, 100_500.0, 110_000.0]);
        assert!((total_return(&eq, 100_000.0) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn total_return_empty_curve() {
        assert_eq!(total_return(&[], 100_000.0), 0.0);
    }

    // ── CAGR ──

    #[test]
    fn cagr_one_year_span() {
        // Two points exactly one year apart with 10% growth.
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let eq = vec![
            EquityPoint { date: base, equity: 100_000.0 },
            EquityPoint {
                date: base + chrono::Duration::days(365),
                equity: 110_000.0,
            },
        ];
        let c = cagr(&eq, 100_000.0);
        assert!((c - 0.1).abs() < 0.002, "CAGR should be ~10%, got {c}");
    }

    #[test]
    fn cagr_zero_span_is_zero() {
        let eq = curve(&[100_000.0]);
        assert_eq!(cagr(&eq, 100_000.0), 0.0);
    }

    // ── Sharpe / Sortino ──

    #[test]
    fn sharpe_constant_equity_is_zero() {
        let eq = curve(&[100_000.0; 50]);
        assert_eq!(sharpe_ratio(&eq), 0.0);
    }

    #[test]
    fn sharpe_positive_for_alternating_gains() {
        let mut values = vec![100_000.0];
        for i in 1..253 {
            let r = if i % 2 == 0 { 1.002 } else { 1.0005 };
            values.push(values[i - 1] * r);
        }
        let s = sharpe_ratio(&curve(&values));
        assert!(s > 5.0, "consistently positive returns give high Sharpe, got {s}");
    }

    #[test]
    fn sortino_no_downside_is_zero() {
        let values: Vec<f64> = (0..100).map(|i| 100_000.0 + i as f64 * 100.0).collect();
        assert_eq!(sortino_ratio(&curve(&values)), 0.0);
    }

    #[test]
    fn sortino_positive_with_small_dips() {
        let mut values = vec![100_000.0];
        for _ in 0..50 {
            values.push(values.last().unwrap() * 1.002);
        }
        for _ in 0..10 {
            values.push(values.last().unwrap() * 0.995);
        }
        for _ in 0..50 {
            values.push(values.last().unwrap() * 1.002);
        }
        let s = sortino_ratio(&curve(&values));
        assert!(s > 0.0, "Sortino should be positive, got {s}");
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_known_value() {
        let eq = curve(&[100_000.0, 110_000.0, 90_000.0, 95_000.0]);
        let expected = (110_000.0 - 90_000.0) / 110_000.0;
        assert!((max_drawdown(&eq) - expected).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_increase_is_zero() {
        let values: Vec<f64> = (0..100).map(|i| 100_000.0 + i as f64 * 100.0).collect();
        assert_eq!(max_drawdown(&curve(&values)), 0.0);
    }

    // ── Win rate / profit factor ──

    #[test]
    fn win_rate_mixed() {
        let trades = vec![trade(500.0), trade(-200.0), trade(300.0), trade(-100.0)];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_mixed() {
        let trades = vec![trade(500.0), trade(-200.0), trade(300.0)];
        assert!((profit_factor(&trades) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_no_losses_is_the_infinity_sentinel() {
        let trades = vec![trade(500.0), trade(300.0)];
        assert!(profit_factor(&trades).is_infinite());
    }

    #[test]
    fn profit_factor_no_trades_is_zero() {
        assert_eq!(profit_factor(&[]), 0.0);
        let all_losers = vec![trade(-500.0)];
        assert_eq!(profit_factor(&all_losers), 0.0);
    }

    // ── Aggregate ──

    #[test]
    fn compute_with_no_trades_is_finite() {
        let eq = curve(&[100_000.0; 60]);
        let m = PerformanceMetrics::compute(&eq, &[], 100_000.0);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert!(m.cagr.is_finite());
        assert!(m.max_drawdown.is_finite());
    }

    #[test]
    fn compute_aggregates_trade_stats() {
        let mut values = vec![100_000.0];
        for i in 1..120 {
            let r = if i % 3 == 0 { 0.999 } else { 1.002 };
            values.push(values[i - 1] * r);
        }
        let trades = vec![trade(500.0), trade(-200.0), trade(300.0)];
        let m = PerformanceMetrics::compute(&curve(&values), &trades, 100_000.0);

        assert_eq!(m.trade_count, 3);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 1);
        assert!((m.win_rate - 2.0 / 3.0).abs() < 1e-10);
        assert!((m.avg_win - 400.0).abs() < 1e-10);
        assert!((m.avg_loss - (-200.0)).abs() < 1e-10);
        assert!((m.avg_holding_days - 5.0).abs() < 1e-10);
        assert!(m.sharpe > 0.0);
        assert!(m.sortino > 0.0);
        assert!(m.total_return > 0.0);
    }
}
