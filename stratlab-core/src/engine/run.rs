//! The bar-by-bar event loop.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::domain::{
    Bar, Classification, CompositeSignal, EquityPoint, ExitReason, MarketData, PortfolioState,
    Position, PositionSide, Trade,
};
use crate::error::EngineError;
use crate::indicators::{Indicator, IndicatorSet};
use crate::scorer::MultiStrategyScorer;
use crate::strategies::Strategy;

use super::config::BacktestConfig;
use super::report::BacktestReport;

/// Run a backtest over pre-loaded market data.
///
/// Deterministic: identical inputs produce identical trade logs and equity
/// curves. Strictly sequential — position mutation and equity accumulation
/// carry bar-to-bar state.
pub fn run_backtest(
    data: &MarketData,
    strategies: &[Box<dyn Strategy>],
    scorer: &MultiStrategyScorer,
    config: &BacktestConfig,
) -> Result<BacktestReport, EngineError> {
    run_backtest_with_deadline(data, strategies, scorer, config, None)
}

/// Like [`run_backtest`], with an optional wall-clock deadline checked once
/// per bar. The optimizer uses this for per-combination timeouts; an expired
/// run returns `EngineError::DeadlineExceeded` without touching any state
/// outside itself.
pub fn run_backtest_with_deadline(
    data: &MarketData,
    strategies: &[Box<dyn Strategy>],
    scorer: &MultiStrategyScorer,
    config: &BacktestConfig,
    deadline: Option<Instant>,
) -> Result<BacktestReport, EngineError> {
    config.validate()?;

    let warmup_bars = strategies.iter().map(|s| s.warmup_bars()).max().unwrap_or(0);
    let n = data.len();
    // At least one bar to signal on and one to fill on after warm-up.
    let needed = warmup_bars + 2;
    if n < needed {
        return Err(EngineError::InsufficientData { needed, got: n });
    }

    // Precompute every indicator any strategy needs, once per symbol.
    let indicator_sets: HashMap<&str, IndicatorSet> = data
        .symbols()
        .iter()
        .map(|symbol| {
            let requirements: Vec<Box<dyn Indicator>> = strategies
                .iter()
                .flat_map(|s| s.required_indicators())
                .collect();
            let series = data.series(symbol).expect("symbol from its own listing");
            (symbol.as_str(), IndicatorSet::compute_all(series, &requirements))
        })
        .collect();

    let mut portfolio = PortfolioState::new(config.initial_capital);
    let mut trades: Vec<Trade> = Vec::new();
    let mut signal_log: Vec<CompositeSignal> = Vec::new();
    let mut skipped_entries = 0usize;
    let mut halted_on: Option<NaiveDate> = None;
    // Composite signals from the previous bar: this bar's entry candidates.
    let mut pending: HashMap<String, CompositeSignal> = HashMap::new();

    for t in 0..n {
        if let Some(limit) = deadline {
            if Instant::now() >= limit {
                return Err(EngineError::DeadlineExceeded { bars_processed: t });
            }
        }
        let date = data.dates()[t];

        // Evaluate all strategies and the scorer at this bar's close.
        let mut current: HashMap<String, CompositeSignal> = HashMap::new();
        for symbol in data.symbols() {
            let series = data.series(symbol).expect("symbol from its own listing");
            let series_index = data
                .series_index(symbol, t)
                .expect("axis slot within series");
            let indicators = &indicator_sets[symbol.as_str()];
            let signals: Vec<_> = strategies
                .iter()
                .filter_map(|s| s.evaluate(series, series_index, indicators))
                .collect();
            let composite = scorer.score(symbol, date, &signals, strategies.len());
            current.insert(symbol.clone(), composite);
        }

        // ─── Phase 1: exit pass ───
        let mut exits: Vec<(String, f64, ExitReason)> = Vec::new();
        for (symbol, position) in &portfolio.positions {
            let bar = data.bar(symbol, t).expect("axis slot within series");
            if position.stop_hit(bar.low, bar.high) {
                exits.push((symbol.clone(), position.stop_price, ExitReason::StopLoss));
            } else if position.target_hit(bar.low, bar.high) {
                exits.push((symbol.clone(), position.target_price, ExitReason::TakeProfit));
            } else if date >= position.deadline {
                exits.push((symbol.clone(), bar.close, ExitReason::MaxHolding));
            } else if current
                .get(symbol)
                .is_some_and(|c| reversal_against(position.side, c, config))
            {
                exits.push((symbol.clone(), bar.close, ExitReason::SignalReversal));
            }
        }
        for (symbol, raw_price, reason) in exits {
            close_position(
                &mut portfolio,
                &mut trades,
                &symbol,
                date,
                raw_price,
                reason,
                config,
            );
        }

        // ─── Phase 2: drawdown check ───
        let equity = mark_equity(&portfolio, data, t);
        let drawdown = portfolio.update_drawdown(equity);
        if !portfolio.halted && drawdown * 100.0 > config.max_portfolio_drawdown {
            portfolio.halted = true;
            halted_on = Some(date);
            warn!(
                %date,
                drawdown_pct = drawdown * 100.0,
                limit_pct = config.max_portfolio_drawdown,
                "max portfolio drawdown breached; entries halted, exits continue"
            );
        }

        // ─── Phase 3: entry pass ───
        // Candidates are the previous bar's composites, filled at this bar's
        // open. Capital freed by this bar's exits is already back in cash.
        if !portfolio.halted {
            let mut candidates: Vec<&CompositeSignal> = pending
                .values()
                .filter(|c| {
                    c.confidence >= config.min_signal_confidence
                        && c.composite_score.abs() >= config.min_composite_score
                        && entry_side(c.classification, config).is_some()
                        && !portfolio.has_position(&c.symbol)
                })
                .collect();
            candidates.sort_by(|a, b| {
                b.composite_score
                    .abs()
                    .partial_cmp(&a.composite_score.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.symbol.cmp(&b.symbol))
            });

            // All entries on one bar size against the same post-exit equity.
            let sizing_equity = mark_equity(&portfolio, data, t);
            for candidate in candidates {
                if portfolio.open_count() >= config.max_positions {
                    break;
                }
                let side = entry_side(candidate.classification, config)
                    .expect("filtered to actionable classifications");
                let bar = data
                    .bar(&candidate.symbol, t)
                    .expect("axis slot within series");
                if !open_position(&mut portfolio, bar, t, side, candidate, sizing_equity, config) {
                    skipped_entries += 1;
                }
            }
        }

        // ─── Terminal bar: flatten everything at the close ───
        if t == n - 1 {
            let open_symbols: Vec<String> = portfolio.positions.keys().cloned().collect();
            for symbol in open_symbols {
                let close = data.bar(&symbol, t).expect("axis slot within series").close;
                close_position(
                    &mut portfolio,
                    &mut trades,
                    &symbol,
                    date,
                    close,
                    ExitReason::EndOfRun,
                    config,
                );
            }
        }

        // ─── Phase 4: mark to market ───
        debug_assert!(
            portfolio.cash >= -1e-9,
            "cash went negative at bar {t}: {}",
            portfolio.cash
        );
        debug_assert!(
            portfolio.open_count() <= config.max_positions,
            "position cap violated at bar {t}"
        );
        let equity = mark_equity(&portfolio, data, t);
        portfolio.update_drawdown(equity);
        portfolio.equity_curve.push(EquityPoint { date, equity });

        for symbol in data.symbols() {
            if let Some(composite) = current.get(symbol) {
                if !composite.classification.is_none() {
                    signal_log.push(composite.clone());
                }
            }
        }
        pending = current;
    }

    debug_assert!(portfolio.positions.is_empty(), "end-of-run must flatten");

    Ok(BacktestReport {
        trades,
        equity_curve: portfolio.equity_curve,
        signals: signal_log,
        initial_capital: config.initial_capital,
        bar_count: n,
        warmup_bars,
        halted_on,
        skipped_entries,
    })
}

/// Equity with all open positions marked at bar t's close.
fn mark_equity(portfolio: &PortfolioState, data: &MarketData, t: usize) -> f64 {
    portfolio.equity(|symbol| data.bar(symbol, t).map(|b| b.close))
}

/// Which side a classification opens, honoring the short-selling flag.
fn entry_side(classification: Classification, config: &BacktestConfig) -> Option<PositionSide> {
    if classification.is_buy() {
        Some(PositionSide::Long)
    } else if classification.is_sell() && config.allow_short_selling {
        Some(PositionSide::Short)
    } else {
        None
    }
}

/// Whether the composite signal has reversed hard against an open position.
fn reversal_against(
    side: PositionSide,
    composite: &CompositeSignal,
    config: &BacktestConfig,
) -> bool {
    if composite.confidence < config.min_signal_confidence {
        return false;
    }
    let score = composite.composite_score;
    match side {
        PositionSide::Long => score <= -config.reversal_confirmation,
        PositionSide::Short => score >= config.reversal_confirmation,
    }
}

/// Open a position at this bar's open. Returns false when the entry was
/// skipped for lack of cash (a capital-constraint violation, logged and
/// counted, never fatal).
fn open_position(
    portfolio: &mut PortfolioState,
    bar: &Bar,
    bar_index: usize,
    side: PositionSide,
    candidate: &CompositeSignal,
    sizing_equity: f64,
    config: &BacktestConfig,
) -> bool {
    let slip = config.slippage_percent / 100.0;
    let fill_price = match side {
        PositionSide::Long => bar.open * (1.0 + slip),
        PositionSide::Short => bar.open * (1.0 - slip),
    };
    if fill_price <= 0.0 || !fill_price.is_finite() {
        return true; // unpriceable bar; nothing to do, not a capital issue
    }

    let target_value = sizing_equity * config.position_size_percent / 100.0;
    let quantity = (target_value / fill_price).floor();
    if quantity < 1.0 {
        debug!(symbol = %bar.symbol, "position size rounds to zero shares; skipping");
        return true;
    }

    let notional = fill_price * quantity;
    let commission = notional * config.commission_percent / 100.0;
    let cost = notional + commission;
    if cost > portfolio.cash {
        warn!(
            symbol = %bar.symbol,
            date = %bar.date,
            cost,
            cash = portfolio.cash,
            "entry skipped: insufficient cash"
        );
        return false;
    }

    let sl = config.stop_loss_percent / 100.0;
    let tp = config.take_profit_percent / 100.0;
    let (stop_price, target_price) = match side {
        PositionSide::Long => (fill_price * (1.0 - sl), fill_price * (1.0 + tp)),
        PositionSide::Short => (fill_price * (1.0 + sl), fill_price * (1.0 - tp)),
    };

    portfolio.cash -= cost;
    portfolio.positions.insert(
        bar.symbol.clone(),
        Position {
            symbol: bar.symbol.clone(),
            side,
            entry_bar: bar_index,
            entry_date: bar.date,
            entry_price: fill_price,
            quantity,
            entry_commission: commission,
            stop_price,
            target_price,
            deadline: bar.date + Duration::days(config.max_holding_days),
            entry_score: candidate.composite_score,
        },
    );
    debug!(
        symbol = %bar.symbol,
        date = %bar.date,
        ?side,
        fill_price,
        quantity,
        score = candidate.composite_score,
        "opened position"
    );
    true
}

/// Close a position at `raw_price` adjusted for slippage, book commission,
/// append the trade, release capital to cash.
fn close_position(
    portfolio: &mut PortfolioState,
    trades: &mut Vec<Trade>,
    symbol: &str,
    date: NaiveDate,
    raw_price: f64,
    reason: ExitReason,
    config: &BacktestConfig,
) {
    let Some(position) = portfolio.positions.remove(symbol) else {
        return;
    };

    let slip = config.slippage_percent / 100.0;
    let exit_price = match position.side {
        PositionSide::Long => raw_price * (1.0 - slip),
        PositionSide::Short => raw_price * (1.0 + slip),
    };

    let gross_pnl = position.gross_pnl(exit_price);
    let exit_commission = exit_price * position.quantity * config.commission_percent / 100.0;
    let entry_notional = position.entry_price * position.quantity;

    portfolio.cash += entry_notional + gross_pnl - exit_commission;

    let pnl = gross_pnl - position.entry_commission - exit_commission;
    let trade = Trade {
        symbol: symbol.to_string(),
        side: position.side,
        entry_date: position.entry_date,
        entry_price: position.entry_price,
        exit_date: date,
        exit_price,
        quantity: position.quantity,
        pnl,
        pnl_percent: pnl / entry_notional * 100.0,
        commission: position.entry_commission + exit_commission,
        holding_days: (date - position.entry_date).num_days(),
        exit_reason: reason,
    };
    debug!(
        symbol,
        %date,
        exit = %reason,
        pnl = trade.pnl,
        "closed position"
    );
    trades.push(trade);
}
