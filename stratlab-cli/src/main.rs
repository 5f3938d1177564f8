//! StratLab CLI — run, sweep, and demo commands.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config over CSV bar files
//! - `sweep` — run the parameter optimizer over the same inputs
//! - `demo` — run against seeded synthetic data, no files needed

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use stratlab_core::domain::{Bar, MarketData};
use stratlab_runner::synthetic::{random_walk_bars, SyntheticSeries};
use stratlab_runner::{
    optimize, run_single_backtest, BacktestRunResult, ComboOutcome, OptimizerConfig, ParamGrid,
    RankingMetric, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "stratlab",
    about = "StratLab CLI — multi-strategy composite signal backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single backtest from a TOML config file.
    Run {
        /// Path to a TOML run config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV bar files, one per symbol (symbol taken from the file stem).
        #[arg(required = true)]
        data: Vec<PathBuf>,

        /// Write the full result JSON here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Sweep the parameter grid and print the leaderboard.
    Sweep {
        /// Path to a TOML run config used as the sweep base.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV bar files, one per symbol.
        #[arg(required = true)]
        data: Vec<PathBuf>,

        /// Metric that orders the leaderboard.
        #[arg(long, value_enum, default_value = "sharpe")]
        metric: MetricArg,

        /// Per-combination timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// How many leaderboard rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Run a backtest over seeded synthetic data (no input files needed).
    Demo {
        /// Number of synthetic symbols.
        #[arg(long, default_value_t = 3)]
        symbols: usize,

        /// Bars per symbol.
        #[arg(long, default_value_t = 500)]
        bars: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Sharpe,
    Sortino,
    TotalReturn,
    Cagr,
    ProfitFactor,
    WinRate,
}

impl From<MetricArg> for RankingMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Sharpe => RankingMetric::Sharpe,
            MetricArg::Sortino => RankingMetric::Sortino,
            MetricArg::TotalReturn => RankingMetric::TotalReturn,
            MetricArg::Cagr => RankingMetric::Cagr,
            MetricArg::ProfitFactor => RankingMetric::ProfitFactor,
            MetricArg::WinRate => RankingMetric::WinRate,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, data, output } => {
            let config = load_config(config.as_deref())?;
            let market = load_market(&data)?;
            let result = run_single_backtest(&config, &market)?;
            print_summary(&result);
            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing result to {}", path.display()))?;
                println!("\nresult written to {}", path.display());
            }
            Ok(())
        }
        Commands::Sweep {
            config,
            data,
            metric,
            timeout_secs,
            top,
        } => {
            let config = load_config(config.as_deref())?;
            let market = load_market(&data)?;
            let opts = OptimizerConfig {
                metric: metric.into(),
                run_timeout: timeout_secs.map(std::time::Duration::from_secs),
                ..Default::default()
            };
            let report = optimize(&market, &config, &ParamGrid::standard(), &opts);
            print_leaderboard(&report, top);
            Ok(())
        }
        Commands::Demo { symbols, bars, seed } => {
            if symbols == 0 {
                bail!("--symbols must be at least 1");
            }
            let spec = SyntheticSeries::default().with_len(bars);
            let universe: HashMap<String, Vec<Bar>> = (0..symbols)
                .map(|i| {
                    let symbol = format!("SYN{i:02}");
                    let bars = random_walk_bars(&symbol, &spec, seed + i as u64);
                    (symbol, bars)
                })
                .collect();
            let market = MarketData::new(universe)?;
            let result = run_single_backtest(&RunConfig::default(), &market)?;
            print_summary(&result);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(RunConfig::from_toml_str(&raw)?)
        }
        None => Ok(RunConfig::default()),
    }
}

/// One row of a bar CSV: date,open,high,low,close,volume.
#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

fn load_market(paths: &[PathBuf]) -> Result<MarketData> {
    let mut universe: HashMap<String, Vec<Bar>> = HashMap::new();
    for path in paths {
        let symbol = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_uppercase)
            .with_context(|| format!("deriving symbol from {}", path.display()))?;
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut bars = Vec::new();
        for row in reader.deserialize() {
            let row: CsvBar = row.with_context(|| format!("parsing {}", path.display()))?;
            bars.push(Bar {
                symbol: symbol.clone(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        if bars.is_empty() {
            bail!("{} contains no bars", path.display());
        }
        universe.insert(symbol, bars);
    }
    Ok(MarketData::new(universe)?)
}

fn print_summary(result: &BacktestRunResult) {
    let m = &result.metrics;
    println!("run {}", &result.run_id[..12]);
    println!("  bars            {}", result.report.bar_count);
    println!("  trades          {}", m.trade_count);
    println!("  total return    {:+.2}%", m.total_return * 100.0);
    println!("  CAGR            {:+.2}%", m.cagr * 100.0);
    println!("  Sharpe          {:.2}", m.sharpe);
    println!("  Sortino         {:.2}", m.sortino);
    println!("  max drawdown    {:.2}%", m.max_drawdown * 100.0);
    println!("  win rate        {:.1}%", m.win_rate * 100.0);
    if m.profit_factor.is_infinite() {
        println!("  profit factor   inf (no losing trades)");
    } else {
        println!("  profit factor   {:.2}", m.profit_factor);
    }
    if let Some(date) = result.report.halted_on {
        println!("  drawdown halt   {date}");
    }
    if result.report.skipped_entries > 0 {
        println!("  skipped entries {}", result.report.skipped_entries);
    }
}

fn print_leaderboard(report: &stratlab_runner::OptimizationReport, top: usize) {
    println!(
        "{} combinations, {} failed/timed out; ranked by {:?}",
        report.results.len(),
        report.failed_count(),
        report.metric
    );
    println!(
        "{:<14} {:>5} {:>5} {:>4} {:>5} {:>8} {:>8}",
        "combo", "emaS", "emaL", "stP", "stM", "score", "trades"
    );
    for result in report.results.iter().take(top) {
        let c = &result.combination;
        match &result.outcome {
            ComboOutcome::Completed { metrics } => {
                println!(
                    "{:<14} {:>5} {:>5} {:>4} {:>5.1} {:>8.3} {:>8}",
                    &result.combo_id[..12],
                    c.ema_short,
                    c.ema_long,
                    c.supertrend_period,
                    c.supertrend_multiplier,
                    report.metric.extract(metrics),
                    metrics.trade_count,
                );
            }
            ComboOutcome::TimedOut => {
                println!("{:<14} timed out", &result.combo_id[..12]);
            }
            ComboOutcome::Failed { reason } => {
                println!("{:<14} failed: {reason}", &result.combo_id[..12]);
            }
        }
    }
}
