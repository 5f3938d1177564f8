//! Serializable run configuration.
//!
//! A `RunConfig` captures everything needed to reproduce a run: engine
//! settings, enabled strategies with their parameters, and scorer
//! weights/thresholds. Loaded from TOML by the CLI, validated here — every
//! configuration failure happens before a simulation starts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::engine::BacktestConfig;
use stratlab_core::error::ConfigError;
use stratlab_core::scorer::ScorerConfig;
use stratlab_core::strategies::{EmaCrossover, Strategy, SupertrendStrategy, SwingStrategy};

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to parse run config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
    #[error("no strategies enabled — at least one strategy section is required")]
    NoStrategies,
}

/// Full configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub backtest: BacktestConfig,
    pub scorer: ScorerConfig,
    pub strategies: StrategiesConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestConfig::default(),
            scorer: ScorerConfig::default(),
            strategies: StrategiesConfig::default(),
        }
    }
}

/// Which strategies run, and with what parameters. A present section enables
/// the strategy; all three are on by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    pub ema_crossover: Option<EmaCrossoverParams>,
    pub supertrend: Option<SupertrendParams>,
    pub swing: Option<SwingParams>,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            ema_crossover: Some(EmaCrossoverParams::default()),
            supertrend: Some(SupertrendParams::default()),
            swing: Some(SwingParams::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaCrossoverParams {
    pub short_period: usize,
    pub long_period: usize,
    pub approach_threshold: f64,
}

impl Default for EmaCrossoverParams {
    fn default() -> Self {
        Self {
            short_period: 50,
            long_period: 200,
            approach_threshold: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupertrendParams {
    pub atr_period: usize,
    pub multiplier: f64,
}

impl Default for SupertrendParams {
    fn default() -> Self {
        Self {
            atr_period: 10,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingParams {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub ema_period: usize,
}

impl Default for SwingParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            ema_period: 20,
        }
    }
}

impl RunConfig {
    /// Parse and fully validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, RunConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section without building anything.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        self.backtest.validate()?;
        self.scorer.validate()?;
        // Strategy constructors hold the parameter rules; build and drop.
        let _ = self.build_strategies()?;
        Ok(())
    }

    /// Instantiate the enabled strategies.
    pub fn build_strategies(&self) -> Result<Vec<Box<dyn Strategy>>, RunConfigError> {
        let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
        if let Some(p) = &self.strategies.ema_crossover {
            strategies.push(Box::new(EmaCrossover::new(
                p.short_period,
                p.long_period,
                p.approach_threshold,
            )?));
        }
        if let Some(p) = &self.strategies.supertrend {
            strategies.push(Box::new(SupertrendStrategy::new(p.atr_period, p.multiplier)?));
        }
        if let Some(p) = &self.strategies.swing {
            strategies.push(Box::new(SwingStrategy::new(
                p.rsi_period,
                p.rsi_oversold,
                p.rsi_overbought,
                p.bollinger_period,
                p.bollinger_multiplier,
                p.ema_period,
            )?));
        }
        if strategies.is_empty() {
            return Err(RunConfigError::NoStrategies);
        }
        Ok(strategies)
    }

    /// Content-addressed run identifier: two identical configs share an ID.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).expect("RunConfig serializes");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
