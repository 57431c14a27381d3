//! Serializable backtest configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use varlab_core::engine::SimulatorConfig;
use varlab_core::replication::ReplicationConfig;
use varlab_core::signals::SignalConfig;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Metrics engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Annual risk-free rate subtracted from daily returns.
    pub risk_free_rate: f64,
    /// Trading days per year; the Sharpe annualization factor is its
    /// square root.
    pub annualization_days: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            annualization_days: 252.0,
        }
    }
}

/// Complete configuration for a single backtest run.
///
/// Captures every parameter needed to reproduce the run: the expiry to
/// trade, replication settings, signal settings, simulator settings, and
/// metrics settings. Loads from TOML; all sections default independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Expiry whose quote history is backtested.
    pub expiry: NaiveDate,
    #[serde(default)]
    pub replication: ReplicationConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl BacktestConfig {
    pub fn new(expiry: NaiveDate) -> Self {
        Self {
            expiry,
            replication: ReplicationConfig::default(),
            signal: SignalConfig::default(),
            simulator: SimulatorConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Deterministic hash id for this configuration.
    ///
    /// Two runs with identical configs share a RunId, which makes sweep
    /// results and exported artifacts content-addressable.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
