//! Backtest runner — wires together replication, signals, simulation,
//! and metrics for one expiry's quote history.
//!
//! Two entry points:
//! - `run_backtest()`: one expiry, one configuration.
//! - `run_batch()`: every expiry in a quote table against the same base
//!   configuration; a fatal error in one expiry's pipeline never aborts
//!   its siblings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use varlab_core::domain::{Signal, VarianceSeries};
use varlab_core::engine::{simulate, SimulationError, SimulationResult};
use varlab_core::replication::{build_series, ReplicationError, SkippedDate};
use varlab_core::signals::generate_signals;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{LoadError, LoadedQuotes};
use crate::metrics::MetricsReport;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("replication error: {0}")]
    Replication(#[from] ReplicationError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("expiry {0} not found in quote table")]
    ExpiryNotFound(NaiveDate),
    #[error("expiry {expiry}: no usable quote dates ({skipped} skipped)")]
    NoUsableDates { expiry: NaiveDate, skipped: usize },
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRunResult {
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub series: VarianceSeries,
    pub skipped_dates: Vec<SkippedDate>,
    pub signals: Vec<Signal>,
    pub simulation: SimulationResult,
    pub report: MetricsReport,
}

/// Run the full pipeline for the expiry named in the configuration.
pub fn run_backtest(
    quotes: &LoadedQuotes,
    config: &BacktestConfig,
) -> Result<BacktestRunResult, RunError> {
    let ladders = quotes
        .ladders_for(config.expiry)
        .ok_or(RunError::ExpiryNotFound(config.expiry))?;

    let (series, skipped_dates) = build_series(ladders, &config.replication)?;
    if series.is_empty() {
        return Err(RunError::NoUsableDates {
            expiry: config.expiry,
            skipped: skipped_dates.len(),
        });
    }

    let signals = generate_signals(&series, &config.signal);
    let simulation = simulate(quotes.calendar(), &series, &signals, &config.simulator)?;
    let report = MetricsReport::compute(&simulation, &series, &config.metrics);

    Ok(BacktestRunResult {
        run_id: config.run_id(),
        config: config.clone(),
        series,
        skipped_dates,
        signals,
        simulation,
        report,
    })
}

/// Run every expiry in the table against the same base configuration.
///
/// Each expiry gets an independent pipeline; errors are returned per
/// expiry rather than propagated, so one bad chain cannot poison a batch.
pub fn run_batch(
    quotes: &LoadedQuotes,
    base: &BacktestConfig,
) -> Vec<(NaiveDate, Result<BacktestRunResult, RunError>)> {
    quotes
        .expiries()
        .into_iter()
        .map(|expiry| {
            let config = BacktestConfig {
                expiry,
                ..base.clone()
            };
            (expiry, run_backtest(quotes, &config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{generate_surface, SyntheticConfig};

    fn synthetic_quotes() -> LoadedQuotes {
        let records = generate_surface(&SyntheticConfig::default());
        LoadedQuotes::from_records(records).unwrap()
    }

    #[test]
    fn synthetic_run_produces_finite_report() {
        let quotes = synthetic_quotes();
        let expiry = quotes.expiries()[0];
        let result = run_backtest(&quotes, &BacktestConfig::new(expiry)).unwrap();

        assert_eq!(result.signals.len(), result.series.len());
        assert_eq!(result.simulation.ledger.len(), quotes.calendar().len());
        assert!(result.report.final_nav.is_finite());
        assert!(result.report.max_drawdown <= 0.0);
    }

    #[test]
    fn run_is_reproducible() {
        let quotes = synthetic_quotes();
        let expiry = quotes.expiries()[0];
        let config = BacktestConfig::new(expiry);
        let a = serde_json::to_string(&run_backtest(&quotes, &config).unwrap()).unwrap();
        let b = serde_json::to_string(&run_backtest(&quotes, &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_expiry_is_an_error() {
        let quotes = synthetic_quotes();
        let bogus = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let result = run_backtest(&quotes, &BacktestConfig::new(bogus));
        assert!(matches!(result, Err(RunError::ExpiryNotFound(_))));
    }

    #[test]
    fn batch_covers_every_expiry() {
        let quotes = synthetic_quotes();
        let base = BacktestConfig::new(quotes.expiries()[0]);
        let results = run_batch(&quotes, &base);
        assert_eq!(results.len(), quotes.expiries().len());
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }
}
