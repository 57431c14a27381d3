//! VarLab Runner — everything around the core pipeline.
//!
//! Quote ingestion from CSV, TOML-serializable run configuration with
//! content-addressed run ids, the metrics engine, parameter sweeps,
//! synthetic quote surfaces for demos and tests, and artifact export.

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{BacktestConfig, ConfigError, MetricsConfig};
pub use data_loader::{load_quotes_csv, LoadError, LoadedQuotes};
pub use export::save_artifacts;
pub use metrics::MetricsReport;
pub use runner::{run_backtest, run_batch, BacktestRunResult, RunError};
pub use sweep::{ParamGrid, SweepResults};
pub use synthetic::{generate_surface, SyntheticConfig};
