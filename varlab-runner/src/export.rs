//! Artifact export — immutable run outputs serialized for inspection.
//!
//! The core hands over value records; this module decides the formats:
//! CSV for the tabular series (variance, signals, NAV, skipped dates)
//! and pretty JSON for the metrics report and run manifest.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::runner::BacktestRunResult;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write all artifacts for one run under `<output_dir>/<run_id>/`.
///
/// Returns the run directory. Layout:
/// - `variance.csv` — the replicated series
/// - `signals.csv` — one row per observation with band levels
/// - `nav.csv` — the daily ledger
/// - `skipped.csv` — dates the replicator skipped, with reasons
/// - `report.json` — the metrics report plus config and run id
pub fn save_artifacts(
    output_dir: &Path,
    result: &BacktestRunResult,
) -> Result<PathBuf, ExportError> {
    let run_dir = output_dir.join(&result.run_id);
    fs::create_dir_all(&run_dir)?;

    write_variance_csv(&run_dir.join("variance.csv"), result)?;
    write_signals_csv(&run_dir.join("signals.csv"), result)?;
    write_nav_csv(&run_dir.join("nav.csv"), result)?;
    write_skipped_csv(&run_dir.join("skipped.csv"), result)?;
    write_report_json(&run_dir.join("report.json"), result)?;

    Ok(run_dir)
}

fn write_variance_csv(path: &Path, result: &BacktestRunResult) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "date",
        "expiry",
        "time_to_expiry_years",
        "implied_variance",
        "implied_vol",
        "n_options",
    ])?;
    for obs in result.series.observations() {
        writer.write_record([
            obs.date.to_string(),
            obs.expiry.to_string(),
            obs.time_to_expiry_years.to_string(),
            obs.implied_variance.to_string(),
            obs.implied_vol().to_string(),
            obs.n_options.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_signals_csv(path: &Path, result: &BacktestRunResult) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "date",
        "action",
        "reference_variance",
        "center",
        "upper",
        "lower",
    ])?;
    for signal in &result.signals {
        let band = signal.band_state;
        let fmt = |v: Option<f64>| v.map_or(String::new(), |x| x.to_string());
        writer.write_record([
            signal.date.to_string(),
            format!("{:?}", signal.action),
            signal.reference_variance.to_string(),
            fmt(band.map(|b| b.center)),
            fmt(band.map(|b| b.upper)),
            fmt(band.map(|b| b.lower)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_nav_csv(path: &Path, result: &BacktestRunResult) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "cash", "unrealized_pnl", "realized_pnl", "nav"])?;
    for point in result.simulation.ledger.points() {
        writer.write_record([
            point.date.to_string(),
            point.cash.to_string(),
            point.unrealized_pnl.to_string(),
            point.realized_pnl.to_string(),
            point.nav.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_skipped_csv(path: &Path, result: &BacktestRunResult) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "reason"])?;
    for skipped in &result.skipped_dates {
        writer.write_record([skipped.date.to_string(), skipped.reason.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_report_json(path: &Path, result: &BacktestRunResult) -> Result<(), ExportError> {
    let manifest = serde_json::json!({
        "run_id": result.run_id,
        "config": result.config,
        "report": result.report,
        "trades": result.simulation.trades,
        "ignored_entries": result.simulation.ignored_entries,
        "skipped_dates": result.skipped_dates.len(),
    });
    fs::write(path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestConfig;
    use crate::data_loader::LoadedQuotes;
    use crate::runner::run_backtest;
    use crate::synthetic::{generate_surface, SyntheticConfig};

    #[test]
    fn artifacts_are_written_and_parse_back() {
        let records = generate_surface(&SyntheticConfig {
            n_days: 40,
            ..SyntheticConfig::default()
        });
        let quotes = LoadedQuotes::from_records(records).unwrap();
        let config = BacktestConfig::new(quotes.expiries()[0]);
        let result = run_backtest(&quotes, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(dir.path(), &result).unwrap();

        for file in ["variance.csv", "signals.csv", "nav.csv", "skipped.csv", "report.json"] {
            assert!(run_dir.join(file).exists(), "missing {file}");
        }

        // NAV rows cover every calendar date plus the header.
        let nav = fs::read_to_string(run_dir.join("nav.csv")).unwrap();
        assert_eq!(nav.lines().count(), quotes.calendar().len() + 1);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(run_dir.join("report.json")).unwrap())
                .unwrap();
        assert_eq!(report["run_id"], serde_json::json!(result.run_id));
        assert!(report["report"]["final_nav"].is_number());
    }
}
