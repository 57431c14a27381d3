//! VarLab CLI — synth, run, and sweep commands.
//!
//! Commands:
//! - `synth` — generate a seeded synthetic quote CSV for demos
//! - `run` — execute one backtest from a TOML config (or defaults) and
//!   save artifacts
//! - `sweep` — grid-search signal parameters and print a leaderboard

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use varlab_runner::config::BacktestConfig;
use varlab_runner::data_loader::load_quotes_csv;
use varlab_runner::export::save_artifacts;
use varlab_runner::runner::run_backtest;
use varlab_runner::sweep::{sweep, ParamGrid};
use varlab_runner::synthetic::{generate_surface, SyntheticConfig};

#[derive(Parser)]
#[command(
    name = "varlab",
    about = "VarLab CLI — variance replication backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic option quote CSV.
    Synth {
        /// Output CSV path.
        #[arg(long, default_value = "data/synthetic_quotes.csv")]
        output: PathBuf,

        /// RNG seed.
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Number of quote days to emit.
        #[arg(long, default_value_t = 120)]
        days: usize,
    },
    /// Execute one backtest and save artifacts.
    Run {
        /// Quote CSV path.
        #[arg(long)]
        quotes: PathBuf,

        /// Path to a TOML config file. Defaults apply if omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Expiry (YYYY-MM-DD). Required unless set in the config file.
        #[arg(long)]
        expiry: Option<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Grid-search signal parameters and print a leaderboard.
    Sweep {
        /// Quote CSV path.
        #[arg(long)]
        quotes: PathBuf,

        /// Expiry (YYYY-MM-DD).
        #[arg(long)]
        expiry: String,

        /// EMA spans to test, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "5,10,20")]
        ema_spans: Vec<usize>,

        /// Lookback windows to test, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "5,10,20")]
        lookbacks: Vec<usize>,

        /// Band multipliers to test, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "1.0,1.5,2.0")]
        band_multipliers: Vec<f64>,

        /// How many leaderboard rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Synth { output, seed, days } => cmd_synth(output, seed, days),
        Commands::Run {
            quotes,
            config,
            expiry,
            output_dir,
        } => cmd_run(quotes, config, expiry, output_dir),
        Commands::Sweep {
            quotes,
            expiry,
            ema_spans,
            lookbacks,
            band_multipliers,
            top,
        } => cmd_sweep(quotes, expiry, ema_spans, lookbacks, band_multipliers, top),
    }
}

fn parse_expiry(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("bad expiry '{value}', expected YYYY-MM-DD"))
}

fn cmd_synth(output: PathBuf, seed: u64, days: usize) -> Result<()> {
    let config = SyntheticConfig {
        seed,
        n_days: days,
        ..SyntheticConfig::default()
    };
    let records = generate_surface(&config);

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(&output)?;
    writer.write_record([
        "QUOTE_DATE",
        "EXPIRE_DATE",
        "STRIKE",
        "UNDERLYING_LAST",
        "C_BID",
        "C_ASK",
        "P_BID",
        "P_ASK",
    ])?;
    let fmt = |v: Option<f64>| v.map_or(String::new(), |x| x.to_string());
    for r in &records {
        writer.write_record([
            r.date.to_string(),
            r.expiry.to_string(),
            r.strike.to_string(),
            r.underlying_price.to_string(),
            fmt(r.call_bid),
            fmt(r.call_ask),
            fmt(r.put_bid),
            fmt(r.put_ask),
        ])?;
    }
    writer.flush()?;

    println!(
        "Wrote {} quotes for expiry {} to {}",
        records.len(),
        config.expiry,
        output.display()
    );
    Ok(())
}

fn cmd_run(
    quotes_path: PathBuf,
    config_path: Option<PathBuf>,
    expiry: Option<String>,
    output_dir: PathBuf,
) -> Result<()> {
    let quotes = load_quotes_csv(&quotes_path)
        .with_context(|| format!("loading {}", quotes_path.display()))?;

    let mut config = match config_path {
        Some(path) => BacktestConfig::from_toml_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let Some(expiry) = expiry.as_deref() else {
                bail!("either --config or --expiry is required");
            };
            BacktestConfig::new(parse_expiry(expiry)?)
        }
    };
    if let Some(expiry) = expiry.as_deref() {
        config.expiry = parse_expiry(expiry)?;
    }

    let result = run_backtest(&quotes, &config)?;
    let run_dir = save_artifacts(&output_dir, &result)?;

    let report = &result.report;
    println!("Run {}", result.run_id);
    println!("  expiry:        {}", config.expiry);
    println!("  observations:  {}", result.series.len());
    println!("  skipped dates: {}", result.skipped_dates.len());
    println!("  trades:        {}", report.trade_count);
    println!("  final NAV:     {:.6}", report.final_nav);
    println!("  sharpe:        {}", fmt_opt(report.sharpe));
    println!("  sortino:       {}", fmt_opt(report.sortino));
    println!("  max drawdown:  {:.4}", report.max_drawdown);
    println!("  half-life:     {}", fmt_opt(report.mean_reversion_half_life));
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn cmd_sweep(
    quotes_path: PathBuf,
    expiry: String,
    ema_spans: Vec<usize>,
    lookbacks: Vec<usize>,
    band_multipliers: Vec<f64>,
    top: usize,
) -> Result<()> {
    let quotes = load_quotes_csv(&quotes_path)
        .with_context(|| format!("loading {}", quotes_path.display()))?;
    let base = BacktestConfig::new(parse_expiry(&expiry)?);
    let grid = ParamGrid {
        ema_spans,
        lookbacks,
        band_multipliers,
    };

    println!("Sweeping {} configurations...", grid.size());
    let results = sweep(&quotes, &grid, &base);

    for err in results.failures() {
        eprintln!("Error: {err}");
    }

    println!(
        "{:<6} {:<10} {:<6} {:<10} {:>10} {:>10} {:>8}",
        "span", "lookback", "k", "sharpe", "final_nav", "max_dd", "trades"
    );
    println!("{}", "-".repeat(66));
    for result in results.top_n(top) {
        let signal = &result.config.signal;
        let span = match signal.smoothing {
            varlab_core::signals::Smoothing::Span { span } => span.to_string(),
            varlab_core::signals::Smoothing::HalfLife { half_life } => format!("hl={half_life}"),
        };
        println!(
            "{:<6} {:<10} {:<6} {:<10} {:>10.6} {:>10.4} {:>8}",
            span,
            signal.lookback,
            signal.band_multiplier,
            fmt_opt(result.report.sharpe),
            result.report.final_nav,
            result.report.max_drawdown,
            result.report.trade_count
        );
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| format!("{v:.4}"))
}
