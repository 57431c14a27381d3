//! Parameter sweep utilities for grid search over signal settings.
//!
//! Each configuration runs on a read-only view of the quote table and
//! writes to its own result — no shared mutable state, so the grid fans
//! out across Rayon workers.

use rayon::prelude::*;

use varlab_core::signals::Smoothing;

use crate::config::BacktestConfig;
use crate::runner::{run_backtest, BacktestRunResult, RunError};
use crate::data_loader::LoadedQuotes;

/// Parameter grid specification.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    /// EMA spans to test.
    pub ema_spans: Vec<usize>,
    /// Rolling std lookback windows to test.
    pub lookbacks: Vec<usize>,
    /// Band multipliers to test.
    pub band_multipliers: Vec<f64>,
}

impl ParamGrid {
    /// A small default grid around the reference parameters.
    pub fn standard() -> Self {
        Self {
            ema_spans: vec![5, 10, 20],
            lookbacks: vec![5, 10, 20],
            band_multipliers: vec![1.0, 1.5, 2.0],
        }
    }

    /// Total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.ema_spans.len() * self.lookbacks.len() * self.band_multipliers.len()
    }

    /// Generate all configurations, overriding the base signal settings.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &span in &self.ema_spans {
            for &lookback in &self.lookbacks {
                // A one-observation window has no standard deviation.
                if lookback < 2 {
                    continue;
                }
                for &k in &self.band_multipliers {
                    let mut config = base.clone();
                    config.signal.smoothing = Smoothing::Span { span };
                    config.signal.lookback = lookback;
                    config.signal.band_multiplier = k;
                    configs.push(config);
                }
            }
        }
        configs
    }
}

/// Run every configuration in the grid against one quote table.
///
/// Results keep grid order; use `SweepResults::sorted_by_sharpe` for the
/// leaderboard view.
pub fn sweep(
    quotes: &LoadedQuotes,
    grid: &ParamGrid,
    base: &BacktestConfig,
) -> SweepResults {
    let configs = grid.generate_configs(base);
    let results: Vec<Result<BacktestRunResult, RunError>> = configs
        .par_iter()
        .map(|config| run_backtest(quotes, config))
        .collect();
    SweepResults::new(results)
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<Result<BacktestRunResult, RunError>>,
}

impl SweepResults {
    fn new(results: Vec<Result<BacktestRunResult, RunError>>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Successful runs in grid order.
    pub fn successes(&self) -> Vec<&BacktestRunResult> {
        self.results.iter().filter_map(|r| r.as_ref().ok()).collect()
    }

    /// Failed runs with their errors.
    pub fn failures(&self) -> Vec<&RunError> {
        self.results.iter().filter_map(|r| r.as_ref().err()).collect()
    }

    /// Successful runs sorted by Sharpe descending; undefined Sharpe last.
    pub fn sorted_by_sharpe(&self) -> Vec<&BacktestRunResult> {
        let mut sorted = self.successes();
        sorted.sort_by(|a, b| match (a.report.sharpe, b.report.sharpe) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        sorted
    }

    /// Top N configurations by Sharpe.
    pub fn top_n(&self, n: usize) -> Vec<&BacktestRunResult> {
        self.sorted_by_sharpe().into_iter().take(n).collect()
    }

    /// The best configuration, if any run succeeded.
    pub fn best(&self) -> Option<&BacktestRunResult> {
        self.sorted_by_sharpe().into_iter().next()
    }
}
