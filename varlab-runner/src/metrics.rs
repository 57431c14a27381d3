//! Performance metrics — pure functions over the finished NAV ledger.
//!
//! Every metric is a pure function: ledger and/or variance series in,
//! scalar out. Metrics that can be undefined (zero return variance, an
//! AR(1) coefficient outside the unit interval) are `Option`s and
//! serialize as `null`; they are never errors.

use serde::{Deserialize, Serialize};

use varlab_core::domain::{NavLedger, VarianceSeries};
use varlab_core::engine::SimulationResult;

use crate::config::MetricsConfig;

/// Aggregate performance report for one backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Annualized Sharpe ratio; `None` when return variance is zero.
    pub sharpe: Option<f64>,
    /// Annualized Sortino ratio; `None` without downside deviation.
    pub sortino: Option<f64>,
    /// Largest peak-to-trough NAV decline as a non-positive ratio.
    pub max_drawdown: f64,
    /// AR(1) mean-reversion half-life of the variance series, in
    /// observations; `None` when the fitted coefficient is outside (0, 1).
    pub mean_reversion_half_life: Option<f64>,
    /// Fraction of in-position days with positive PnL; `None` if the
    /// strategy was never in the market.
    pub win_rate_trade_days: Option<f64>,
    /// Fraction of ledger days with an open position.
    pub exposure: f64,
    /// Annualized sum of absolute position-state changes.
    pub signal_turnover_yearly: f64,
    pub mean_daily_pnl: f64,
    pub std_daily_pnl: f64,
    pub final_nav: f64,
    pub trade_count: usize,
}

impl MetricsReport {
    /// Compute all metrics from a finished simulation.
    pub fn compute(
        simulation: &SimulationResult,
        series: &VarianceSeries,
        config: &MetricsConfig,
    ) -> Self {
        let nav = simulation.ledger.nav_curve();
        let pnl = daily_pnl(&nav);
        let in_position = in_position_mask(&simulation.ledger, simulation);

        Self {
            sharpe: sharpe_ratio(&pnl, config.risk_free_rate, config.annualization_days),
            sortino: sortino_ratio(&pnl, config.risk_free_rate, config.annualization_days),
            max_drawdown: max_drawdown(&nav),
            mean_reversion_half_life: ar1_half_life(&series.values()),
            win_rate_trade_days: win_rate_trade_days(&pnl, &in_position),
            exposure: exposure_rate(&in_position),
            signal_turnover_yearly: signal_turnover_yearly(
                &position_states(&simulation.ledger, simulation),
                config.annualization_days,
            ),
            mean_daily_pnl: mean(&pnl),
            std_daily_pnl: std_dev(&pnl),
            final_nav: simulation.ledger.final_nav().unwrap_or(f64::NAN),
            trade_count: simulation.trades.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Arithmetic daily returns: consecutive NAV differences.
pub fn daily_pnl(nav: &[f64]) -> Vec<f64> {
    nav.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Annualized Sharpe ratio of excess daily returns.
///
/// Excess = return - rf/annualization_days; the ratio is
/// mean/std * sqrt(annualization_days). `None` when fewer than two
/// returns or zero standard deviation.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    annualization_days: f64,
) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let daily_rf = risk_free_rate / annualization_days;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return None;
    }
    Some(mean(&excess) / std * annualization_days.sqrt())
}

/// Annualized Sortino ratio: downside deviation in the denominator.
pub fn sortino_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    annualization_days: f64,
) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let daily_rf = risk_free_rate / annualization_days;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();

    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return None;
    }
    Some(mean(&excess) / downside_std * annualization_days.sqrt())
}

/// Maximum drawdown as a non-positive ratio, via a running-maximum scan.
///
/// Exactly 0.0 for constant or monotonically non-decreasing NAV.
pub fn max_drawdown(nav: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &value in nav {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// AR(1) mean-reversion half-life of a series, in observations.
///
/// Lag-1 OLS on demeaned values: rho = sum(x[t-1]*x[t]) / sum(x[t-1]^2);
/// half-life = -ln 2 / ln rho. `None` when the series is degenerate or
/// rho falls outside (0, 1).
pub fn ar1_half_life(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let m = mean(values);
    let deviations: Vec<f64> = values.iter().map(|v| v - m).collect();

    let mut num = 0.0;
    let mut den = 0.0;
    for pair in deviations.windows(2) {
        num += pair[0] * pair[1];
        den += pair[0] * pair[0];
    }
    if den < 1e-30 {
        return None;
    }
    let rho = num / den;
    if rho <= 0.0 || rho >= 1.0 {
        return None;
    }
    Some(-std::f64::consts::LN_2 / rho.ln())
}

/// Fraction of in-position days whose PnL was positive.
pub fn win_rate_trade_days(pnl: &[f64], in_position: &[bool]) -> Option<f64> {
    // pnl[i] spans ledger dates i -> i+1; attribute it to the day the
    // position was held from.
    let held: Vec<f64> = pnl
        .iter()
        .zip(in_position)
        .filter(|(_, &open)| open)
        .map(|(&p, _)| p)
        .collect();
    if held.is_empty() {
        return None;
    }
    Some(held.iter().filter(|&&p| p > 0.0).count() as f64 / held.len() as f64)
}

/// Fraction of ledger days with an open position.
pub fn exposure_rate(in_position: &[bool]) -> f64 {
    if in_position.is_empty() {
        return 0.0;
    }
    in_position.iter().filter(|&&open| open).count() as f64 / in_position.len() as f64
}

/// Annualized turnover of the position state (+1/0/-1).
pub fn signal_turnover_yearly(states: &[f64], annualization_days: f64) -> f64 {
    if states.len() < 2 {
        return 0.0;
    }
    let total: f64 = states.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / states.len() as f64 * annualization_days
}

// ─── Position-state helpers ─────────────────────────────────────────

/// True for each ledger date on which a position was held (open at the
/// start of the next interval: open_date <= d < close_date).
fn in_position_mask(ledger: &NavLedger, simulation: &SimulationResult) -> Vec<bool> {
    ledger
        .points()
        .iter()
        .map(|point| {
            simulation.trades.iter().any(|t| {
                t.open_date <= point.date && point.date < t.close_date.unwrap_or(point.date)
            })
        })
        .collect()
}

/// Position state per ledger date: +1 long, -1 short, 0 flat.
fn position_states(ledger: &NavLedger, simulation: &SimulationResult) -> Vec<f64> {
    ledger
        .points()
        .iter()
        .map(|point| {
            simulation
                .trades
                .iter()
                .find(|t| {
                    t.open_date <= point.date && point.date < t.close_date.unwrap_or(point.date)
                })
                .map_or(0.0, |t| t.direction.sign())
        })
        .collect()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divide by N-1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
