//! Variance replication — log-contract pricing off a discrete strike ladder.
//!
//! For each quote date, out-of-the-money option mids weighted by 1/K^2 are
//! integrated over the strike grid (puts below spot, calls at or above),
//! and the combined integral is scaled by 2/T to give the model-free
//! implied variance for that expiry.

pub mod quadrature;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    QuoteRecord, SeriesError, StrikeLadder, VarianceObservation, VarianceSeries,
};
use quadrature::trapezoid;

/// How to handle a strike whose mid price is unavailable (one-sided book
/// or crossed bid/ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotePolicy {
    /// Drop the strike from the integral. Substituting a default price
    /// would bias the integral; exclusion is the default policy.
    #[default]
    Exclude,
    /// Fill the mid by linear interpolation in strike from the nearest
    /// valid quotes on the same leg. Edge strikes with no bracketing
    /// neighbours are still dropped.
    Interpolate,
}

/// Replicator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Minimum usable strikes on each leg after the quote policy runs.
    pub min_strikes_per_leg: usize,
    pub quote_policy: QuotePolicy,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            min_strikes_per_leg: 2,
            quote_policy: QuotePolicy::Exclude,
        }
    }
}

/// Why a quote date was skipped rather than replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    TooFewPutStrikes { have: usize, need: usize },
    TooFewCallStrikes { have: usize, need: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooFewPutStrikes { have, need } => {
                write!(f, "put leg has {have} usable strikes, need {need}")
            }
            SkipReason::TooFewCallStrikes { have, need } => {
                write!(f, "call leg has {have} usable strikes, need {need}")
            }
        }
    }
}

/// A quote date the series builder skipped, with the recorded reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

#[derive(Debug, Error)]
pub enum ReplicationError {
    /// Recoverable: the date cannot support the integral and is skipped.
    #[error("insufficient data on {date}: {reason}")]
    Insufficient { date: NaiveDate, reason: SkipReason },
    /// Fatal: the quote date is on or after expiry.
    #[error("quote date {date} is on or after expiry {expiry}")]
    ExpiredQuote { date: NaiveDate, expiry: NaiveDate },
    /// Fatal: the ladder violates the strictly-increasing-strikes invariant.
    #[error("ladder for {date} has non-increasing strikes")]
    UnsortedStrikes { date: NaiveDate },
    /// Fatal: replicated observations arrived out of date order.
    #[error(transparent)]
    Series(#[from] SeriesError),
}

enum Leg {
    Put,
    Call,
}

/// Compute one day's implied variance from a strike ladder.
pub fn replicate(
    ladder: &StrikeLadder,
    config: &ReplicationConfig,
) -> Result<VarianceObservation, ReplicationError> {
    let date = ladder.date();
    let expiry = ladder.expiry();

    let days = (expiry - date).num_days();
    if days <= 0 {
        return Err(ReplicationError::ExpiredQuote { date, expiry });
    }
    let time_to_expiry_years = days.max(1) as f64 / 365.0;

    let quotes = ladder.quotes();
    if quotes.windows(2).any(|w| w[0].strike >= w[1].strike) {
        return Err(ReplicationError::UnsortedStrikes { date });
    }

    let spot = ladder.spot();
    let puts = leg_points(quotes, spot, Leg::Put, config.quote_policy);
    let calls = leg_points(quotes, spot, Leg::Call, config.quote_policy);

    let need = config.min_strikes_per_leg;
    if puts.len() < need {
        return Err(ReplicationError::Insufficient {
            date,
            reason: SkipReason::TooFewPutStrikes {
                have: puts.len(),
                need,
            },
        });
    }
    if calls.len() < need {
        return Err(ReplicationError::Insufficient {
            date,
            reason: SkipReason::TooFewCallStrikes {
                have: calls.len(),
                need,
            },
        });
    }

    let n_options = puts.len() + calls.len();
    let integrand = |points: &[(f64, f64)]| -> Vec<(f64, f64)> {
        points
            .iter()
            .map(|&(strike, mid)| (strike, mid / (strike * strike)))
            .collect()
    };
    let integral = trapezoid(&integrand(&puts)) + trapezoid(&integrand(&calls));
    let implied_variance = 2.0 / time_to_expiry_years * integral;

    Ok(VarianceObservation {
        date,
        expiry,
        time_to_expiry_years,
        implied_variance,
        n_options,
    })
}

/// Replicate every ladder of one expiry into a date-ordered series.
///
/// Insufficient dates are skipped with their reason recorded; invariant
/// violations abort the expiry.
pub fn build_series(
    ladders: &[StrikeLadder],
    config: &ReplicationConfig,
) -> Result<(VarianceSeries, Vec<SkippedDate>), ReplicationError> {
    let mut series = VarianceSeries::new();
    let mut skipped = Vec::new();

    for ladder in ladders {
        match replicate(ladder, config) {
            Ok(obs) => series.push(obs)?,
            Err(ReplicationError::Insufficient { date, reason }) => {
                skipped.push(SkippedDate { date, reason });
            }
            Err(fatal) => return Err(fatal),
        }
    }

    Ok((series, skipped))
}

/// Extract (strike, mid) points for one out-of-the-money leg, applying
/// the quote policy to strikes without a usable mid.
fn leg_points(
    quotes: &[QuoteRecord],
    spot: f64,
    leg: Leg,
    policy: QuotePolicy,
) -> Vec<(f64, f64)> {
    let raw: Vec<(f64, Option<f64>)> = quotes
        .iter()
        .filter(|q| match leg {
            Leg::Put => q.strike < spot,
            Leg::Call => q.strike >= spot,
        })
        .map(|q| {
            let mid = match leg {
                Leg::Put => q.put_mid(),
                Leg::Call => q.call_mid(),
            };
            (q.strike, mid)
        })
        .collect();

    match policy {
        QuotePolicy::Exclude => raw
            .into_iter()
            .filter_map(|(k, mid)| mid.map(|m| (k, m)))
            .collect(),
        QuotePolicy::Interpolate => interpolate_gaps(&raw),
    }
}

/// Linear interpolation in strike across missing mids. Strikes without a
/// valid neighbour on both sides are dropped.
fn interpolate_gaps(raw: &[(f64, Option<f64>)]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(raw.len());
    for (i, &(strike, mid)) in raw.iter().enumerate() {
        if let Some(m) = mid {
            out.push((strike, m));
            continue;
        }
        let left = raw[..i].iter().rev().find_map(|&(k, m)| m.map(|m| (k, m)));
        let right = raw[i + 1..].iter().find_map(|&(k, m)| m.map(|m| (k, m)));
        if let (Some((k0, m0)), Some((k1, m1))) = (left, right) {
            let w = (strike - k0) / (k1 - k0);
            out.push((strike, m0 + w * (m1 - m0)));
        }
    }
    out
}
