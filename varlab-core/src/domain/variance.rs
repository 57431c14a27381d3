//! Implied-variance observations and the per-expiry time series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One day's model-free implied variance for a fixed expiry.
///
/// Immutable once computed; the replicator owns creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceObservation {
    pub date: NaiveDate,
    pub expiry: NaiveDate,
    pub time_to_expiry_years: f64,
    pub implied_variance: f64,
    /// Number of option quotes that entered the replication integral.
    pub n_options: usize,
}

impl VarianceObservation {
    /// Implied volatility, the square root of variance.
    pub fn implied_vol(&self) -> f64 {
        self.implied_variance.sqrt()
    }
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("observation dated {current} does not follow {previous} (dates must strictly increase)")]
    NonIncreasingDates {
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("observation expiring {found} in series for {expected}")]
    MixedExpiries { expected: NaiveDate, found: NaiveDate },
}

/// Date-ordered implied-variance observations for one expiry.
///
/// Dates strictly increase; gaps are permitted and carry no implied
/// continuity. Consumers must work with the dates actually present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarianceSeries {
    observations: Vec<VarianceObservation>,
}

impl VarianceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from pre-computed observations, enforcing date order.
    pub fn from_observations(
        observations: Vec<VarianceObservation>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new();
        for obs in observations {
            series.push(obs)?;
        }
        Ok(series)
    }

    /// Append an observation; rejects out-of-order dates and foreign expiries.
    pub fn push(&mut self, obs: VarianceObservation) -> Result<(), SeriesError> {
        if let Some(last) = self.observations.last() {
            if obs.date <= last.date {
                return Err(SeriesError::NonIncreasingDates {
                    previous: last.date,
                    current: obs.date,
                });
            }
            if obs.expiry != last.expiry {
                return Err(SeriesError::MixedExpiries {
                    expected: last.expiry,
                    found: obs.expiry,
                });
            }
        }
        self.observations.push(obs);
        Ok(())
    }

    pub fn observations(&self) -> &[VarianceObservation] {
        &self.observations
    }

    /// Variance values in date order.
    pub fn values(&self) -> Vec<f64> {
        self.observations
            .iter()
            .map(|o| o.implied_variance)
            .collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
