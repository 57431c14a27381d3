//! Signal generation — EMA-centred Bollinger bands over implied variance.
//!
//! Bands at index t are frozen from information through t-1: the centre is
//! the EMA of everything up to the previous observation and sigma is the
//! rolling standard deviation of the window ending there. The current
//! observation is then tested against those fixed levels, so a signal never
//! conditions on statistics that include the value being classified.

use serde::{Deserialize, Serialize};

use crate::domain::{BandState, Direction, Signal, SignalAction, VarianceSeries};
use crate::indicators::{alpha_from_half_life, alpha_from_span, ewma, rolling_std};

/// EMA parameterization: a span or an equivalent decay half-life.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Smoothing {
    Span { span: usize },
    HalfLife { half_life: f64 },
}

impl Smoothing {
    pub fn alpha(&self) -> f64 {
        match *self {
            Smoothing::Span { span } => alpha_from_span(span),
            Smoothing::HalfLife { half_life } => alpha_from_half_life(half_life),
        }
    }
}

/// Signal generator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub smoothing: Smoothing,
    /// Rolling window for the band standard deviation; also the warm-up
    /// length — the first `lookback` observations emit Hold.
    pub lookback: usize,
    /// Band half-width in standard deviations.
    pub band_multiplier: f64,
    /// Span of the EMA of |delta variance| used by the entry gate.
    pub vol_of_var_span: usize,
    /// Entries only fire while the vol-of-var EMA is at or below this
    /// limit. `None` disables the gate.
    #[serde(default)]
    pub vol_of_var_limit: Option<f64>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::Span { span: 10 },
            lookback: 10,
            band_multiplier: 1.5,
            vol_of_var_span: 5,
            vol_of_var_limit: None,
        }
    }
}

impl SignalConfig {
    fn validate(&self) {
        assert!(self.lookback >= 2, "lookback must be >= 2");
        assert!(
            self.band_multiplier > 0.0 && self.band_multiplier.is_finite(),
            "band multiplier must be positive and finite"
        );
    }
}

/// Produce one signal per observation of the series.
///
/// Deterministic: identical series and config yield bit-identical output.
pub fn generate_signals(series: &VarianceSeries, config: &SignalConfig) -> Vec<Signal> {
    config.validate();

    let values = series.values();
    let dates = series.dates();
    let n = values.len();

    let ema = ewma(&values, config.smoothing.alpha());
    let sigma = rolling_std(&values, config.lookback);
    let gate = vol_of_var_ema(&values, config.vol_of_var_span);

    let mut signals = Vec::with_capacity(n);
    let mut armed: Option<Direction> = None;

    for i in 0..n {
        let hold = |band_state| Signal {
            date: dates[i],
            action: SignalAction::Hold,
            reference_variance: values[i],
            band_state,
        };

        if i < config.lookback {
            signals.push(hold(None));
            continue;
        }

        let center = ema[i - 1];
        let s = sigma[i - 1];
        if !center.is_finite() || !s.is_finite() {
            signals.push(hold(None));
            continue;
        }

        let band = BandState {
            center,
            upper: center + config.band_multiplier * s,
            lower: center - config.band_multiplier * s,
            sigma: s,
        };
        let (prev, cur) = (values[i - 1], values[i]);

        let action = match armed {
            Some(direction) => {
                // Exit on a cross back through the centre, against the
                // direction of the open position.
                let crossed_back = match direction {
                    Direction::ShortVariance => prev >= band.center && cur < band.center,
                    Direction::LongVariance => prev <= band.center && cur > band.center,
                };
                if crossed_back {
                    armed = None;
                    SignalAction::Exit
                } else {
                    SignalAction::Hold
                }
            }
            None => {
                let gate_open = config
                    .vol_of_var_limit
                    .map_or(true, |limit| gate[i].is_finite() && gate[i] <= limit);
                if gate_open && prev <= band.upper && cur > band.upper {
                    armed = Some(Direction::ShortVariance);
                    SignalAction::EnterShort
                } else if gate_open && prev >= band.lower && cur < band.lower {
                    armed = Some(Direction::LongVariance);
                    SignalAction::EnterLong
                } else {
                    SignalAction::Hold
                }
            }
        };

        signals.push(Signal {
            date: dates[i],
            action,
            reference_variance: cur,
            band_state: Some(band),
        });
    }

    signals
}

/// EMA of the absolute first difference of the series; index 0 is NaN.
fn vol_of_var_ema(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n < 2 {
        return out;
    }
    let diffs: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let smoothed = ewma(&diffs, alpha_from_span(span));
    out[1..].copy_from_slice(&smoothed);
    out
}
