//! Trading signals emitted by the signal generator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Discrete action for one observation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    EnterLong,
    EnterShort,
    Exit,
    Hold,
}

impl SignalAction {
    pub fn is_entry(&self) -> bool {
        matches!(self, SignalAction::EnterLong | SignalAction::EnterShort)
    }
}

/// Band levels frozen from information available before the signal date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandState {
    pub center: f64,
    pub upper: f64,
    pub lower: f64,
    pub sigma: f64,
}

/// One signal per variance observation.
///
/// `band_state` is `None` during the warm-up window, where the rolling
/// statistics are not yet defined and the action is always `Hold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub action: SignalAction,
    pub reference_variance: f64,
    pub band_state: Option<BandState>,
}
