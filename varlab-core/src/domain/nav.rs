//! The daily NAV ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading date's account snapshot.
///
/// `nav = cash + unrealized_pnl`; `realized_pnl` is cumulative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
    pub nav: f64,
}

/// Append-only sequence of NAV points, one per calendar date of the input.
///
/// NAV evolves additively: each point's nav is the prior nav plus that
/// day's PnL delta. Past points are never recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavLedger {
    points: Vec<NavPoint>,
}

impl NavLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, point: NavPoint) {
        debug_assert!(
            self.points.last().map_or(true, |p| p.date < point.date),
            "ledger dates must strictly increase"
        );
        self.points.push(point);
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    /// NAV values in date order.
    pub fn nav_curve(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.nav).collect()
    }

    pub fn final_nav(&self) -> Option<f64> {
        self.points.last().map(|p| p.nav)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
