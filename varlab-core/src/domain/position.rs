//! Variance positions and their lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Side of a variance position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    LongVariance,
    ShortVariance,
}

impl Direction {
    /// PnL sign: +1 for long variance, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::LongVariance => 1.0,
            Direction::ShortVariance => -1.0,
        }
    }
}

/// A single variance position.
///
/// Created by the simulator when an entry signal fills; `close_date` and
/// `exit_variance_price` stay `None` while open. A closed position is a
/// finished trade record and is never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub open_date: NaiveDate,
    pub direction: Direction,
    pub entry_variance_price: f64,
    pub notional: f64,
    pub close_date: Option<NaiveDate>,
    pub exit_variance_price: Option<f64>,
}

impl Position {
    pub fn open(
        open_date: NaiveDate,
        direction: Direction,
        entry_variance_price: f64,
        notional: f64,
    ) -> Self {
        Self {
            open_date,
            direction,
            entry_variance_price,
            notional,
            close_date: None,
            exit_variance_price: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.close_date.is_none()
    }

    /// Mark against a variance price; zero once closed.
    pub fn unrealized_pnl(&self, mark: f64) -> f64 {
        if self.is_open() {
            self.direction.sign() * self.notional * (mark - self.entry_variance_price)
        } else {
            0.0
        }
    }

    /// Gross PnL of a closed position, before fees.
    pub fn realized_pnl(&self) -> Option<f64> {
        self.exit_variance_price
            .map(|exit| self.direction.sign() * self.notional * (exit - self.entry_variance_price))
    }

    pub(crate) fn close(&mut self, close_date: NaiveDate, exit_variance_price: f64) {
        self.close_date = Some(close_date);
        self.exit_variance_price = Some(exit_variance_price);
    }
}
