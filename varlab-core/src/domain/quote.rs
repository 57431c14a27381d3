//! Option quotes — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One strike's quotes for a single (quote date, expiry) pair.
///
/// Bid/ask sides are optional: real chains routinely carry one-sided or
/// empty books far from the money. Validation of strike positivity and
/// date ordering happens at [`StrikeLadder`] construction; crossed quotes
/// (bid > ask) are left in place and handled by the replicator's quote
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub date: NaiveDate,
    pub expiry: NaiveDate,
    pub strike: f64,
    pub underlying_price: f64,
    pub call_bid: Option<f64>,
    pub call_ask: Option<f64>,
    pub put_bid: Option<f64>,
    pub put_ask: Option<f64>,
}

impl QuoteRecord {
    /// Mid price of the call leg, if both sides are quoted and not crossed.
    pub fn call_mid(&self) -> Option<f64> {
        mid(self.call_bid, self.call_ask)
    }

    /// Mid price of the put leg, if both sides are quoted and not crossed.
    pub fn put_mid(&self) -> Option<f64> {
        mid(self.put_bid, self.put_ask)
    }
}

fn mid(bid: Option<f64>, ask: Option<f64>) -> Option<f64> {
    match (bid, ask) {
        (Some(b), Some(a)) if b.is_finite() && a.is_finite() && b <= a => Some((b + a) / 2.0),
        _ => None,
    }
}

/// Errors raised while assembling a strike ladder.
#[derive(Debug, Error)]
pub enum LadderError {
    #[error("empty ladder")]
    Empty,
    #[error("non-positive strike {strike} on {date}")]
    NonPositiveStrike { date: NaiveDate, strike: f64 },
    #[error("record dated {found} in ladder for {expected}")]
    MixedDates { expected: NaiveDate, found: NaiveDate },
    #[error("record expiring {found} in ladder for {expected}")]
    MixedExpiries { expected: NaiveDate, found: NaiveDate },
}

/// All quotes sharing a (date, expiry) pair, sorted by strike ascending.
///
/// Duplicate strikes are resolved on construction: the last-seen record
/// wins, matching the upstream feed where a later row supersedes an
/// earlier one for the same contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeLadder {
    date: NaiveDate,
    expiry: NaiveDate,
    spot: f64,
    quotes: Vec<QuoteRecord>,
}

impl StrikeLadder {
    /// Build a ladder from raw records for one (date, expiry) group.
    ///
    /// Sorts by strike, deduplicates (last-seen wins), and validates the
    /// per-record invariants. The spot price is taken from the records,
    /// which all carry the same underlying close.
    pub fn new(mut records: Vec<QuoteRecord>) -> Result<Self, LadderError> {
        let first = records.first().ok_or(LadderError::Empty)?;
        let (date, expiry, spot) = (first.date, first.expiry, first.underlying_price);

        for r in &records {
            if r.date != date {
                return Err(LadderError::MixedDates {
                    expected: date,
                    found: r.date,
                });
            }
            if r.expiry != expiry {
                return Err(LadderError::MixedExpiries {
                    expected: expiry,
                    found: r.expiry,
                });
            }
            if !(r.strike > 0.0) {
                return Err(LadderError::NonPositiveStrike {
                    date: r.date,
                    strike: r.strike,
                });
            }
        }

        // Stable sort, then keep the last record per strike.
        records.sort_by(|a, b| a.strike.partial_cmp(&b.strike).unwrap());
        let mut quotes: Vec<QuoteRecord> = Vec::with_capacity(records.len());
        for r in records {
            match quotes.last() {
                Some(prev) if prev.strike == r.strike => {
                    *quotes.last_mut().unwrap() = r;
                }
                _ => quotes.push(r),
            }
        }

        Ok(Self {
            date,
            expiry,
            spot,
            quotes,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn expiry(&self) -> NaiveDate {
        self.expiry
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Quotes sorted by strike ascending, one per strike.
    pub fn quotes(&self) -> &[QuoteRecord] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
