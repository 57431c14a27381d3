//! Option quote ingestion from CSV.
//!
//! The expected layout matches the upstream chain export: one row per
//! (quote date, expiry, strike) with bid/ask for both sides. Header
//! validation happens before any row is parsed so a wrong file fails with
//! a column name, not a row-level type error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use varlab_core::domain::{LadderError, QuoteRecord, StrikeLadder};

const REQUIRED_COLUMNS: [&str; 8] = [
    "QUOTE_DATE",
    "EXPIRE_DATE",
    "STRIKE",
    "UNDERLYING_LAST",
    "C_BID",
    "C_ASK",
    "P_BID",
    "P_ASK",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read quote file: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("row {row}: bad date '{value}'")]
    BadDate { row: usize, value: String },
    #[error("ladder for {date}/{expiry}: {source}")]
    Ladder {
        date: NaiveDate,
        expiry: NaiveDate,
        source: LadderError,
    },
    #[error("no rows in quote file")]
    Empty,
}

/// One CSV row; sides may be blank.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "QUOTE_DATE")]
    quote_date: String,
    #[serde(rename = "EXPIRE_DATE")]
    expire_date: String,
    #[serde(rename = "STRIKE")]
    strike: f64,
    #[serde(rename = "UNDERLYING_LAST")]
    underlying_last: f64,
    #[serde(rename = "C_BID")]
    call_bid: Option<f64>,
    #[serde(rename = "C_ASK")]
    call_ask: Option<f64>,
    #[serde(rename = "P_BID")]
    put_bid: Option<f64>,
    #[serde(rename = "P_ASK")]
    put_ask: Option<f64>,
}

/// The validated quote table, grouped into per-(date, expiry) ladders.
#[derive(Debug, Clone)]
pub struct LoadedQuotes {
    ladders: BTreeMap<NaiveDate, Vec<StrikeLadder>>,
    calendar: Vec<NaiveDate>,
}

impl LoadedQuotes {
    /// Group flat records into per-(date, expiry) ladders.
    ///
    /// This is the in-memory entry point; `load_quotes_csv` parses rows
    /// and delegates here. Synthetic surfaces use it directly.
    pub fn from_records(records: Vec<QuoteRecord>) -> Result<Self, LoadError> {
        if records.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut groups: BTreeMap<(NaiveDate, NaiveDate), Vec<QuoteRecord>> = BTreeMap::new();
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for record in records {
            dates.insert(record.date);
            groups
                .entry((record.date, record.expiry))
                .or_default()
                .push(record);
        }

        let mut ladders: BTreeMap<NaiveDate, Vec<StrikeLadder>> = BTreeMap::new();
        for ((date, expiry), group) in groups {
            let ladder = StrikeLadder::new(group)
                .map_err(|source| LoadError::Ladder { date, expiry, source })?;
            ladders.entry(expiry).or_default().push(ladder);
        }

        Ok(Self {
            ladders,
            calendar: dates.into_iter().collect(),
        })
    }

    /// Expiries present in the table, ascending.
    pub fn expiries(&self) -> Vec<NaiveDate> {
        self.ladders.keys().copied().collect()
    }

    /// Date-ordered ladders for one expiry.
    pub fn ladders_for(&self, expiry: NaiveDate) -> Option<&[StrikeLadder]> {
        self.ladders.get(&expiry).map(Vec::as_slice)
    }

    /// Every distinct quote date in the table, ascending.
    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }
}

/// Load and validate a quote CSV.
pub fn load_quotes_csv(path: &Path) -> Result<LoadedQuotes, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(LoadError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<RawRow>().enumerate() {
        let row_number = i + 2; // header is row 1
        let raw = row?;
        records.push(QuoteRecord {
            date: parse_date(&raw.quote_date, row_number)?,
            expiry: parse_date(&raw.expire_date, row_number)?,
            strike: raw.strike,
            underlying_price: raw.underlying_last,
            call_bid: raw.call_bid,
            call_ask: raw.call_ask,
            put_bid: raw.put_bid,
            put_ask: raw.put_ask,
        });
    }

    LoadedQuotes::from_records(records)
}

fn parse_date(value: &str, row: usize) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| LoadError::BadDate {
        row,
        value: value.to_string(),
    })
}
