//! Synthetic quote surfaces for demos and integration tests.
//!
//! Prices a Black-Scholes surface day by day with a seeded random walk in
//! volatility (plus occasional spikes) so the downstream pipeline has
//! something mean-reverting to trade. Deterministic for a fixed seed.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use varlab_core::domain::QuoteRecord;

/// Generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub n_days: usize,
    pub start_date: NaiveDate,
    pub expiry: NaiveDate,
    pub spot: f64,
    /// Long-run volatility the daily vol reverts toward.
    pub base_vol: f64,
    /// Daily probability of a volatility spike.
    pub spike_probability: f64,
    /// Strike grid half-width around spot, in strike steps.
    pub strikes_per_side: usize,
    pub strike_step: f64,
    /// Full bid/ask spread added around the model mid.
    pub spread: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            n_days: 120,
            start_date: NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            expiry: NaiveDate::from_ymd_opt(2022, 12, 30).unwrap(),
            spot: 100.0,
            base_vol: 0.2,
            spike_probability: 0.05,
            strikes_per_side: 30,
            strike_step: 2.0,
            spread: 0.1,
        }
    }
}

/// Generate one expiry's quote history as flat records, ready for
/// grouping into ladders (or for writing out as CSV).
pub fn generate_surface(config: &SyntheticConfig) -> Vec<QuoteRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut records = Vec::new();
    let mut vol = config.base_vol;

    let mut date = config.start_date;
    let mut emitted = 0;
    while emitted < config.n_days && date < config.expiry {
        // Skip weekends to mimic a real quote calendar.
        if matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            date = date.succ_opt().unwrap();
            continue;
        }

        // Mean-reverting vol walk with occasional spikes.
        let shock: f64 = rng.gen_range(-0.01..0.01);
        vol += 0.2 * (config.base_vol - vol) + shock;
        if rng.gen_bool(config.spike_probability) {
            vol += rng.gen_range(0.05..0.15);
        }
        vol = vol.clamp(0.05, 1.0);

        let t = (config.expiry - date).num_days().max(1) as f64 / 365.0;
        for i in 0..=(2 * config.strikes_per_side) {
            let offset = i as isize - config.strikes_per_side as isize;
            let strike = config.spot + offset as f64 * config.strike_step;
            if strike <= 0.0 {
                continue;
            }
            let (call, put) = bs_prices(config.spot, strike, vol, t);
            let half_spread = config.spread / 2.0;
            records.push(QuoteRecord {
                date,
                expiry: config.expiry,
                strike,
                underlying_price: config.spot,
                call_bid: Some((call - half_spread).max(0.0)),
                call_ask: Some(call + half_spread),
                put_bid: Some((put - half_spread).max(0.0)),
                put_ask: Some(put + half_spread),
            });
        }

        emitted += 1;
        date = date.succ_opt().unwrap();
    }

    records
}

/// Black-Scholes call and put prices with zero rate and dividend.
pub fn bs_prices(spot: f64, strike: f64, vol: f64, t: f64) -> (f64, f64) {
    let sqrt_t = t.sqrt();
    let d1 = ((spot / strike).ln() + 0.5 * vol * vol * t) / (vol * sqrt_t);
    let d2 = d1 - vol * sqrt_t;
    let call = spot * norm_cdf(d1) - strike * norm_cdf(d2);
    let put = strike * norm_cdf(-d2) - spot * norm_cdf(-d1);
    (call, put)
}

fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}
