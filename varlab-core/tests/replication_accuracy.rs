//! Quadrature accuracy against a known flat-volatility surface.
//!
//! Under Black-Scholes with zero rates, the log-contract identity is exact:
//! 2/T * integral of OTM mid / K^2 equals sigma^2. A dense synthetic
//! surface priced at constant vol must reproduce that variance within the
//! stated 1% tolerance, which pins the combined discretization, truncation,
//! and at-the-money gap error of the trapezoidal scheme.

use chrono::NaiveDate;
use varlab_core::domain::{QuoteRecord, StrikeLadder};
use varlab_core::replication::{replicate, ReplicationConfig};

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

fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Black-Scholes prices with zero rate and dividend.
fn bs_prices(spot: f64, strike: f64, vol: f64, t: f64) -> (f64, f64) {
    let sqrt_t = t.sqrt();
    let d1 = ((spot / strike).ln() + 0.5 * vol * vol * t) / (vol * sqrt_t);
    let d2 = d1 - vol * sqrt_t;
    let call = spot * norm_cdf(d1) - strike * norm_cdf(d2);
    let put = strike * norm_cdf(-d2) - spot * norm_cdf(-d1);
    (call, put)
}

fn flat_vol_ladder(spot: f64, vol: f64) -> StrikeLadder {
    let date = NaiveDate::from_ymd_opt(2021, 6, 30).unwrap();
    let expiry = NaiveDate::from_ymd_opt(2022, 6, 30).unwrap();
    let t = (expiry - date).num_days() as f64 / 365.0;

    // Strikes 25..=400 in 0.2 steps: wide enough that tail truncation is
    // negligible, dense enough that the missing at-the-money interval
    // stays inside the tolerance.
    let n_steps = ((400.0 - 25.0) / 0.2) as usize;
    let records: Vec<QuoteRecord> = (0..=n_steps)
        .map(|i| {
            let strike = 25.0 + i as f64 * 0.2;
            let (call, put) = bs_prices(spot, strike, vol, t);
            QuoteRecord {
                date,
                expiry,
                strike,
                underlying_price: spot,
                call_bid: Some(call),
                call_ask: Some(call),
                put_bid: Some(put),
                put_ask: Some(put),
            }
        })
        .collect();
    StrikeLadder::new(records).unwrap()
}

#[test]
fn flat_vol_surface_reproduces_black_scholes_variance() {
    let vol = 0.3;
    let ladder = flat_vol_ladder(100.0, vol);
    let obs = replicate(&ladder, &ReplicationConfig::default()).unwrap();

    let expected = vol * vol;
    let relative_error = (obs.implied_variance - expected).abs() / expected;
    assert!(
        relative_error < 0.01,
        "implied variance {} vs Black-Scholes {} (relative error {:.4})",
        obs.implied_variance,
        expected,
        relative_error
    );
}

#[test]
fn flat_vol_variance_is_non_negative_and_t_is_one_year() {
    let ladder = flat_vol_ladder(100.0, 0.2);
    let obs = replicate(&ladder, &ReplicationConfig::default()).unwrap();
    assert!(obs.implied_variance >= 0.0);
    assert!((obs.time_to_expiry_years - 1.0).abs() < 1e-12);
}

#[test]
fn higher_vol_surface_gives_higher_variance() {
    let low = replicate(&flat_vol_ladder(100.0, 0.15), &ReplicationConfig::default()).unwrap();
    let high = replicate(&flat_vol_ladder(100.0, 0.45), &ReplicationConfig::default()).unwrap();
    assert!(high.implied_variance > low.implied_variance);
}
