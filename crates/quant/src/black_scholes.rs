//! Black-Scholes valuation for European options.
//!
//! Time to expiry is expressed in ticks and converted to a year
//! fraction at one tick per day. Degenerate inputs (vanishing
//! volatility or time, non-positive spot or strike) fall back to
//! intrinsic value; computed prices are clamped at zero so callers
//! never see a negative premium or NaN.

use crate::DAYS_PER_YEAR;
use statrs::distribution::{ContinuousCDF, Normal};
use types::OptionKind;

/// Below this value of sigma * sqrt(tau) the lognormal term is
/// numerically meaningless and intrinsic value is used instead.
const MIN_VOL_TIME: f64 = 1e-10;

/// Per-share Black-Scholes price.
///
/// `tau_years` is the remaining life as a year fraction.
pub fn price_per_share(
    kind: OptionKind,
    spot: f64,
    strike: f64,
    rate: f64,
    sigma: f64,
    tau_years: f64,
) -> f64 {
    if spot <= 0.0 || strike <= 0.0 {
        return intrinsic(kind, spot, strike);
    }
    let vol_time = sigma * tau_years.sqrt();
    if !vol_time.is_finite() || vol_time < MIN_VOL_TIME {
        return intrinsic(kind, spot, strike);
    }

    let d1 = ((spot / strike).ln() + (rate + sigma * sigma / 2.0) * tau_years) / vol_time;
    let d2 = d1 - vol_time;

    let normal = Normal::new(0.0, 1.0).unwrap();
    let discounted_strike = strike * (-rate * tau_years).exp();

    let price = match kind {
        OptionKind::Call => spot * normal.cdf(d1) - discounted_strike * normal.cdf(d2),
        OptionKind::Put => discounted_strike * normal.cdf(-d2) - spot * normal.cdf(-d1),
    };
    price.max(0.0)
}

/// Price of a whole contract covering `multiplier` shares, with the
/// remaining life given in ticks.
pub fn contract_price(
    kind: OptionKind,
    spot: f64,
    strike: f64,
    rate: f64,
    sigma: f64,
    ticks_to_expiry: u64,
    multiplier: f64,
) -> f64 {
    let tau_years = ticks_to_expiry as f64 / DAYS_PER_YEAR;
    price_per_share(kind, spot, strike, rate, sigma, tau_years) * multiplier
}

fn intrinsic(kind: OptionKind, spot: f64, strike: f64) -> f64 {
    match kind {
        OptionKind::Call => (spot - strike).max(0.0),
        OptionKind::Put => (strike - spot).max(0.0),
    }
}
