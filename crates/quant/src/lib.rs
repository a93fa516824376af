//! Numerical kernels for the swarm-market simulation.
//!
//! # Modules
//!
//! - [`black_scholes`] - European option valuation
//! - [`polyfit`] - least-squares polynomial fitting for demand/price projection
//! - [`indicators`] - moving averages and Wilder RSI over price history
//! - [`volatility`] - rolling realized-volatility estimator
//! - [`rates`] - mean-reverting risk-free rate process
//!
//! # Design Notes
//!
//! - Everything is `f64`; callers own the histories and pass slices.
//! - Insufficient history is not an error: functions return `Option`
//!   or a documented neutral value, per the model's sentinel
//!   conventions.

pub mod black_scholes;
pub mod indicators;
pub mod polyfit;
pub mod rates;
pub mod volatility;

pub use black_scholes::{contract_price, price_per_share};
pub use indicators::{moving_average, relative_strength_index};
pub use polyfit::FittedPoly;
pub use rates::{RateProcess, RateProcessConfig};
pub use volatility::VolatilityEstimator;

/// Simulated days per year; one tick is one day.
pub const DAYS_PER_YEAR: f64 = 365.0;
