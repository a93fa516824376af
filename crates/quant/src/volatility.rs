//! Rolling realized-volatility estimator.
//!
//! Maintains a fixed window of recent prices and reports the
//! annualized standard deviation of their log returns. Until the
//! window fills, a configured default applies; the estimate is floored
//! so option valuation never divides by a vanished volatility.

use crate::DAYS_PER_YEAR;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct VolatilityEstimator {
    prices: VecDeque<f64>,
    window: usize,
    default_volatility: f64,
    floor: f64,
}

impl VolatilityEstimator {
    /// `window` is the number of prices kept (yielding `window - 1`
    /// returns); `default_volatility` is reported until the window is
    /// full and also acts as the lower floor's source of scale.
    pub fn new(window: usize, default_volatility: f64) -> Self {
        debug_assert!(window >= 2, "volatility window needs at least two prices");
        Self {
            prices: VecDeque::with_capacity(window),
            window: window.max(2),
            default_volatility,
            floor: default_volatility * 0.01,
        }
    }

    /// Record the latest traded price. Non-positive prices are kept
    /// out of the window; log returns are undefined across them.
    pub fn update(&mut self, price: f64) {
        if price <= 0.0 {
            return;
        }
        if self.prices.len() == self.window {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    /// Current annualized volatility estimate.
    pub fn current(&self) -> f64 {
        if self.prices.len() < self.window {
            return self.default_volatility;
        }

        let mut returns = Vec::with_capacity(self.prices.len() - 1);
        let mut iter = self.prices.iter().copied();
        if let Some(mut prev) = iter.next() {
            for price in iter {
                returns.push((price / prev).ln());
                prev = price;
            }
        }
        if returns.is_empty() {
            return self.default_volatility;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let annualized = variance.sqrt() * DAYS_PER_YEAR.sqrt();
        annualized.max(self.floor)
    }
}
