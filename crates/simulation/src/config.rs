//! Run-level configuration for the market simulation.
//!
//! `SimConfig` is the single description of a run: population counts per
//! archetype, the market-impact depth, credit pool, forecasting and rate
//! parameters, and the master seed. It serializes to JSON so runs can be
//! recorded and replayed, and the binary maps CLI flags straight onto it.
//!
//! Validation happens once, in [`Simulation::new`](crate::Simulation::new);
//! everything past construction treats the config as trusted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at setup. Only malformed configuration aborts a
/// run; economic extremes are simulated, not validated away.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Every population count is zero.
    #[error("empty simulation: no agents configured")]
    EmptySimulation,
    /// Agents exist, but none of them emit orders, so price formation
    /// would divide by zero participants.
    #[error("no order-emitting participants configured")]
    NoParticipants,
    #[error("lambda must be positive, got {0}")]
    NonPositiveLambda(f64),
    #[error("initial price must be positive, got {0}")]
    NonPositivePrice(f64),
}

/// Master configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Market
    // ─────────────────────────────────────────────────────────────────────────
    /// Traded price at tick zero.
    pub initial_price: f64,
    /// Market-depth constant: price change = (net demand / participants) / lambda.
    pub lambda: f64,
    /// Master seed; expands into per-agent streams and the engine stream.
    pub seed: u64,
    /// Stop the run on the tick the price is clamped at zero.
    pub halt_on_market_failure: bool,
    /// Enforce the short-sale margin check on non-market-maker books.
    pub enforce_short_margin: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Population
    // ─────────────────────────────────────────────────────────────────────────
    /// Number of threshold-driven noise traders.
    pub num_noise_traders: usize,
    /// Number of moving-average crossover traders.
    pub num_momentum_traders: usize,
    /// Number of RSI traders.
    pub num_fundamental_traders: usize,
    /// Number of opinion-driven retail investors.
    pub num_retail_investors: usize,
    /// Number of market makers.
    pub num_market_makers: usize,
    /// Number of squeeze initiators (opinion-only, never trade).
    pub num_initiators: usize,
    /// Number of short-campaign hedge funds.
    pub num_hedge_funds: usize,

    // ─────────────────────────────────────────────────────────────────────────
    // Capital & Credit
    // ─────────────────────────────────────────────────────────────────────────
    /// Starting cash per trading agent.
    pub trader_capital: f64,
    /// The bank's lendable pool.
    pub bank_capital: f64,

    // ─────────────────────────────────────────────────────────────────────────
    // Forecasting, Volatility & Rates
    // ─────────────────────────────────────────────────────────────────────────
    /// Trailing window (and polynomial order) of the demand forecaster.
    pub forecast_window: usize,
    /// Volatility reported until the realized estimator warms up.
    pub default_volatility: f64,
    /// Prices kept by the realized-volatility estimator.
    pub volatility_window: usize,
    /// Risk-free rate at tick zero.
    pub initial_rate: f64,
    /// Long-run mean the rate reverts to.
    pub rate_long_run_mean: f64,
    /// Mean-reversion speed of the rate process.
    pub rate_reversion_speed: f64,
    /// Diffusion volatility of the rate process.
    pub rate_volatility: f64,

    // ─────────────────────────────────────────────────────────────────────────
    // Opinion Network
    // ─────────────────────────────────────────────────────────────────────────
    /// Retail investors per neighbour group; members hear each other.
    pub opinion_group_size: usize,
}

impl Default for SimConfig {
    /// The reference squeeze scenario: a retail crowd seeded by one
    /// initiator runs up against a single short hedge fund.
    fn default() -> Self {
        Self {
            initial_price: 15.0,
            lambda: 10.0,
            seed: 1234,
            halt_on_market_failure: false,
            enforce_short_margin: false,
            num_noise_traders: 1000,
            num_momentum_traders: 100,
            num_fundamental_traders: 100,
            num_retail_investors: 50,
            num_market_makers: 5,
            num_initiators: 1,
            num_hedge_funds: 1,
            trader_capital: 10_000.0,
            bank_capital: 10_000_000.0,
            forecast_window: 10,
            default_volatility: 0.3,
            volatility_window: 10,
            initial_rate: 0.028,
            rate_long_run_mean: 0.028,
            rate_reversion_speed: 0.1,
            rate_volatility: 0.01,
            opinion_group_size: 5,
        }
    }
}

impl SimConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    pub fn noise_traders(mut self, count: usize) -> Self {
        self.num_noise_traders = count;
        self
    }

    pub fn momentum_traders(mut self, count: usize) -> Self {
        self.num_momentum_traders = count;
        self
    }

    pub fn fundamental_traders(mut self, count: usize) -> Self {
        self.num_fundamental_traders = count;
        self
    }

    pub fn retail_investors(mut self, count: usize) -> Self {
        self.num_retail_investors = count;
        self
    }

    pub fn market_makers(mut self, count: usize) -> Self {
        self.num_market_makers = count;
        self
    }

    pub fn initiators(mut self, count: usize) -> Self {
        self.num_initiators = count;
        self
    }

    pub fn hedge_funds(mut self, count: usize) -> Self {
        self.num_hedge_funds = count;
        self
    }

    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn initial_price(mut self, price: f64) -> Self {
        self.initial_price = price;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn bank_capital(mut self, capital: f64) -> Self {
        self.bank_capital = capital;
        self
    }

    pub fn trader_capital(mut self, capital: f64) -> Self {
        self.trader_capital = capital;
        self
    }

    pub fn halt_on_market_failure(mut self, halt: bool) -> Self {
        self.halt_on_market_failure = halt;
        self
    }

    pub fn enforce_short_margin(mut self, enforce: bool) -> Self {
        self.enforce_short_margin = enforce;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presets
    // ─────────────────────────────────────────────────────────────────────────

    /// A scaled-down population for quick runs and integration tests.
    pub fn smoke() -> Self {
        Self::default()
            .noise_traders(50)
            .momentum_traders(10)
            .fundamental_traders(10)
            .retail_investors(10)
            .market_makers(1)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Computed Properties
    // ─────────────────────────────────────────────────────────────────────────

    /// Total agents across every archetype (the bank sits outside this
    /// count; it holds no book and joins no phase but the credit one).
    pub fn total_agents(&self) -> usize {
        self.num_noise_traders
            + self.num_momentum_traders
            + self.num_fundamental_traders
            + self.num_retail_investors
            + self.num_market_makers
            + self.num_initiators
            + self.num_hedge_funds
    }

    /// Agents whose orders move the price. Initiators only talk, so they
    /// stay out of the price-impact denominator.
    pub fn order_emitting_participants(&self) -> usize {
        self.total_agents() - self.num_initiators
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_agents() == 0 {
            return Err(ConfigError::EmptySimulation);
        }
        if self.order_emitting_participants() == 0 {
            return Err(ConfigError::NoParticipants);
        }
        if self.lambda <= 0.0 {
            return Err(ConfigError::NonPositiveLambda(self.lambda));
        }
        if self.initial_price <= 0.0 {
            return Err(ConfigError::NonPositivePrice(self.initial_price));
        }
        Ok(())
    }
}
