//! Command-line surface of the swarm-market binary.
//!
//! Flags map one-to-one onto [`SimConfig`] fields; an unset flag keeps
//! the selected scenario's value. Every flag also reads an `SIM_*`
//! environment variable so containerized runs can be configured without
//! editing the command line.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use simulation::SimConfig;
use types::Tick;

/// Named baseline populations to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// The reference squeeze: a retail crowd seeded by one initiator
    /// runs up against a single short hedge fund.
    Reference,
    /// Scaled-down population for quick runs.
    Smoke,
}

/// Agent-based securities market simulator.
#[derive(Debug, Parser)]
#[command(name = "swarm-market", version)]
#[command(about = "Runs an agent-based securities market and records every tick")]
pub struct Args {
    /// Ticks to simulate (one tick is one trading day)
    #[arg(long, env = "SIM_TICKS", default_value_t = 250)]
    pub ticks: Tick,

    /// Baseline population
    #[arg(long, value_enum, env = "SIM_SCENARIO", default_value = "reference")]
    pub scenario: Scenario,

    /// Master seed for all random streams
    #[arg(long, env = "SIM_SEED")]
    pub seed: Option<u64>,

    /// Number of threshold-driven noise traders
    #[arg(long, env = "SIM_NOISE_TRADERS")]
    pub noise_traders: Option<usize>,

    /// Number of moving-average crossover traders
    #[arg(long, env = "SIM_MOMENTUM_TRADERS")]
    pub momentum_traders: Option<usize>,

    /// Number of RSI traders
    #[arg(long, env = "SIM_FUNDAMENTAL_TRADERS")]
    pub fundamental_traders: Option<usize>,

    /// Number of opinion-driven retail investors
    #[arg(long, env = "SIM_RETAIL_INVESTORS")]
    pub retail_investors: Option<usize>,

    /// Number of market makers
    #[arg(long, env = "SIM_MARKET_MAKERS")]
    pub market_makers: Option<usize>,

    /// Number of squeeze initiators
    #[arg(long, env = "SIM_INITIATORS")]
    pub initiators: Option<usize>,

    /// Number of short-campaign hedge funds
    #[arg(long, env = "SIM_HEDGE_FUNDS")]
    pub hedge_funds: Option<usize>,

    /// Market depth: price change = net demand per participant / lambda
    #[arg(long, env = "SIM_LAMBDA")]
    pub lambda: Option<f64>,

    /// Traded price at tick zero
    #[arg(long, env = "SIM_INITIAL_PRICE")]
    pub initial_price: Option<f64>,

    /// Starting cash per trading agent
    #[arg(long, env = "SIM_TRADER_CAPITAL")]
    pub trader_capital: Option<f64>,

    /// The bank's lendable pool
    #[arg(long, env = "SIM_BANK_CAPITAL")]
    pub bank_capital: Option<f64>,

    /// Stop the run on the tick the price is clamped at zero
    #[arg(long, env = "SIM_HALT_ON_FAILURE")]
    pub halt_on_market_failure: bool,

    /// Cap short sales by free cash (market makers stay exempt)
    #[arg(long, env = "SIM_ENFORCE_SHORT_MARGIN")]
    pub enforce_short_margin: bool,

    /// Write per-tick records to this file as JSON lines
    #[arg(long, env = "SIM_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl Args {
    /// The scenario baseline with every explicit flag applied on top.
    pub fn sim_config(&self) -> SimConfig {
        let mut config = match self.scenario {
            Scenario::Reference => SimConfig::default(),
            Scenario::Smoke => SimConfig::smoke(),
        };
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        if let Some(count) = self.noise_traders {
            config = config.noise_traders(count);
        }
        if let Some(count) = self.momentum_traders {
            config = config.momentum_traders(count);
        }
        if let Some(count) = self.fundamental_traders {
            config = config.fundamental_traders(count);
        }
        if let Some(count) = self.retail_investors {
            config = config.retail_investors(count);
        }
        if let Some(count) = self.market_makers {
            config = config.market_makers(count);
        }
        if let Some(count) = self.initiators {
            config = config.initiators(count);
        }
        if let Some(count) = self.hedge_funds {
            config = config.hedge_funds(count);
        }
        if let Some(lambda) = self.lambda {
            config = config.lambda(lambda);
        }
        if let Some(price) = self.initial_price {
            config = config.initial_price(price);
        }
        if let Some(capital) = self.trader_capital {
            config = config.trader_capital(capital);
        }
        if let Some(capital) = self.bank_capital {
            config = config.bank_capital(capital);
        }
        if self.halt_on_market_failure {
            config = config.halt_on_market_failure(true);
        }
        if self.enforce_short_margin {
            config = config.enforce_short_margin(true);
        }
        config
    }
}
