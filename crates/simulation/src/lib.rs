//! Agent-based market simulation engine.
//!
//! Assembles the participant population from a [`SimConfig`], wires the
//! opinion network, and advances the market tick by tick: opinions
//! spread, credit is served, options age, participants trade, the
//! aggregate order flow moves the price, and books revalue. One tick is
//! one simulated trading day.
//!
//! Price formation is linear impact: the price moves by net demand per
//! participant, scaled by the market-depth parameter lambda. There is no
//! order book; every trade fills at the current price, and the cost of
//! trading is the impact itself.
//!
//! # Example
//! ```
//! use simulation::{SimConfig, Simulation};
//!
//! let config = SimConfig::smoke().seed(42);
//! let mut sim = Simulation::new(config).expect("valid config");
//! let summary = sim.run(25);
//! assert!(summary.final_price >= 0.0);
//! ```
//!
//! With the `parallel` feature enabled, agent phases fan out over a
//! rayon thread pool; runs stay reproducible for a given seed because
//! every agent draws from its own RNG stream and results are collected
//! in slot order.

mod config;
mod market;
mod metrics;
mod parallel;
mod runner;
mod topology;

pub use config::{ConfigError, SimConfig};
pub use market::MarketState;
pub use metrics::{RunSummary, TickRecord};
pub use runner::Simulation;
pub use topology::OpinionGraph;
