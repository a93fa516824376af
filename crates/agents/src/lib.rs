//! Agents crate: market participants for the swarm market simulator.
//!
//! This crate provides:
//! - The `Agent` trait every participant implements
//! - `MarketView`, the per-tick snapshot agents decide on
//! - `TraderBook`, the shared position/cash/option bookkeeping
//! - Credit plumbing (`CreditTerms`) and the `Bank` that serves it
//! - Concrete participant archetypes (`strategies` module)
//!
//! # Architecture
//! Agents receive a `MarketView` each tick and record their trades in
//! their own `TraderBook` outbox. The simulation drains the outboxes,
//! aggregates order flow into a price update, and routes option and
//! borrow messages between participants.
//!
//! # Archetypes
//! - [`strategies::NoiseTrader`] - random baseline order flow
//! - [`strategies::MomentumTrader`] - moving-average crossover
//! - [`strategies::FundamentalTrader`] - RSI mean reversion
//! - [`strategies::RetailInvestor`] - opinion-network trading on credit
//! - [`strategies::Initiator`] - seeds the opinion network, never trades
//! - [`strategies::HedgeFund`] - staged short campaign
//! - [`strategies::MarketMaker`] - imbalance absorption and option writing
//!
//! # Example
//! ```ignore
//! use agents::{Agent, MarketView};
//! use agents::strategies::NoiseTrader;
//! use types::AgentId;
//!
//! let mut trader = NoiseTrader::with_defaults(AgentId(1));
//! let view = MarketView { /* built by the simulation */ };
//! trader.on_tick(&view);
//! let orders = trader.book_mut().take_outbox();
//! ```

mod bank;
mod book;
mod credit;
pub mod strategies;
mod traits;

pub use bank::{Bank, BankConfig};
pub use book::{TraderBook, TraderOutbox, TraderParams};
pub use credit::CreditTerms;
pub use strategies::{
    CampaignState, FundamentalTrader, FundamentalTraderConfig, HedgeFund, HedgeFundConfig,
    Initiator, InitiatorConfig, MarketMaker, MarketMakerConfig, MomentumTrader,
    MomentumTraderConfig, NoiseTrader, NoiseTraderConfig, RetailInvestor, RetailInvestorConfig,
};
pub use traits::{Agent, MarketView};
