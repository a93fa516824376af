//! Agent trait and the per-tick market view.
//!
//! This module defines the core `Agent` trait that every market participant
//! implements, plus the read-only `MarketView` snapshot handed to agents each
//! phase.
//!
//! # Phase hooks
//!
//! The tick driver invokes agents through a small set of hooks, one per phase
//! in which agents act:
//! - `share_opinion` / `on_opinions` during the opinion phase,
//! - `on_tick` during the trading-decision phase,
//! - `on_options_written` when option purchase notices are routed to the
//!   market maker,
//! - `revalue` during the end-of-tick revaluation phase.
//!
//! Credit and option-aging phases operate on the agent's [`TraderBook`]
//! directly, so they need no hook here.
//!
//! # State Management
//!
//! All agents must provide access to their `TraderBook` via `book()` /
//! `book_mut()`. This gives the driver a uniform handle on cash, inventory,
//! the option book, and order emission without knowing the archetype.

use types::{AgentId, Archetype, OptionBought, Tick};

use crate::book::TraderBook;

/// Read-only snapshot of shared market state for one tick phase.
///
/// Built once per phase by the tick driver and passed by reference; agents
/// cannot store it. `prices` is the append-only price history keyed by tick,
/// where `prices[t]` is the traded price at the start of tick `t`. The last
/// entry always equals `price`.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    /// Current tick index.
    pub tick: Tick,
    /// Traded price published by the most recent price-formation step.
    pub price: f64,
    /// Price change applied by the most recent price-formation step.
    pub price_change: f64,
    /// Current annualized risk-free rate.
    pub interest_rate: f64,
    /// Current annualized volatility estimate used for option pricing.
    pub volatility: f64,
    /// Price projected a few ticks ahead from the fitted price curve.
    pub projected_price: f64,
    /// Net demand forecast at the current tick (0 with insufficient history).
    pub predicted_net_demand: f64,
    /// Average total demand over recent ticks (large sentinel when unknown).
    pub predicted_total_demand: f64,
    /// Full price history, one entry per tick.
    pub prices: &'a [f64],
    /// True once a price update had to be clamped at zero.
    pub market_failed: bool,
}

impl MarketView<'_> {
    /// Mean of the opinions received this tick, or `None` when empty.
    pub fn mean_opinion(opinions: &[f64]) -> Option<f64> {
        if opinions.is_empty() {
            None
        } else {
            Some(opinions.iter().sum::<f64>() / opinions.len() as f64)
        }
    }
}

/// The core trait that all market participants implement.
///
/// Agents are invoked once per phase per tick by the driver. Each hook
/// receives a fresh `MarketView`; any orders an agent wants to place go
/// through its book's `buy`/`sell`/`buy_option` capabilities, which record
/// the order flow for aggregation at the price-formation step.
pub trait Agent: Send {
    /// Unique identifier for this agent.
    fn id(&self) -> AgentId;

    /// Which archetype this agent belongs to.
    fn archetype(&self) -> Archetype;

    /// Shared trading state (cash, inventory, options, loan, order outbox).
    fn book(&self) -> &TraderBook;

    /// Mutable access to the shared trading state.
    fn book_mut(&mut self) -> &mut TraderBook;

    /// Opinion phase: the value to broadcast to opinion-link neighbours,
    /// or `None` for agents outside the opinion network.
    fn share_opinion(&mut self, _view: &MarketView<'_>) -> Option<f64> {
        None
    }

    /// Opinion phase delivery: all opinions broadcast by neighbours this tick.
    fn on_opinions(&mut self, _opinions: &[f64], _view: &MarketView<'_>) {
        // Default: not on the opinion network
    }

    /// Trading-decision phase. Settled option shares are flushed here and any
    /// new orders are emitted through the book.
    fn on_tick(&mut self, view: &MarketView<'_>);

    /// Delivery of option purchase notices from the previous tick. Only the
    /// market maker, as the counterparty writing every contract, acts on it.
    fn on_options_written(&mut self, _sold: &[OptionBought], _view: &MarketView<'_>) {
        // Default: no-op
    }

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "Agent"
    }

    /// Whether this agent is a market maker (exempt from short-sale margin
    /// checks when those are enforced).
    fn is_market_maker(&self) -> bool {
        false
    }

    /// Revaluation phase: rebalance the delta hedge at the new price, accrue
    /// interest on cash, and recompute portfolio value. Hedge orders emitted
    /// here join the next tick's aggregation.
    fn revalue(&mut self, view: &MarketView<'_>) {
        self.book_mut().rebalance_hedge(view);
        self.book_mut().accrue_cash_interest(view);
        self.book_mut().update_portfolio_value(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_opinion_of_empty_slice_is_none() {
        assert_eq!(MarketView::mean_opinion(&[]), None);
    }

    #[test]
    fn mean_opinion_averages() {
        assert_eq!(MarketView::mean_opinion(&[2.0, 4.0]), Some(3.0));
    }
}
