//! Retail investor - trades on social sentiment.
//!
//! Each investor starts with a private opinion drawn from a skewed range
//! and broadcasts it to its network every tick. Received opinions are
//! blended into the investor's own on a fixed cadence, so sentiment
//! diffuses outward from whoever is loudest. Once the warmup period ends
//! the investor converts its opinion into orders through the exponential
//! volume curve, with a small chance each tick of losing conviction and
//! flipping sides. Retail investors trade on credit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use types::{AgentId, Archetype, Tick};

use crate::book::{TraderBook, TraderParams};
use crate::credit::CreditTerms;
use crate::traits::{Agent, MarketView};

/// Configuration for a retail investor.
#[derive(Debug, Clone)]
pub struct RetailInvestorConfig {
    /// Tick after which opinions translate into trades.
    pub opinion_start_tick: Tick,
    /// Blend the network's mean opinion into our own every this many ticks.
    pub averaging_cadence: Tick,
    /// Probability per tick of flipping the opinion's sign.
    pub doubt_probability: f64,
    /// Initial opinion is drawn from `[min_opinion, max_opinion)`.
    pub min_opinion: f64,
    pub max_opinion: f64,
    /// Sensitivity is drawn per trader from `[min_sensitivity, max_sensitivity)`.
    pub min_sensitivity: f64,
    pub max_sensitivity: f64,
    /// Option expiry is drawn per trader from `[min_expiry, max_expiry)`.
    pub min_expiry: Tick,
    pub max_expiry: Tick,
}

impl Default for RetailInvestorConfig {
    fn default() -> Self {
        Self {
            opinion_start_tick: 20,
            averaging_cadence: 3,
            doubt_probability: 0.01,
            min_opinion: -2.0,
            max_opinion: 4.0,
            min_sensitivity: 2.0,
            max_sensitivity: 10.0,
            min_expiry: 10,
            max_expiry: 25,
        }
    }
}

/// A sentiment-driven trader embedded in the opinion network.
pub struct RetailInvestor {
    id: AgentId,
    config: RetailInvestorConfig,
    book: TraderBook,
    rng: StdRng,
    opinion: f64,
    sensitivity: f64,
    option_expiry: Tick,
    network_opinion: f64,
}

impl RetailInvestor {
    pub fn new(id: AgentId, config: RetailInvestorConfig, params: TraderParams) -> Self {
        Self::with_rng(id, config, params, StdRng::from_os_rng())
    }

    /// Create a retail investor with a specific seed (for reproducible runs).
    pub fn with_seed(id: AgentId, config: RetailInvestorConfig, params: TraderParams, seed: u64) -> Self {
        Self::with_rng(id, config, params, StdRng::seed_from_u64(seed))
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, RetailInvestorConfig::default(), TraderParams::default())
    }

    fn with_rng(id: AgentId, config: RetailInvestorConfig, params: TraderParams, mut rng: StdRng) -> Self {
        let opinion = rng.random_range(config.min_opinion..config.max_opinion);
        let sensitivity = rng.random_range(config.min_sensitivity..config.max_sensitivity);
        let option_expiry = rng.random_range(config.min_expiry..config.max_expiry);
        let terms = CreditTerms::draw(&mut rng);
        Self {
            id,
            config,
            book: TraderBook::new(id, params).with_credit(terms),
            rng,
            opinion,
            sensitivity,
            option_expiry,
            network_opinion: 0.0,
        }
    }

    /// Current opinion value.
    pub fn opinion(&self) -> f64 {
        self.opinion
    }
}

impl Agent for RetailInvestor {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::RetailInvestor
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn name(&self) -> &str {
        "RetailInvestor"
    }

    fn share_opinion(&mut self, _view: &MarketView<'_>) -> Option<f64> {
        Some(self.opinion)
    }

    fn on_opinions(&mut self, opinions: &[f64], _view: &MarketView<'_>) {
        self.network_opinion = MarketView::mean_opinion(opinions).unwrap_or(0.0);
    }

    fn on_tick(&mut self, view: &MarketView<'_>) {
        if view.tick > self.config.opinion_start_tick {
            if self.rng.random::<f64>() < self.config.doubt_probability {
                self.opinion = -self.opinion;
            }
            self.book
                .trade_on_opinion(self.opinion, self.sensitivity, self.option_expiry, view);
            if self.network_opinion != 0.0 && view.tick % self.config.averaging_cadence == 0 {
                self.opinion = (self.network_opinion + self.opinion) / 2.0;
            }
        }
        self.book.flush_pending_shares();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(tick: Tick, prices: &[f64]) -> MarketView<'_> {
        MarketView {
            tick,
            price: *prices.last().unwrap(),
            price_change: 0.0,
            interest_rate: 0.02,
            volatility: 0.15,
            projected_price: *prices.last().unwrap(),
            predicted_net_demand: 0.0,
            predicted_total_demand: 0.0,
            prices,
            market_failed: false,
        }
    }

    fn investor(seed: u64) -> RetailInvestor {
        RetailInvestor::with_seed(AgentId(1), RetailInvestorConfig::default(), TraderParams::default(), seed)
    }

    #[test]
    fn initial_draws_fall_in_configured_ranges() {
        for seed in 0..50 {
            let trader = investor(seed);
            assert!(trader.opinion >= -2.0 && trader.opinion < 4.0);
            assert!(trader.sensitivity >= 2.0 && trader.sensitivity < 10.0);
            assert!(trader.option_expiry >= 10 && trader.option_expiry < 25);
        }
    }

    #[test]
    fn broadcasts_own_opinion_every_tick() {
        let prices = vec![10.0];
        let mut trader = investor(7);
        let expected = trader.opinion;
        let view = view_at(1, &prices);
        assert_eq!(trader.share_opinion(&view), Some(expected));
        let view = view_at(2, &prices);
        assert_eq!(trader.share_opinion(&view), Some(expected));
    }

    #[test]
    fn stays_inert_during_warmup() {
        let prices = vec![10.0];
        let mut trader = investor(3);
        trader.opinion = 20.0;
        let view = view_at(10, &prices);
        trader.on_tick(&view);
        assert!(trader.book.outbox().is_empty());
    }

    #[test]
    fn maximal_opinion_buys_full_volume() {
        let prices = vec![10.0];
        let mut trader = investor(11);
        trader.config.doubt_probability = 0.0;
        trader.opinion = 20.0;
        let view = view_at(25, &prices);
        trader.on_tick(&view);
        assert_eq!(trader.book.outbox().buy_volume, 10.0);
        assert_eq!(trader.book.shares, 10.0);
    }

    #[test]
    fn negative_opinion_sells() {
        let prices = vec![10.0];
        let mut trader = investor(13);
        trader.config.doubt_probability = 0.0;
        trader.opinion = -20.0;
        let view = view_at(25, &prices);
        trader.on_tick(&view);
        let outbox = trader.book.outbox();
        assert_eq!(outbox.sell_volume, 10.0);
        assert_eq!(outbox.short_volume, 10.0);
    }

    #[test]
    fn blends_network_opinion_on_cadence() {
        let prices = vec![10.0];
        let mut trader = investor(17);
        trader.config.doubt_probability = 0.0;
        trader.opinion = 2.0;

        let view = view_at(25, &prices);
        trader.on_opinions(&[6.0, 10.0], &view);
        assert_eq!(trader.network_opinion, 8.0);

        // Tick 25 is off-cadence, opinion holds.
        trader.on_tick(&view);
        assert_eq!(trader.opinion, 2.0);

        // Tick 27 is on-cadence, opinion moves halfway to the mean.
        let view = view_at(27, &prices);
        trader.on_tick(&view);
        assert_eq!(trader.opinion, 5.0);
    }

    #[test]
    fn doubt_flips_opinion_sign() {
        let prices = vec![10.0];
        let mut trader = investor(19);
        trader.config.doubt_probability = 1.0;
        trader.opinion = 3.0;
        let view = view_at(25, &prices);
        trader.on_tick(&view);
        assert_eq!(trader.opinion, -3.0);
    }
}
