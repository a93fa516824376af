//! Noise trader - generates baseline market activity.
//!
//! Trades one unit in a fixed direction at a fixed activity rate. The
//! direction comes from a persistent threshold draw that only refreshes
//! occasionally, so an individual noise trader acts as a steady buyer or
//! seller for stretches of ticks. Extreme threshold values additionally
//! dabble in slightly out-of-the-money options.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use types::{AgentId, Archetype, Tick};

use crate::book::{TraderBook, TraderParams};
use crate::traits::{Agent, MarketView};

/// Configuration for a noise trader.
#[derive(Debug, Clone)]
pub struct NoiseTraderConfig {
    /// Probability of trading each tick.
    pub activity: f64,
    /// Share volume per trade.
    pub volume: f64,
    /// Probability per tick of redrawing the direction threshold.
    pub threshold_refresh: f64,
    /// Threshold above which the trader also buys calls.
    pub call_threshold: f64,
    /// Threshold below which the trader also buys puts.
    pub put_threshold: f64,
    /// Option expiry is drawn per trader from `[min_expiry, max_expiry)`.
    pub min_expiry: Tick,
    pub max_expiry: Tick,
}

impl Default for NoiseTraderConfig {
    fn default() -> Self {
        Self {
            activity: 0.4,
            volume: 1.0,
            threshold_refresh: 0.01,
            call_threshold: 0.95,
            put_threshold: 0.05,
            min_expiry: 10,
            max_expiry: 25,
        }
    }
}

/// A random trader providing baseline order flow.
pub struct NoiseTrader {
    id: AgentId,
    config: NoiseTraderConfig,
    book: TraderBook,
    rng: StdRng,
    trading_threshold: f64,
    option_expiry: Tick,
}

impl NoiseTrader {
    pub fn new(id: AgentId, config: NoiseTraderConfig, params: TraderParams) -> Self {
        Self::with_rng(id, config, params, StdRng::from_os_rng())
    }

    /// Create a noise trader with a specific seed (for reproducible runs).
    pub fn with_seed(id: AgentId, config: NoiseTraderConfig, params: TraderParams, seed: u64) -> Self {
        Self::with_rng(id, config, params, StdRng::seed_from_u64(seed))
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, NoiseTraderConfig::default(), TraderParams::default())
    }

    fn with_rng(id: AgentId, config: NoiseTraderConfig, params: TraderParams, mut rng: StdRng) -> Self {
        let trading_threshold = rng.random::<f64>();
        let option_expiry = rng.random_range(config.min_expiry..config.max_expiry);
        Self {
            id,
            config,
            book: TraderBook::new(id, params),
            rng,
            trading_threshold,
            option_expiry,
        }
    }
}

impl Agent for NoiseTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::Noise
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn on_tick(&mut self, view: &MarketView<'_>) {
        if self.rng.random::<f64>() < self.config.activity {
            if self.trading_threshold > 0.5 {
                self.book.buy(self.config.volume, view);
            } else {
                self.book.sell(self.config.volume, view);
            }
        }
        self.book.flush_pending_shares();

        // The same persistent threshold drives option dabbling at its tails.
        if self.rng.random::<f64>() < self.config.activity {
            if self.trading_threshold > self.config.call_threshold {
                self.book.buy_call(self.option_expiry, view);
            } else if self.trading_threshold < self.config.put_threshold {
                self.book.buy_put(self.option_expiry, view);
            }
        }

        if self.rng.random::<f64>() <= self.config.threshold_refresh {
            self.trading_threshold = self.rng.random::<f64>();
        }
    }

    fn name(&self) -> &str {
        "NoiseTrader"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_view(prices: &[f64]) -> MarketView<'_> {
        let price = *prices.last().unwrap();
        MarketView {
            tick: (prices.len() - 1) as Tick,
            price,
            price_change: 0.0,
            interest_rate: 0.028,
            volatility: 0.3,
            projected_price: price,
            predicted_net_demand: 0.0,
            predicted_total_demand: 1_000_000.0,
            prices,
            market_failed: false,
        }
    }

    #[test]
    fn creation_draws_threshold_and_expiry() {
        let trader = NoiseTrader::with_seed(
            AgentId(1),
            NoiseTraderConfig::default(),
            TraderParams::default(),
            42,
        );
        assert!((0.0..1.0).contains(&trader.trading_threshold));
        assert!((10..25).contains(&trader.option_expiry));
        assert_eq!(trader.book().capital, 10_000.0);
    }

    #[test]
    fn always_active_trader_emits_one_unit_per_tick() {
        let prices = [15.0];
        let view = market_view(&prices);
        let config = NoiseTraderConfig {
            activity: 1.0,
            ..Default::default()
        };
        let mut trader = NoiseTrader::with_seed(AgentId(1), config, TraderParams::default(), 7);

        trader.on_tick(&view);

        let outbox = trader.book().outbox();
        assert_eq!(outbox.buy_volume + outbox.sell_volume, 1.0);
    }

    #[test]
    fn extreme_threshold_buys_a_call() {
        let prices = [15.0];
        let view = market_view(&prices);
        let config = NoiseTraderConfig {
            activity: 1.0,
            threshold_refresh: 0.0,
            ..Default::default()
        };
        let mut trader = NoiseTrader::with_seed(AgentId(1), config, TraderParams::default(), 7);
        trader.trading_threshold = 0.96;

        trader.on_tick(&view);

        assert_eq!(trader.book().outbox().calls_bought, 1);
        assert_eq!(trader.book().options.len(), 1);
    }

    #[test]
    fn same_seed_reproduces_the_same_flow() {
        let prices = [15.0];
        let view = market_view(&prices);
        let config = NoiseTraderConfig::default();
        let mut a = NoiseTrader::with_seed(AgentId(1), config.clone(), TraderParams::default(), 99);
        let mut b = NoiseTrader::with_seed(AgentId(1), config, TraderParams::default(), 99);

        for _ in 0..50 {
            a.on_tick(&view);
            b.on_tick(&view);
        }

        assert_eq!(a.book().outbox().buy_volume, b.book().outbox().buy_volume);
        assert_eq!(a.book().outbox().sell_volume, b.book().outbox().sell_volume);
        assert_eq!(a.trading_threshold, b.trading_threshold);
    }
}
