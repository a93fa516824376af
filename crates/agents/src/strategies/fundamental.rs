//! Fundamental trader - RSI mean reversion.
//!
//! Computes a Relative Strength Index over the trailing price window and
//! fades extremes: sells when the market looks overbought, buys when it
//! looks oversold. Like the other systematic archetypes it occasionally
//! dabbles in slightly out-of-the-money options.

use quant::relative_strength_index;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use types::{AgentId, Archetype, Tick};

use crate::book::{TraderBook, TraderParams};
use crate::traits::{Agent, MarketView};

/// Configuration for a fundamental trader.
#[derive(Debug, Clone)]
pub struct FundamentalTraderConfig {
    /// RSI lookback window in ticks; also the warmup gate.
    pub rsi_period: usize,
    /// RSI above this sells.
    pub overbought: f64,
    /// RSI below this buys.
    pub oversold: f64,
    /// Probability of acting on an RSI signal each tick.
    pub activity: f64,
    /// Share volume per signal trade.
    pub volume: f64,
    /// Probability of dabbling in options each tick.
    pub option_activity: f64,
    /// Fresh draw above this buys a call, below `put_threshold` a put.
    pub call_threshold: f64,
    pub put_threshold: f64,
    /// Option expiry is drawn per trader from `[min_expiry, max_expiry)`.
    pub min_expiry: Tick,
    pub max_expiry: Tick,
}

impl Default for FundamentalTraderConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
            activity: 0.1,
            volume: 1.0,
            option_activity: 0.4,
            call_threshold: 0.95,
            put_threshold: 0.05,
            min_expiry: 10,
            max_expiry: 25,
        }
    }
}

/// An RSI mean-reversion trader.
pub struct FundamentalTrader {
    id: AgentId,
    config: FundamentalTraderConfig,
    book: TraderBook,
    rng: StdRng,
    option_expiry: Tick,
    rsi: f64,
}

impl FundamentalTrader {
    pub fn new(id: AgentId, config: FundamentalTraderConfig, params: TraderParams) -> Self {
        Self::with_rng(id, config, params, StdRng::from_os_rng())
    }

    /// Create a fundamental trader with a specific seed (for reproducible runs).
    pub fn with_seed(
        id: AgentId,
        config: FundamentalTraderConfig,
        params: TraderParams,
        seed: u64,
    ) -> Self {
        Self::with_rng(id, config, params, StdRng::seed_from_u64(seed))
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, FundamentalTraderConfig::default(), TraderParams::default())
    }

    fn with_rng(
        id: AgentId,
        config: FundamentalTraderConfig,
        params: TraderParams,
        mut rng: StdRng,
    ) -> Self {
        let option_expiry = rng.random_range(config.min_expiry..config.max_expiry);
        Self {
            id,
            config,
            book: TraderBook::new(id, params),
            rng,
            option_expiry,
            rsi: 50.0,
        }
    }

    /// Last RSI value acted on.
    pub fn rsi(&self) -> f64 {
        self.rsi
    }
}

impl Agent for FundamentalTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::Fundamental
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn on_tick(&mut self, view: &MarketView<'_>) {
        if view.tick > self.config.rsi_period as Tick {
            if let Some(rsi) = relative_strength_index(view.prices, self.config.rsi_period) {
                self.rsi = rsi;
                if self.rng.random::<f64>() < self.config.activity {
                    if rsi > self.config.overbought {
                        self.book.sell(self.config.volume, view);
                    } else if rsi < self.config.oversold {
                        self.book.buy(self.config.volume, view);
                    }
                }
            }
        }
        self.book.flush_pending_shares();

        let threshold = self.rng.random::<f64>();
        if self.rng.random::<f64>() < self.config.option_activity {
            if threshold > self.config.call_threshold {
                self.book.buy_call(self.option_expiry, view);
            } else if threshold < self.config.put_threshold {
                self.book.buy_put(self.option_expiry, view);
            }
        }
    }

    fn name(&self) -> &str {
        "FundamentalTrader"
    }
}
