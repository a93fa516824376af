//! Momentum trader - moving-average crossover with retail sentiment.
//!
//! Buys when the short-window moving average sits above the long-window
//! one, sells in the opposite case, both behind a probability gate. The
//! archetype also sits downstream of the retail opinion network and trades
//! the received sentiment at a reduced sensitivity, which is what lets a
//! squeeze spill over from the retail crowd into systematic flow.
//!
//! Momentum traders fund cash deficits through the bank.

use quant::moving_average;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use types::{AgentId, Archetype, Tick};

use crate::book::{TraderBook, TraderParams};
use crate::credit::CreditTerms;
use crate::traits::{Agent, MarketView};

/// Configuration for a momentum trader.
#[derive(Debug, Clone)]
pub struct MomentumTraderConfig {
    /// Short moving-average window in ticks.
    pub short_window: usize,
    /// Long moving-average window in ticks; also the warmup gate.
    pub long_window: usize,
    /// Probability of acting on a crossover signal each tick.
    pub activity: f64,
    /// Share volume per crossover trade.
    pub volume: f64,
    /// Scale the crossover volume by the divergence between the averages.
    pub scale_with_divergence: bool,
    /// Probability of dabbling in options each tick.
    pub option_activity: f64,
    /// Fresh draw above this buys a call, below `put_threshold` a put.
    pub call_threshold: f64,
    pub put_threshold: f64,
    /// Option expiry is drawn per trader from `[min_expiry, max_expiry)`.
    pub min_expiry: Tick,
    pub max_expiry: Tick,
    /// Sensitivity applied to received retail sentiment.
    pub opinion_sensitivity: f64,
    /// Tick after which sentiment is acted upon.
    pub opinion_start_tick: Tick,
}

impl Default for MomentumTraderConfig {
    fn default() -> Self {
        Self {
            short_window: 7,
            long_window: 21,
            activity: 0.1,
            volume: 1.0,
            scale_with_divergence: false,
            option_activity: 0.4,
            call_threshold: 0.95,
            put_threshold: 0.05,
            min_expiry: 10,
            max_expiry: 25,
            opinion_sensitivity: 2.0,
            opinion_start_tick: 20,
        }
    }
}

/// A moving-average crossover trader.
pub struct MomentumTrader {
    id: AgentId,
    config: MomentumTraderConfig,
    book: TraderBook,
    rng: StdRng,
    option_expiry: Tick,
    short_ma: f64,
    long_ma: f64,
    network_opinion: f64,
}

impl MomentumTrader {
    pub fn new(id: AgentId, config: MomentumTraderConfig, params: TraderParams) -> Self {
        Self::with_rng(id, config, params, StdRng::from_os_rng())
    }

    /// Create a momentum trader with a specific seed (for reproducible runs).
    pub fn with_seed(
        id: AgentId,
        config: MomentumTraderConfig,
        params: TraderParams,
        seed: u64,
    ) -> Self {
        Self::with_rng(id, config, params, StdRng::seed_from_u64(seed))
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, MomentumTraderConfig::default(), TraderParams::default())
    }

    fn with_rng(
        id: AgentId,
        config: MomentumTraderConfig,
        params: TraderParams,
        mut rng: StdRng,
    ) -> Self {
        let option_expiry = rng.random_range(config.min_expiry..config.max_expiry);
        let terms = CreditTerms::draw(&mut rng);
        Self {
            id,
            config,
            book: TraderBook::new(id, params).with_credit(terms),
            rng,
            option_expiry,
            short_ma: 0.0,
            long_ma: 0.0,
            network_opinion: 0.0,
        }
    }

    fn crossover_volume(&self) -> f64 {
        if self.config.scale_with_divergence && self.long_ma > 0.0 {
            let divergence = (self.short_ma - self.long_ma).abs() / self.long_ma;
            (self.config.volume * (1.0 + divergence))
                .floor()
                .max(self.config.volume)
        } else {
            self.config.volume
        }
    }
}

impl Agent for MomentumTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::Momentum
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn on_opinions(&mut self, opinions: &[f64], _view: &MarketView<'_>) {
        self.network_opinion = MarketView::mean_opinion(opinions).unwrap_or(0.0);
    }

    fn on_tick(&mut self, view: &MarketView<'_>) {
        if view.tick > self.config.long_window as Tick {
            if let (Some(short), Some(long)) = (
                moving_average(view.prices, self.config.short_window),
                moving_average(view.prices, self.config.long_window),
            ) {
                self.short_ma = short;
                self.long_ma = long;
                let draw = self.rng.random::<f64>();
                if draw < self.config.activity {
                    let volume = self.crossover_volume();
                    if short > long {
                        self.book.buy(volume, view);
                    } else if short < long {
                        self.book.sell(volume, view);
                    }
                }
            }
        }
        self.book.flush_pending_shares();

        if view.tick > self.config.opinion_start_tick && self.network_opinion != 0.0 {
            self.book.trade_on_opinion(
                self.network_opinion,
                self.config.opinion_sensitivity,
                self.option_expiry,
                view,
            );
        }

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
        "MomentumTrader"
    }
}
