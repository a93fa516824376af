//! Hedge fund - runs a staged short campaign against the asset.
//!
//! The fund opens a fixed short at its entry tick, doubles down if the
//! price squeezes past the second-short multiple, and starts covering
//! when the price reaches either the forced-cover multiple or the
//! stop-loss floor. Covering proceeds at a fixed volume per tick so the
//! exit itself does not shock the market, and once the campaign has
//! closed the fund never re-enters.

use types::{AgentId, Archetype, Tick};

use crate::book::{TraderBook, TraderParams};
use crate::traits::{Agent, MarketView};

/// Phases of the short campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignState {
    /// Waiting for the entry tick.
    Shorting,
    /// First short is open.
    Holding,
    /// Doubled down after a squeeze.
    SecondShort,
    /// Covering the position; terminal.
    Covered,
}

/// Configuration for a hedge fund.
#[derive(Debug, Clone)]
pub struct HedgeFundConfig {
    /// Tick at which the first short opens.
    pub entry_tick: Tick,
    /// Volume of each short leg.
    pub entry_volume: f64,
    /// Price multiple of the entry price that triggers the second short.
    pub second_short_multiple: f64,
    /// Price multiple of the entry price that forces covering.
    pub cover_multiple: f64,
    /// Price multiple of the entry price below which the fund takes profit.
    pub stop_multiple: f64,
    /// Shares bought back per tick while covering.
    pub cover_volume: f64,
}

impl Default for HedgeFundConfig {
    fn default() -> Self {
        Self {
            entry_tick: 5,
            entry_volume: 100.0,
            second_short_multiple: 1.5,
            cover_multiple: 2.0,
            stop_multiple: 0.5,
            cover_volume: 25.0,
        }
    }
}

/// A large short seller with a staged exit.
pub struct HedgeFund {
    id: AgentId,
    config: HedgeFundConfig,
    book: TraderBook,
    state: CampaignState,
    entry_price: f64,
}

impl HedgeFund {
    pub fn new(id: AgentId, config: HedgeFundConfig, params: TraderParams) -> Self {
        Self {
            id,
            config,
            book: TraderBook::new(id, params),
            state: CampaignState::Shorting,
            entry_price: 0.0,
        }
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, HedgeFundConfig::default(), TraderParams::default())
    }

    /// Current phase of the campaign.
    pub fn state(&self) -> CampaignState {
        self.state
    }

    fn cover_triggered(&self, price: f64) -> bool {
        price >= self.entry_price * self.config.cover_multiple
            || price <= self.entry_price * self.config.stop_multiple
    }

    fn cover_step(&mut self, view: &MarketView<'_>) {
        if self.book.has_short_position() {
            let volume = self.config.cover_volume.min(-self.book.shares);
            self.book.buy(volume, view);
        }
    }
}

impl Agent for HedgeFund {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::HedgeFund
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn name(&self) -> &str {
        "HedgeFund"
    }

    fn on_tick(&mut self, view: &MarketView<'_>) {
        match self.state {
            CampaignState::Shorting => {
                if view.tick >= self.config.entry_tick {
                    self.entry_price = view.price;
                    self.book.sell(self.config.entry_volume, view);
                    self.state = CampaignState::Holding;
                }
            }
            CampaignState::Holding => {
                if self.cover_triggered(view.price) {
                    self.state = CampaignState::Covered;
                    self.cover_step(view);
                } else if view.price >= self.entry_price * self.config.second_short_multiple {
                    self.book.sell(self.config.entry_volume, view);
                    self.state = CampaignState::SecondShort;
                }
            }
            CampaignState::SecondShort => {
                if self.cover_triggered(view.price) {
                    self.state = CampaignState::Covered;
                    self.cover_step(view);
                }
            }
            CampaignState::Covered => {
                self.cover_step(view);
            }
        }
        self.book.flush_pending_shares();
    }
}
