//! Opinion initiator - seeds the network with a coordinated campaign.
//!
//! Broadcasts the maximum positive opinion to its neighbours every tick
//! until the reversal tick, then the maximum negative opinion thereafter.
//! The initiator never submits orders; its only effect on the market is
//! through the sentiment it injects.

use types::{AgentId, Archetype};

use crate::book::{TraderBook, TraderParams};
use crate::traits::{Agent, MarketView};

/// Configuration for an opinion initiator.
#[derive(Debug, Clone)]
pub struct InitiatorConfig {
    /// Magnitude of the broadcast opinion.
    pub strength: f64,
    /// Last tick of the positive campaign. After this the sign flips.
    pub reversal_tick: types::Tick,
}

impl Default for InitiatorConfig {
    fn default() -> Self {
        Self {
            strength: 20.0,
            reversal_tick: 100,
        }
    }
}

/// The source node of the opinion network.
pub struct Initiator {
    id: AgentId,
    config: InitiatorConfig,
    book: TraderBook,
}

impl Initiator {
    pub fn new(id: AgentId, config: InitiatorConfig) -> Self {
        Self {
            id,
            config,
            book: TraderBook::new(id, TraderParams::default()),
        }
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, InitiatorConfig::default())
    }
}

impl Agent for Initiator {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::Initiator
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn name(&self) -> &str {
        "Initiator"
    }

    fn share_opinion(&mut self, view: &MarketView<'_>) -> Option<f64> {
        if view.tick <= self.config.reversal_tick {
            Some(self.config.strength)
        } else {
            Some(-self.config.strength)
        }
    }

    fn on_tick(&mut self, _view: &MarketView<'_>) {}
}
