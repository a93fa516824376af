//! Identifier and archetype types.
//!
//! Every participant gets a unique [`AgentId`] at setup; ids double as
//! deterministic RNG stream selectors, so they are stable across runs
//! with the same configuration.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation tick number (one tick = one simulated trading day).
pub type Tick = u64;

/// Unique identifier for a market participant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Display,
    From,
    Into,
)]
#[display("Agent({_0})")]
pub struct AgentId(pub u64);

impl AgentId {
    /// Raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

// =============================================================================
// Archetypes
// =============================================================================

/// Participant archetype tag.
///
/// Archetypes are a closed set; behavior lives in the corresponding
/// policy type, the tag is used for wiring, reporting and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Noise,
    Momentum,
    Fundamental,
    RetailInvestor,
    Initiator,
    HedgeFund,
    MarketMaker,
    Bank,
}

impl Archetype {
    /// Whether this archetype submits stock orders to the exchange.
    /// The initiator only shares opinions and the bank only lends.
    pub fn trades(self) -> bool {
        !matches!(self, Archetype::Initiator | Archetype::Bank)
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Noise => "noise",
            Archetype::Momentum => "momentum",
            Archetype::Fundamental => "fundamental",
            Archetype::RetailInvestor => "retail",
            Archetype::Initiator => "initiator",
            Archetype::HedgeFund => "hedge-fund",
            Archetype::MarketMaker => "market-maker",
            Archetype::Bank => "bank",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId(7).to_string(), "Agent(7)");
    }

    #[test]
    fn test_non_trading_archetypes() {
        assert!(!Archetype::Initiator.trades());
        assert!(!Archetype::Bank.trades());
        assert!(Archetype::Noise.trades());
        assert!(Archetype::MarketMaker.trades());
    }
}
