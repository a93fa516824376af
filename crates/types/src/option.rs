//! Option contracts.
//!
//! Contracts are European, single-underlying, and cash-settled at
//! expiry. Each contract covers a fixed multiplier of underlying
//! shares (configured at the simulation level); valuation lives in the
//! `quant` crate, this type only carries position data and intrinsic
//! arithmetic.

use crate::ids::Tick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    #[inline]
    pub fn is_call(self) -> bool {
        matches!(self, OptionKind::Call)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Call => write!(f, "call"),
            OptionKind::Put => write!(f, "put"),
        }
    }
}

/// An open option position.
///
/// `spot_at_purchase` and `premium` are recorded at purchase time and
/// feed the finite-difference hedge ratio. `ticks_to_expiry` strictly
/// decreases by one per tick; the holder settles and removes the
/// contract exactly once, on the tick the countdown reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub kind: OptionKind,
    pub strike: f64,
    pub ticks_to_expiry: Tick,
    pub spot_at_purchase: f64,
    pub premium: f64,
}

impl OptionContract {
    pub fn new(
        kind: OptionKind,
        strike: f64,
        ticks_to_expiry: Tick,
        spot_at_purchase: f64,
        premium: f64,
    ) -> Self {
        Self {
            kind,
            strike,
            ticks_to_expiry,
            spot_at_purchase,
            premium,
        }
    }

    /// Intrinsic value of the whole contract at the given spot.
    pub fn intrinsic_value(&self, spot: f64, multiplier: f64) -> f64 {
        let per_share = match self.kind {
            OptionKind::Call => (spot - self.strike).max(0.0),
            OptionKind::Put => (self.strike - spot).max(0.0),
        };
        per_share * multiplier
    }

    /// Whether exercising at the given spot pays anything.
    pub fn in_the_money(&self, spot: f64) -> bool {
        match self.kind {
            OptionKind::Call => spot > self.strike,
            OptionKind::Put => spot < self.strike,
        }
    }

    /// Share flow implied by settlement: the holder of an expiring
    /// in-the-money call acquires `multiplier` shares, a put holder
    /// delivers them. Out-of-the-money contracts imply no flow.
    pub fn settlement_shares(&self, spot: f64, multiplier: f64) -> f64 {
        if !self.in_the_money(spot) {
            return 0.0;
        }
        match self.kind {
            OptionKind::Call => multiplier,
            OptionKind::Put => -multiplier,
        }
    }

    /// Decrement remaining life by one tick. Returns `true` when the
    /// countdown has just reached zero and the contract must settle.
    pub fn tick_down(&mut self) -> bool {
        debug_assert!(self.ticks_to_expiry > 0, "expired contract not removed");
        self.ticks_to_expiry = self.ticks_to_expiry.saturating_sub(1);
        self.ticks_to_expiry == 0
    }
}
