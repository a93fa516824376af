//! Core types for the swarm-market simulation.
//!
//! This crate provides the shared data types used across the
//! simulation: participant identifiers and archetype tags, option
//! contracts, loan accounting, and the messages exchanged over the
//! simulation's relations.
//!
//! All monetary and volume quantities are `f64`: the market model is
//! a continuous dynamical system (price impact, Black-Scholes
//! valuation, polynomial forecasting), and participants may trade
//! fractional volumes.

pub mod ids;
pub mod loan;
pub mod messages;
pub mod option;

pub use ids::{AgentId, Archetype, Tick};
pub use loan::Loan;
pub use messages::{BorrowOutcome, BorrowRequest, LoanRepayment, OpinionShared, OptionBought};
pub use option::{OptionContract, OptionKind};
