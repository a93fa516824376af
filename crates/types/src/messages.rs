//! Messages exchanged between participants.
//!
//! The simulation routes these over three relations: opinion links
//! (sentiment broadcast), borrow links (credit requests and
//! repayments), and trade links (option purchases reported to the
//! market maker). Every message lives at most one tick; the runner
//! drains each queue at the phase boundary that consumes it.

use crate::ids::AgentId;
use crate::option::OptionContract;
use serde::{Deserialize, Serialize};

/// A scalar sentiment value broadcast on the opinion graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpinionShared {
    pub from: AgentId,
    pub opinion: f64,
}

/// Request to draw `amount` of fresh credit from the bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub borrower: AgentId,
    pub amount: f64,
}

/// A scheduled repayment delivered to the bank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRepayment {
    pub borrower: AgentId,
    pub principal: f64,
    pub interest: f64,
}

/// The bank's answer to a [`BorrowRequest`]. `granted` may be less
/// than the requested amount, down to zero when the lendable pool is
/// exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorrowOutcome {
    pub borrower: AgentId,
    pub granted: f64,
}

/// Notice that a participant bought an option contract; delivered to
/// the market maker, which writes the contract and hedges the stock
/// leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionBought {
    pub buyer: AgentId,
    pub contract: OptionContract,
}
