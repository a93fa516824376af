//! The single lender backing all credit-enabled traders.
//!
//! The bank sits outside the trading population: it emits no orders and
//! holds no inventory, it only pools repayments back into lendable capital
//! and allocates new loans in request arrival order.

use types::{BorrowOutcome, BorrowRequest, LoanRepayment};

/// Configuration for the bank.
#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Lendable capital at creation.
    pub initial_capital: f64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000_000.0,
        }
    }
}

/// Lender state: free capital, outstanding loans, and interest income.
#[derive(Debug, Clone)]
pub struct Bank {
    capital_to_lend: f64,
    money_lent: f64,
    profit_from_interest: f64,
}

impl Bank {
    pub fn new(config: BankConfig) -> Self {
        Self {
            capital_to_lend: config.initial_capital,
            money_lent: 0.0,
            profit_from_interest: 0.0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(BankConfig::default())
    }

    /// Capital currently available for new loans.
    pub fn available_capital(&self) -> f64 {
        self.capital_to_lend
    }

    /// Principal currently out with borrowers.
    pub fn outstanding_loans(&self) -> f64 {
        self.money_lent
    }

    /// Cumulative interest received.
    pub fn interest_profit(&self) -> f64 {
        self.profit_from_interest
    }

    /// Fold this tick's repayments back into lendable capital.
    pub fn collect_repayments(&mut self, repayments: &[LoanRepayment]) {
        for repayment in repayments {
            self.capital_to_lend += repayment.principal + repayment.interest;
            self.profit_from_interest += repayment.interest;
            self.money_lent -= repayment.principal;
        }
    }

    /// Allocate this tick's borrow requests in arrival order.
    ///
    /// Each request receives `min(amount, available)`; once capital runs
    /// out the remaining requests receive zero.
    pub fn process_requests(&mut self, requests: &[BorrowRequest]) -> Vec<BorrowOutcome> {
        requests
            .iter()
            .map(|request| {
                let granted = if self.capital_to_lend <= 0.0 {
                    0.0
                } else {
                    let granted = request.amount.min(self.capital_to_lend);
                    self.money_lent += granted;
                    self.capital_to_lend -= granted;
                    granted
                };
                BorrowOutcome {
                    borrower: request.borrower,
                    granted,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::AgentId;

    fn request(id: u64, amount: f64) -> BorrowRequest {
        BorrowRequest {
            borrower: AgentId(id),
            amount,
        }
    }

    #[test]
    fn lends_up_to_available_capital_in_arrival_order() {
        let mut bank = Bank::new(BankConfig {
            initial_capital: 1_000_000.0,
        });

        let outcomes = bank.process_requests(&[
            request(1, 600_000.0),
            request(2, 600_000.0),
            request(3, 100.0),
        ]);

        assert_eq!(outcomes[0].granted, 600_000.0);
        assert_eq!(outcomes[1].granted, 400_000.0);
        assert_eq!(outcomes[2].granted, 0.0);
        // The whole round allocated exactly the capital available before it.
        let total: f64 = outcomes.iter().map(|o| o.granted).sum();
        assert_eq!(total, 1_000_000.0);
        assert_eq!(bank.available_capital(), 0.0);
        assert_eq!(bank.outstanding_loans(), 1_000_000.0);
    }

    #[test]
    fn repayments_replenish_lendable_capital() {
        let mut bank = Bank::new(BankConfig {
            initial_capital: 1_000.0,
        });
        bank.process_requests(&[request(1, 1_000.0)]);
        assert_eq!(bank.available_capital(), 0.0);

        bank.collect_repayments(&[LoanRepayment {
            borrower: AgentId(1),
            principal: 400.0,
            interest: 12.0,
        }]);

        assert_eq!(bank.available_capital(), 412.0);
        assert_eq!(bank.outstanding_loans(), 600.0);
        assert_eq!(bank.interest_profit(), 12.0);
    }

    #[test]
    fn exhausted_bank_refuses_every_request() {
        let mut bank = Bank::new(BankConfig {
            initial_capital: 0.0,
        });

        let outcomes = bank.process_requests(&[request(1, 50.0), request(2, 50.0)]);

        assert!(outcomes.iter().all(|o| o.granted == 0.0));
        assert_eq!(bank.outstanding_loans(), 0.0);
    }

    #[test]
    fn defaults_match_the_reference_setup() {
        let bank = Bank::with_defaults();
        assert_eq!(bank.available_capital(), 10_000_000.0);
        assert_eq!(bank.interest_profit(), 0.0);
    }
}
