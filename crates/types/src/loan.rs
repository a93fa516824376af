//! Borrower loan accounting.
//!
//! One loan per borrower, single lender. Principal and accrued
//! interest never go negative; every repayment is capped at what is
//! actually owed.

use serde::{Deserialize, Serialize};

/// Outstanding borrowings of a single participant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Loan {
    principal: f64,
    accrued_interest: f64,
}

impl Loan {
    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn accrued_interest(&self) -> f64 {
        self.accrued_interest
    }

    /// Principal plus accrued interest.
    pub fn outstanding(&self) -> f64 {
        self.principal + self.accrued_interest
    }

    pub fn is_clear(&self) -> bool {
        self.outstanding() == 0.0
    }

    /// Add a new draw to the principal. Negative amounts are ignored.
    pub fn draw(&mut self, amount: f64) {
        debug_assert!(amount >= 0.0, "loan draw must be non-negative");
        self.principal += amount.max(0.0);
    }

    /// Accrue one day of interest on the outstanding principal at the
    /// given annual rate.
    pub fn accrue_daily(&mut self, annual_rate: f64) {
        self.accrued_interest += self.principal * annual_rate / 365.0;
    }

    /// Pay down accrued interest. Returns the amount actually paid
    /// (capped at what is owed; non-positive offers pay nothing).
    pub fn pay_interest(&mut self, amount: f64) -> f64 {
        let paid = amount.max(0.0).min(self.accrued_interest);
        self.accrued_interest -= paid;
        paid
    }

    /// Pay down principal. Returns the amount actually paid (capped at
    /// the outstanding principal; non-positive offers pay nothing).
    pub fn pay_principal(&mut self, amount: f64) -> f64 {
        let paid = amount.max(0.0).min(self.principal);
        self.principal -= paid;
        paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_and_outstanding() {
        let mut loan = Loan::default();
        loan.draw(1000.0);
        loan.draw(500.0);
        assert_eq!(loan.principal(), 1500.0);
        assert_eq!(loan.outstanding(), 1500.0);
    }

    #[test]
    fn test_daily_accrual() {
        let mut loan = Loan::default();
        loan.draw(365.0);
        loan.accrue_daily(0.10);
        assert!((loan.accrued_interest() - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_repayment_capped() {
        let mut loan = Loan::default();
        loan.draw(100.0);
        loan.accrue_daily(3.65); // 1.0 interest
        assert_eq!(loan.pay_interest(50.0), 1.0);
        assert_eq!(loan.pay_principal(500.0), 100.0);
        assert!(loan.is_clear());
        assert_eq!(loan.principal(), 0.0);
        assert_eq!(loan.accrued_interest(), 0.0);
    }

    #[test]
    fn test_negative_offers_pay_nothing() {
        let mut loan = Loan::default();
        loan.draw(100.0);
        assert_eq!(loan.pay_principal(-25.0), 0.0);
        assert_eq!(loan.principal(), 100.0);
    }
}
