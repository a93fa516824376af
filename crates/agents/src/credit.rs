//! Borrowing capability for bank clients.
//!
//! Momentum traders and retail investors fund cash deficits through the
//! bank. Attaching [`CreditTerms`] to a [`TraderBook`] changes its trading
//! mechanics in three ways: buys on negative cash turn into borrow requests
//! instead of free leverage, option purchases must clear the cost of
//! carrying the premium, and the book follows a periodic repayment schedule.
//!
//! The credit phase runs in three steps each tick, driven by the simulation:
//! requests and scheduled repayments go out first, the bank then allocates
//! in arrival order, and finally each borrower applies its outcome here via
//! [`TraderBook::act_on_loan`].

use rand::Rng;
use types::{BorrowOutcome, BorrowRequest, LoanRepayment, OptionKind, Tick};

use crate::book::TraderBook;
use crate::traits::MarketView;

/// Borrowing terms attached to a credit-enabled book.
#[derive(Debug, Clone)]
pub struct CreditTerms {
    /// Spread over the risk-free rate charged on the loan.
    pub interest_margin: f64,
    /// Ticks between repayment attempts, drawn per borrower.
    pub repayment_every: Tick,
    /// Portfolio value required per unit of debt to stay solvent.
    pub solvency_ratio: f64,
    /// Weight on projected option payoff in the purchase gate.
    pub profit_factor: f64,
}

impl Default for CreditTerms {
    fn default() -> Self {
        Self {
            interest_margin: 0.02,
            repayment_every: 8,
            solvency_ratio: 1.0,
            profit_factor: 1.0,
        }
    }
}

impl CreditTerms {
    /// Terms with a repayment schedule drawn from `[5, 13)` ticks.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            repayment_every: rng.random_range(5..13),
            ..Self::default()
        }
    }
}

impl TraderBook {
    /// Annual rate this book pays on borrowed money.
    pub fn lending_rate(&self, view: &MarketView<'_>) -> f64 {
        let margin = self
            .credit
            .as_ref()
            .map_or(0.0, |terms| terms.interest_margin);
        view.interest_rate + margin
    }

    /// Whether an option purchase clears the cost of carrying its premium.
    ///
    /// Compares the projected payoff edge against the interest cost of the
    /// premium's time value. Books without credit terms always pass.
    pub(crate) fn option_clears_carry(
        &self,
        kind: OptionKind,
        strike: f64,
        premium: f64,
        view: &MarketView<'_>,
    ) -> bool {
        let Some(terms) = &self.credit else {
            return true;
        };
        let multiplier = self.params.option_multiplier;
        let intrinsic = match kind {
            OptionKind::Call => (view.price - strike).max(0.0),
            OptionKind::Put => (strike - view.price).max(0.0),
        } * multiplier;
        let time_value = premium - intrinsic;
        let edge = match kind {
            OptionKind::Call => view.projected_price - strike,
            OptionKind::Put => strike - view.projected_price,
        } * multiplier;
        edge * terms.profit_factor > time_value * view.interest_rate
    }

    /// The borrow request to send this tick, if any shortfall accumulated.
    pub fn take_borrow_request(&self) -> Option<BorrowRequest> {
        self.credit.as_ref()?;
        let amount = self.amount_to_borrow.abs();
        if amount == 0.0 {
            return None;
        }
        Some(BorrowRequest {
            borrower: self.id(),
            amount,
        })
    }

    /// Apply the bank's outcome for this tick and accrue daily interest.
    ///
    /// A zero grant on an actual request marks the book unable to borrow; a
    /// tick without a request clears that mark again, so refusals bite for
    /// exactly the ticks the bank keeps refusing.
    pub fn act_on_loan(&mut self, outcome: Option<&BorrowOutcome>, view: &MarketView<'_>) {
        if self.credit.is_none() {
            return;
        }
        let rate = self.lending_rate(view);
        self.loan.accrue_daily(rate);
        match outcome {
            Some(outcome) if outcome.granted > 0.0 => {
                self.loan.draw(outcome.granted);
                self.capital += outcome.granted;
                self.can_borrow = true;
            }
            Some(_) => self.can_borrow = false,
            None => self.can_borrow = true,
        }
        self.amount_to_borrow = 0.0;
        self.refresh_solvency();
    }

    /// Re-evaluate the solvency gate on trading.
    ///
    /// A book that cannot borrow and whose portfolio value sits below
    /// `solvency_ratio` times its debt stops trading; it resumes as soon as
    /// the portfolio covers the debt again.
    pub fn refresh_solvency(&mut self) {
        let Some(terms) = &self.credit else {
            return;
        };
        let debt = self.loan.outstanding();
        if debt == 0.0 {
            self.is_trading = true;
            return;
        }
        if self.portfolio_value >= terms.solvency_ratio * debt {
            self.is_trading = true;
        } else if !self.can_borrow {
            self.is_trading = false;
        }
    }

    /// Whether this tick falls on the book's repayment schedule.
    pub fn repayment_due(&self, tick: Tick) -> bool {
        match &self.credit {
            Some(terms) => tick > 0 && tick % terms.repayment_every == 0 && !self.loan.is_clear(),
            None => false,
        }
    }

    /// Attempt a scheduled repayment: accrued interest first, then part of
    /// the principal according to the price-direction heuristic.
    pub fn make_repayment(&mut self, view: &MarketView<'_>) -> Option<LoanRepayment> {
        self.credit.as_ref()?;
        let interest = self.pay_loan_interest(view);
        let principal = self.repay_principal(view);
        if interest == 0.0 && principal == 0.0 {
            return None;
        }
        Some(LoanRepayment {
            borrower: self.id(),
            principal,
            interest,
        })
    }

    /// Clear accrued interest from cash, selling stock to cover a deficit.
    fn pay_loan_interest(&mut self, view: &MarketView<'_>) -> f64 {
        let owed = self.loan.accrued_interest();
        if owed == 0.0 {
            return 0.0;
        }
        if self.capital < owed && self.is_trading && self.shares > 0.0 && view.price > 0.0 {
            let shortfall = owed - self.capital;
            let to_sell = (shortfall / view.price).ceil().min(self.shares);
            self.sell(to_sell, view);
        }
        let paid = self.loan.pay_interest(self.capital.max(0.0));
        self.capital -= paid;
        paid
    }

    /// Repay principal according to the forecast price direction: when the
    /// projected rally outruns the cost of carry, keep the stock and pay
    /// from cash; otherwise liquidate stock into the loan.
    fn repay_principal(&mut self, view: &MarketView<'_>) -> f64 {
        let principal = self.loan.principal();
        if principal == 0.0 || view.price <= 0.0 {
            return 0.0;
        }
        let drift = view.projected_price / view.price;
        if drift > 1.0 {
            if self.capital < 0.0 {
                // Cash deficit under a rising forecast: hold out.
                return 0.0;
            }
            let carry = 1.0 + self.lending_rate(view);
            if carry < drift {
                if self.shares > 0.0 {
                    let offer = (principal / 2.0).min(self.capital / 2.0);
                    let paid = self.loan.pay_principal(offer);
                    self.capital -= paid;
                    return paid;
                }
                // Short inventory against a rising forecast: cover it
                // before repaying anything.
                let cover = (self.capital / view.price).floor();
                self.buy(cover, view);
                return 0.0;
            }
            return self.sell_shares_into_principal(view);
        }
        self.sell_shares_into_principal(view)
    }

    /// Sell enough stock to cover the principal and pay the sale value in.
    fn sell_shares_into_principal(&mut self, view: &MarketView<'_>) -> f64 {
        if !self.is_trading || self.shares <= 0.0 || view.price <= 0.0 {
            return 0.0;
        }
        let to_sell = (self.loan.principal() / view.price)
            .floor()
            .min(self.shares);
        if to_sell <= 0.0 {
            return 0.0;
        }
        self.sell(to_sell, view);
        let paid = self.loan.pay_principal(to_sell * view.price);
        self.capital -= paid;
        paid
    }
}
