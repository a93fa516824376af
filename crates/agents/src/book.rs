//! Shared trading state and capabilities.
//!
//! Every participant owns a [`TraderBook`]: cash, share inventory, open
//! option positions, loan state, and the per-tick order outbox. Archetypes
//! differ only in when and how much they trade; the mechanics of trading
//! live here.
//!
//! # Order flow
//!
//! `buy`, `sell` and `buy_option` mutate cash and inventory immediately at
//! the current traded price and record the volume in the outbox. The tick
//! driver drains each outbox once per tick and feeds the aggregate into
//! price formation, so every trade moves the market one tick later at the
//! earliest.
//!
//! # Short selling
//!
//! `sell` silently converts into a short sale once inventory runs out.
//! Shorted volume is tracked separately in the outbox for reporting. An
//! optional margin check caps the shorted portion by free cash; market
//! makers are exempt from it.

use quant::DAYS_PER_YEAR;
use smallvec::SmallVec;
use types::{AgentId, Loan, OptionBought, OptionContract, OptionKind, Tick};

use crate::credit::CreditTerms;
use crate::traits::MarketView;

/// Capability parameters shared by all archetypes.
#[derive(Debug, Clone)]
pub struct TraderParams {
    /// Cash balance at creation.
    pub initial_capital: f64,
    /// Underlying shares represented by one option contract.
    pub option_multiplier: f64,
    /// Call strike as a multiple of spot at purchase.
    pub call_strike_factor: f64,
    /// Put strike as a multiple of spot at purchase.
    pub put_strike_factor: f64,
    /// Opinion weight above which opinion trades add an option purchase.
    pub option_opinion_threshold: f64,
    /// Magnitude bound used to normalize opinions.
    pub max_opinion: f64,
    /// Share volume traded at full opinion strength.
    pub max_shares_on_opinion: f64,
    /// Fraction of the option book's delta to hedge, in `[0, 1]`.
    pub hedge_aggressiveness: f64,
    /// Whether short sales are capped by free cash.
    pub enforce_short_margin: bool,
    /// Cash required per unit of short exposure when margin is enforced.
    pub short_margin_requirement: f64,
}

impl Default for TraderParams {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            option_multiplier: 10.0,
            call_strike_factor: 1.1,
            put_strike_factor: 0.9,
            option_opinion_threshold: 0.6,
            max_opinion: 20.0,
            max_shares_on_opinion: 10.0,
            hedge_aggressiveness: 1.0,
            enforce_short_margin: false,
            short_margin_requirement: 0.5,
        }
    }
}

/// Per-tick order flow and option notices, drained once per tick.
#[derive(Debug, Clone, Default)]
pub struct TraderOutbox {
    /// Aggregate buy volume emitted this tick.
    pub buy_volume: f64,
    /// Aggregate sell volume emitted this tick (short sales included).
    pub sell_volume: f64,
    /// Portion of `sell_volume` that opened or extended a short position.
    pub short_volume: f64,
    /// Call contracts bought this tick.
    pub calls_bought: u32,
    /// Put contracts bought this tick.
    pub puts_bought: u32,
    /// Purchase notices for the market maker writing the contracts.
    pub options_bought: SmallVec<[OptionBought; 2]>,
}

impl TraderOutbox {
    /// Buy volume minus sell volume.
    pub fn net_volume(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }

    /// True when nothing was emitted this tick.
    pub fn is_empty(&self) -> bool {
        self.buy_volume == 0.0
            && self.sell_volume == 0.0
            && self.options_bought.is_empty()
            && self.calls_bought == 0
            && self.puts_bought == 0
    }
}

/// Cash, inventory, option and loan state for one participant.
#[derive(Debug, Clone)]
pub struct TraderBook {
    id: AgentId,
    /// Capability parameters.
    pub params: TraderParams,
    /// Cash balance. May go negative; credit-enabled agents borrow instead.
    pub capital: f64,
    /// Share inventory, signed. Negative is a short position.
    pub shares: f64,
    /// Cash + inventory + option book, recomputed each revaluation phase.
    pub portfolio_value: f64,
    /// Open bought option positions.
    pub options: Vec<OptionContract>,
    /// Shares owed to (positive) or by (negative) the holder from option
    /// settlement, flushed into order flow once per tick.
    pub pending_shares: f64,
    /// Current stock position held against the option book.
    pub hedge_position: f64,
    /// Outstanding loan with the bank.
    pub loan: Loan,
    /// False after the bank refuses a request, until the next grant.
    pub can_borrow: bool,
    /// False while insolvent; suspends all trading.
    pub is_trading: bool,
    /// Cash shortfall accumulated this tick, requested from the bank at the
    /// start of the next credit phase.
    pub amount_to_borrow: f64,
    /// Borrowing terms; `None` for agents without bank access.
    pub credit: Option<CreditTerms>,
    margin_exempt: bool,
    outbox: TraderOutbox,
}

impl TraderBook {
    pub fn new(id: AgentId, params: TraderParams) -> Self {
        let capital = params.initial_capital;
        Self {
            id,
            params,
            capital,
            shares: 0.0,
            portfolio_value: capital,
            options: Vec::new(),
            pending_shares: 0.0,
            hedge_position: 0.0,
            loan: Loan::default(),
            can_borrow: true,
            is_trading: true,
            amount_to_borrow: 0.0,
            credit: None,
            margin_exempt: false,
            outbox: TraderOutbox::default(),
        }
    }

    /// Attach borrowing terms, making this book a bank client.
    pub fn with_credit(mut self, terms: CreditTerms) -> Self {
        self.credit = Some(terms);
        self
    }

    /// Exempt this book from short-sale margin checks.
    pub fn with_margin_exempt(mut self) -> Self {
        self.margin_exempt = true;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Order flow accumulated so far this tick.
    pub fn outbox(&self) -> &TraderOutbox {
        &self.outbox
    }

    /// Drain the outbox for aggregation. Called once per tick by the driver.
    pub fn take_outbox(&mut self) -> TraderOutbox {
        std::mem::take(&mut self.outbox)
    }

    /// True when the book holds a short position.
    pub fn has_short_position(&self) -> bool {
        self.shares < 0.0
    }

    // ===== Share trading =====

    /// Buy `volume` shares at the current price.
    ///
    /// Buying on zero or negative cash is allowed for plain traders, whose
    /// wealth is judged by portfolio value. Credit-enabled books instead
    /// record the cash shortfall for the next borrow request, and skip the
    /// trade entirely while the bank refuses them.
    pub fn buy(&mut self, volume: f64, view: &MarketView<'_>) {
        let volume = volume.max(0.0);
        if volume == 0.0 || !self.is_trading {
            return;
        }
        if self.credit.is_some() && self.capital < 0.0 {
            if !self.can_borrow {
                return;
            }
            self.amount_to_borrow += volume * view.price;
        }
        self.shares += volume;
        self.capital -= volume * view.price;
        self.outbox.buy_volume += volume;
    }

    /// Sell `volume` shares at the current price, shorting whatever the
    /// inventory cannot cover.
    pub fn sell(&mut self, volume: f64, view: &MarketView<'_>) {
        let volume = volume.max(0.0);
        if volume == 0.0 || !self.is_trading {
            return;
        }
        let held = self.shares.max(0.0).min(volume);
        let mut shorted = volume - held;
        if shorted > 0.0 && self.params.enforce_short_margin && !self.margin_exempt {
            shorted = shorted.min(self.affordable_short(view));
        }
        let total = held + shorted;
        if total == 0.0 {
            return;
        }
        self.shares -= total;
        self.capital += total * view.price;
        self.outbox.sell_volume += total;
        self.outbox.short_volume += shorted;
    }

    /// Largest short volume the margin requirement allows at this price.
    fn affordable_short(&self, view: &MarketView<'_>) -> f64 {
        let unit_cost = view.price * self.params.short_margin_requirement;
        if unit_cost <= 0.0 {
            return 0.0;
        }
        self.capital.max(0.0) / unit_cost
    }

    // ===== Options =====

    /// Buy a call struck at `call_strike_factor` times the current price.
    pub fn buy_call(&mut self, expiry_ticks: Tick, view: &MarketView<'_>) {
        let strike = view.price * self.params.call_strike_factor;
        self.buy_option(OptionKind::Call, strike, expiry_ticks, view);
    }

    /// Buy a put struck at `put_strike_factor` times the current price.
    pub fn buy_put(&mut self, expiry_ticks: Tick, view: &MarketView<'_>) {
        let strike = view.price * self.params.put_strike_factor;
        self.buy_option(OptionKind::Put, strike, expiry_ticks, view);
    }

    /// Buy one option contract at its Black-Scholes premium.
    ///
    /// Credit-enabled books only buy when the projected payoff clears the
    /// cost of carrying the premium, and record any cash shortfall for the
    /// next borrow request.
    pub fn buy_option(
        &mut self,
        kind: OptionKind,
        strike: f64,
        expiry_ticks: Tick,
        view: &MarketView<'_>,
    ) {
        if !self.is_trading {
            return;
        }
        let premium = quant::contract_price(
            kind,
            view.price,
            strike,
            view.interest_rate,
            view.volatility,
            expiry_ticks,
            self.params.option_multiplier,
        );
        if self.credit.is_some() {
            if !self.option_clears_carry(kind, strike, premium, view) {
                return;
            }
            if self.capital < premium {
                if !self.can_borrow {
                    return;
                }
                self.amount_to_borrow += premium - self.capital;
            }
        }
        let contract = OptionContract::new(kind, strike, expiry_ticks, view.price, premium);
        self.capital -= premium;
        match kind {
            OptionKind::Call => self.outbox.calls_bought += 1,
            OptionKind::Put => self.outbox.puts_bought += 1,
        }
        self.outbox.options_bought.push(OptionBought {
            buyer: self.id,
            contract: contract.clone(),
        });
        self.options.push(contract);
    }

    /// Age every open option by one tick and settle the ones expiring now.
    ///
    /// In-the-money contracts pay their intrinsic value in cash and leave
    /// the implied share flow in `pending_shares`; out-of-the-money ones
    /// lapse worthless. Each contract settles exactly once.
    pub fn age_options(&mut self, view: &MarketView<'_>) {
        let multiplier = self.params.option_multiplier;
        let price = view.price;
        let mut cash = 0.0;
        let mut pending = 0.0;
        self.options.retain_mut(|option| {
            if option.tick_down() {
                cash += option.intrinsic_value(price, multiplier);
                pending += option.settlement_shares(price, multiplier);
                false
            } else {
                true
            }
        });
        self.capital += cash;
        self.pending_shares += pending;
    }

    /// Flush settlement share flow into this tick's order flow.
    ///
    /// Settlement cash already changed hands in [`Self::age_options`]; this
    /// only reports the share demand so settlement moves the market too.
    pub fn flush_pending_shares(&mut self) {
        if self.pending_shares > 0.0 {
            self.outbox.buy_volume += self.pending_shares;
        } else if self.pending_shares < 0.0 {
            self.outbox.sell_volume += -self.pending_shares;
        }
        self.pending_shares = 0.0;
    }

    /// Finite-difference hedge ratio for one contract, clamped to
    /// `[0, multiplier]` for calls and `[-multiplier, 0]` for puts.
    pub fn option_delta(&self, option: &OptionContract, view: &MarketView<'_>) -> f64 {
        let spot_move = view.price - option.spot_at_purchase;
        if spot_move == 0.0 {
            return 0.0;
        }
        let current = quant::contract_price(
            option.kind,
            view.price,
            option.strike,
            view.interest_rate,
            view.volatility,
            option.ticks_to_expiry,
            self.params.option_multiplier,
        );
        let delta = (current - option.premium) / spot_move;
        let multiplier = self.params.option_multiplier;
        match option.kind {
            OptionKind::Call => delta.clamp(0.0, multiplier),
            OptionKind::Put => delta.clamp(-multiplier, 0.0),
        }
    }

    /// Trade the difference between the stored hedge position and the
    /// current target, then store the target.
    ///
    /// The target offsets the option book's aggregate delta, scaled by the
    /// hedge-aggressiveness factor and rounded to whole shares. A zero
    /// aggregate leaves the existing hedge untouched.
    pub fn rebalance_hedge(&mut self, view: &MarketView<'_>) {
        let total_delta: f64 = self
            .options
            .iter()
            .map(|option| self.option_delta(option, view))
            .sum();
        let scaled = (self.params.hedge_aggressiveness * total_delta).round();
        if scaled == 0.0 {
            return;
        }
        let target = -scaled;
        let diff = target - self.hedge_position;
        if diff > 0.0 {
            self.buy(diff, view);
        } else if diff < 0.0 {
            self.sell(-diff, view);
        }
        self.hedge_position = target;
    }

    // ===== Opinion trading =====

    /// Trade on a sentiment value using the exponential volume curve.
    ///
    /// The opinion is normalized by `max_opinion` and weighted by the
    /// trader's sensitivity; strong opinions additionally buy an option in
    /// the opinion's direction.
    pub fn trade_on_opinion(
        &mut self,
        opinion: f64,
        sensitivity: f64,
        expiry_ticks: Tick,
        view: &MarketView<'_>,
    ) {
        let scaled = (opinion / self.params.max_opinion).abs();
        let denom = sensitivity.exp() - 1.0;
        let weight = if denom > 0.0 {
            ((scaled * sensitivity).exp() - 1.0) / denom
        } else {
            scaled
        };
        let volume = (weight * self.params.max_shares_on_opinion).floor();
        if opinion > 0.0 {
            self.buy(volume, view);
            if weight > self.params.option_opinion_threshold {
                self.buy_call(expiry_ticks, view);
            }
        } else {
            self.sell(volume, view);
            if weight > self.params.option_opinion_threshold {
                self.buy_put(expiry_ticks, view);
            }
        }
    }

    // ===== Revaluation =====

    /// Intrinsic value of the bought option book at the current price.
    pub fn option_book_value(&self, view: &MarketView<'_>) -> f64 {
        self.options
            .iter()
            .map(|option| option.intrinsic_value(view.price, self.params.option_multiplier))
            .sum()
    }

    /// Daily interest on the cash balance.
    pub fn accrue_cash_interest(&mut self, view: &MarketView<'_>) {
        self.capital *= 1.0 + view.interest_rate / DAYS_PER_YEAR;
    }

    /// Recompute portfolio value: cash + inventory + option book.
    pub fn update_portfolio_value(&mut self, view: &MarketView<'_>) {
        self.portfolio_value =
            self.shares * view.price + self.capital + self.option_book_value(view);
    }
}
