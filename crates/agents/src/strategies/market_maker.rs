//! Market maker - absorbs order imbalance and writes options.
//!
//! The market maker leans against predicted net demand, selling into
//! predicted buying pressure and buying into predicted selling pressure
//! so that sustained one-sided flow meets a counterparty. It is also the
//! sole option writer: every option bought by another participant lands
//! here as a notice, and the maker covers the stock leg of each contract
//! on the following tick. Shorts accumulated while absorbing flow are
//! unwound in stages as the price runs away from its starting level.
//!
//! Pricing algorithm reference: https://econweb.ucsd.edu/~rstarr/Shen-StarrMktMaker.pdf

use types::{AgentId, Archetype, OptionBought, OptionContract, OptionKind};

use crate::book::{TraderBook, TraderParams};
use crate::traits::{Agent, MarketView};

/// Configuration for a market maker.
#[derive(Debug, Clone)]
pub struct MarketMakerConfig {
    /// Predicted imbalance (as a fraction of predicted total demand)
    /// above which the maker trades against the flow.
    pub imbalance_threshold: f64,
    /// Fraction of the predicted net demand absorbed per tick.
    pub compensation_fraction: f64,
    /// Price multiples of the initial price that trigger each unwind stage.
    pub unwind_multiples: [f64; 2],
    /// Fraction of the remaining short covered at each stage.
    pub unwind_fractions: [f64; 2],
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold: 0.05,
            compensation_fraction: 0.05,
            unwind_multiples: [1.5, 2.0],
            unwind_fractions: [0.5, 1.0],
        }
    }
}

/// The liquidity provider and option counterparty.
pub struct MarketMaker {
    id: AgentId,
    config: MarketMakerConfig,
    book: TraderBook,
    /// Contracts written to other participants. Held until expiry and
    /// marked against portfolio value; the premium was collected when
    /// the contract was written.
    written: Vec<OptionContract>,
    /// Stock legs of freshly written contracts, covered next tick.
    cover_buy: f64,
    cover_sell: f64,
    unwind_stage: usize,
}

impl MarketMaker {
    pub fn new(id: AgentId, config: MarketMakerConfig, params: TraderParams) -> Self {
        Self {
            id,
            config,
            book: TraderBook::new(id, params).with_margin_exempt(),
            written: Vec::new(),
            cover_buy: 0.0,
            cover_sell: 0.0,
            unwind_stage: 0,
        }
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, MarketMakerConfig::default(), TraderParams::default())
    }

    /// Number of written contracts still alive.
    pub fn written_contracts(&self) -> usize {
        self.written.len()
    }

    /// Trade against the predicted imbalance when it is large enough
    /// relative to predicted total demand.
    fn compensate_demand(&mut self, view: &MarketView<'_>) {
        if view.predicted_total_demand == 0.0 {
            return;
        }
        let imbalance = view.predicted_net_demand / view.predicted_total_demand;
        if imbalance.abs() <= self.config.imbalance_threshold {
            return;
        }
        let volume = (view.predicted_net_demand.abs() * self.config.compensation_fraction).round();
        if view.predicted_net_demand > 0.0 {
            self.book.sell(volume, view);
        } else {
            self.book.buy(volume, view);
        }
    }

    /// Cover the stock legs of contracts written last tick.
    fn cover_written_legs(&mut self, view: &MarketView<'_>) {
        let to_sell = self.cover_sell;
        let to_buy = self.cover_buy;
        self.cover_sell = 0.0;
        self.cover_buy = 0.0;
        self.book.sell(to_sell, view);
        self.book.buy(to_buy, view);
    }

    /// Buy back part of the short inventory once the price has run a
    /// configured multiple past its starting level. Each stage fires once.
    fn unwind_short(&mut self, view: &MarketView<'_>) {
        if !self.book.has_short_position() || self.unwind_stage >= self.config.unwind_multiples.len() {
            return;
        }
        let Some(&initial_price) = view.prices.first() else {
            return;
        };
        if view.price >= initial_price * self.config.unwind_multiples[self.unwind_stage] {
            let volume = -self.book.shares * self.config.unwind_fractions[self.unwind_stage];
            self.book.buy(volume, view);
            self.unwind_stage += 1;
        }
    }
}

impl Agent for MarketMaker {
    fn id(&self) -> AgentId {
        self.id
    }

    fn archetype(&self) -> Archetype {
        Archetype::MarketMaker
    }

    fn book(&self) -> &TraderBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut TraderBook {
        &mut self.book
    }

    fn name(&self) -> &str {
        "MarketMaker"
    }

    fn is_market_maker(&self) -> bool {
        true
    }

    fn on_options_written(&mut self, sold: &[OptionBought], _view: &MarketView<'_>) {
        let multiplier = self.book.params.option_multiplier;
        for notice in sold {
            self.book.capital += notice.contract.premium;
            match notice.contract.kind {
                OptionKind::Call => self.cover_buy += multiplier,
                OptionKind::Put => self.cover_sell += multiplier,
            }
            self.written.push(notice.contract.clone());
        }
    }

    fn on_tick(&mut self, view: &MarketView<'_>) {
        // Written contracts age without settling in cash. The buyer's
        // payoff is marked against portfolio value while they live.
        self.written.retain_mut(|contract| !contract.tick_down());

        self.compensate_demand(view);
        self.cover_written_legs(view);
        self.unwind_short(view);
        self.book.flush_pending_shares();
    }

    fn revalue(&mut self, view: &MarketView<'_>) {
        self.book.accrue_cash_interest(view);
        self.book.update_portfolio_value(view);
        let multiplier = self.book.params.option_multiplier;
        let liability: f64 = self
            .written
            .iter()
            .map(|contract| contract.intrinsic_value(view.price, multiplier))
            .sum();
        self.book.portfolio_value -= liability;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(
        tick: types::Tick,
        price: f64,
        net: f64,
        total: f64,
        prices: &[f64],
    ) -> MarketView<'_> {
        MarketView {
            tick,
            price,
            price_change: 0.0,
            interest_rate: 0.02,
            volatility: 0.15,
            projected_price: price,
            predicted_net_demand: net,
            predicted_total_demand: total,
            prices,
            market_failed: false,
        }
    }

    fn call_notice(premium: f64, expiry: types::Tick) -> OptionBought {
        OptionBought {
            buyer: AgentId(7),
            contract: OptionContract::new(OptionKind::Call, 11.0, expiry, 10.0, premium),
        }
    }

    #[test]
    fn sells_into_predicted_buying_pressure() {
        let prices = vec![10.0];
        let mut maker = MarketMaker::with_defaults(AgentId(1));
        let view = view(12, 10.0, 1000.0, 10_000.0, &prices);
        maker.on_tick(&view);
        assert_eq!(maker.book.outbox().sell_volume, 50.0);
        assert_eq!(maker.book.shares, -50.0);
    }

    #[test]
    fn buys_into_predicted_selling_pressure() {
        let prices = vec![10.0];
        let mut maker = MarketMaker::with_defaults(AgentId(1));
        let view = view(12, 10.0, -1000.0, 10_000.0, &prices);
        maker.on_tick(&view);
        assert_eq!(maker.book.outbox().buy_volume, 50.0);
        assert_eq!(maker.book.shares, 50.0);
    }

    #[test]
    fn small_imbalance_is_ignored() {
        let prices = vec![10.0];
        let mut maker = MarketMaker::with_defaults(AgentId(1));
        let view = view(12, 10.0, 400.0, 10_000.0, &prices);
        maker.on_tick(&view);
        assert!(maker.book.outbox().is_empty());
    }

    #[test]
    fn collects_premium_and_covers_next_tick() {
        let prices = vec![10.0];
        let mut maker = MarketMaker::with_defaults(AgentId(1));
        let v = view(12, 10.0, 0.0, 10_000.0, &prices);

        maker.on_options_written(&[call_notice(30.0, 15)], &v);
        assert_eq!(maker.book.capital, 10_030.0);
        assert_eq!(maker.written_contracts(), 1);
        assert_eq!(maker.cover_buy, 10.0);

        maker.on_tick(&v);
        assert_eq!(maker.book.shares, 10.0);
        assert_eq!(maker.cover_buy, 0.0);
    }

    #[test]
    fn unwind_stages_fire_once_each() {
        let prices = vec![10.0];
        let mut maker = MarketMaker::with_defaults(AgentId(1));

        // Absorb buying pressure into a 50-share short.
        maker.on_tick(&view(12, 10.0, 1000.0, 10_000.0, &prices));
        assert_eq!(maker.book.shares, -50.0);

        // First multiple covers half the short.
        maker.on_tick(&view(13, 15.0, 0.0, 10_000.0, &prices));
        assert_eq!(maker.book.shares, -25.0);

        // Same price again does nothing, the next stage needs 2x.
        maker.on_tick(&view(14, 15.0, 0.0, 10_000.0, &prices));
        assert_eq!(maker.book.shares, -25.0);

        maker.on_tick(&view(15, 20.0, 0.0, 10_000.0, &prices));
        assert_eq!(maker.book.shares, 0.0);

        // Both stages spent; a further rally changes nothing.
        maker.on_tick(&view(16, 30.0, 0.0, 10_000.0, &prices));
        assert_eq!(maker.book.shares, 0.0);
    }

    #[test]
    fn written_contracts_mark_against_portfolio_until_expiry() {
        let prices = vec![10.0];
        let mut maker = MarketMaker::with_defaults(AgentId(1));
        let v = view(12, 12.0, 0.0, 10_000.0, &prices);

        maker.on_options_written(&[call_notice(30.0, 2)], &v);
        let capital_after_premium = maker.book.capital;

        // Alive contract: intrinsic (12 - 11) * 10 marks against value.
        maker.revalue(&v);
        let marked = maker.book.portfolio_value;

        maker.on_tick(&v);
        maker.on_tick(&v);
        assert_eq!(maker.written_contracts(), 0);

        // Expiry drops the mark without moving cash.
        let cover_cost = 10.0 * v.price;
        assert!(maker.book.capital > capital_after_premium - cover_cost - 1e-9);
        maker.revalue(&v);
        assert!(maker.book.portfolio_value > marked);
    }
}
