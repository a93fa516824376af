//! Tick orchestration.
//!
//! [`Simulation`] owns the participants, the bank, and the exchange
//! state, and advances them through fixed phases each tick:
//!
//! 1. Opinions: participants broadcast sentiment; listeners receive
//!    whatever their inbound edges carry.
//! 2. Credit: scheduled repayments are collected, then borrow requests
//!    are served in arrival order, then every credit book accrues daily
//!    loan interest and re-checks solvency.
//! 3. Options: open contracts age by one tick and expiries settle.
//! 4. Decisions: the market makers absorb last tick's option purchases,
//!    then every participant trades against the same market view.
//! 5. Pricing: outboxes drain into aggregate order flow, the price
//!    moves by the impact rule, and the demand forecasts, interest rate
//!    and volatility estimate update.
//! 6. Revaluation: books rebalance hedges, accrue cash interest and
//!    mark portfolio value. Hedge orders join the next tick's flow.
//!
//! Agents sit behind `Mutex`es so phases 1, 3, 4 and 6 can fan out
//! across threads when the `parallel` feature is on. Determinism comes
//! from per-agent RNG streams and slot-ordered collection, never from
//! execution order inside a phase.

use std::collections::HashMap;

use agents::{
    Agent, Bank, BankConfig, FundamentalTrader, FundamentalTraderConfig, HedgeFund,
    HedgeFundConfig, Initiator, InitiatorConfig, MarketMaker, MarketMakerConfig, MomentumTrader,
    MomentumTraderConfig, NoiseTrader, NoiseTraderConfig, RetailInvestor, RetailInvestorConfig,
    TraderParams,
};
use parking_lot::{Mutex, MutexGuard};
use quant::{RateProcess, RateProcessConfig, VolatilityEstimator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};
use types::{AgentId, BorrowOutcome, OpinionShared, OptionBought, Tick};

use crate::config::{ConfigError, SimConfig};
use crate::market::MarketState;
use crate::metrics::{RunSummary, TickRecord};
use crate::parallel::{for_each_index, for_each_mutex_slice, map_mutex_slice};
use crate::topology::OpinionGraph;

/// RNG stream reserved for the engine itself (interest-rate shocks).
const ENGINE_STREAM: u64 = u64::MAX;

/// Derive an independent seed for one RNG stream of the master seed.
///
/// SplitMix64 finalizer, so consecutive stream indices still land far
/// apart in `StdRng`'s seed space.
fn substream_seed(master: u64, stream: u64) -> u64 {
    let mut z = master.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The assembled market: participants, bank, exchange state, and the
/// processes driving rates and volatility.
pub struct Simulation {
    config: SimConfig,
    agents: Vec<Mutex<Box<dyn Agent>>>,
    graph: OpinionGraph,
    /// Slots with at least one inbound opinion edge.
    opinion_listeners: Vec<usize>,
    /// Slots holding market makers, in creation order.
    market_maker_slots: Vec<usize>,
    market: MarketState,
    bank: Bank,
    rates: RateProcess,
    volatility: VolatilityEstimator,
    engine_rng: StdRng,
    /// Option purchases from the previous tick, awaiting their writer.
    pending_option_notices: Vec<OptionBought>,
    records: Vec<TickRecord>,
}

impl Simulation {
    /// Build the population and wire the opinion network.
    ///
    /// Participants are created in a fixed order (noise, momentum,
    /// fundamental, retail, market makers, initiators, hedge funds) so
    /// slot indices, ids and RNG streams are stable for a given
    /// configuration.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            error!(%err, "rejected simulation config");
            return Err(err);
        }

        let params = TraderParams {
            initial_capital: config.trader_capital,
            enforce_short_margin: config.enforce_short_margin,
            ..TraderParams::default()
        };
        let seed = config.seed;
        let mut agents: Vec<Mutex<Box<dyn Agent>>> = Vec::with_capacity(config.total_agents());

        for _ in 0..config.num_noise_traders {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(NoiseTrader::with_seed(
                id,
                NoiseTraderConfig::default(),
                params.clone(),
                substream_seed(seed, id.raw()),
            ))));
        }

        let momentum_start = agents.len();
        for _ in 0..config.num_momentum_traders {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(MomentumTrader::with_seed(
                id,
                MomentumTraderConfig::default(),
                params.clone(),
                substream_seed(seed, id.raw()),
            ))));
        }
        let momentum = momentum_start..agents.len();

        for _ in 0..config.num_fundamental_traders {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(FundamentalTrader::with_seed(
                id,
                FundamentalTraderConfig::default(),
                params.clone(),
                substream_seed(seed, id.raw()),
            ))));
        }

        let retail_start = agents.len();
        for _ in 0..config.num_retail_investors {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(RetailInvestor::with_seed(
                id,
                RetailInvestorConfig::default(),
                params.clone(),
                substream_seed(seed, id.raw()),
            ))));
        }
        let retail = retail_start..agents.len();

        let maker_start = agents.len();
        for _ in 0..config.num_market_makers {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(MarketMaker::new(
                id,
                MarketMakerConfig::default(),
                params.clone(),
            ))));
        }
        let market_maker_slots: Vec<usize> = (maker_start..agents.len()).collect();

        let initiator_start = agents.len();
        for _ in 0..config.num_initiators {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(Initiator::new(
                id,
                InitiatorConfig::default(),
            ))));
        }
        let initiators = initiator_start..agents.len();

        for _ in 0..config.num_hedge_funds {
            let id = AgentId(agents.len() as u64);
            agents.push(Mutex::new(Box::new(HedgeFund::new(
                id,
                HedgeFundConfig::default(),
                params.clone(),
            ))));
        }

        let graph = OpinionGraph::wire(
            agents.len(),
            retail,
            momentum,
            initiators,
            config.opinion_group_size,
        );
        let opinion_listeners = (0..agents.len())
            .filter(|&slot| !graph.inbound(slot).is_empty())
            .collect();

        info!(
            agents = agents.len(),
            noise = config.num_noise_traders,
            momentum = config.num_momentum_traders,
            fundamental = config.num_fundamental_traders,
            retail = config.num_retail_investors,
            market_makers = config.num_market_makers,
            initiators = config.num_initiators,
            hedge_funds = config.num_hedge_funds,
            seed,
            "population assembled"
        );

        Ok(Self {
            market: MarketState::new(&config),
            bank: Bank::new(BankConfig {
                initial_capital: config.bank_capital,
            }),
            rates: RateProcess::new(RateProcessConfig {
                initial_rate: config.initial_rate,
                long_run_mean: config.rate_long_run_mean,
                reversion_speed: config.rate_reversion_speed,
                volatility: config.rate_volatility,
            }),
            volatility: VolatilityEstimator::new(
                config.volatility_window,
                config.default_volatility,
            ),
            engine_rng: StdRng::seed_from_u64(substream_seed(seed, ENGINE_STREAM)),
            config,
            agents,
            graph,
            opinion_listeners,
            market_maker_slots,
            pending_option_notices: Vec::new(),
            records: Vec::new(),
        })
    }

    /// Register an extra participant on top of the configured population.
    ///
    /// The agent lands in the next free slot, outside the opinion
    /// network. Trading archetypes widen the price-impact denominator.
    pub fn add_agent(&mut self, agent: Box<dyn Agent>) {
        if agent.archetype().trades() {
            self.market.add_participant();
        }
        if agent.is_market_maker() {
            self.market_maker_slots.push(self.agents.len());
        }
        self.graph.add_isolated();
        self.agents.push(Mutex::new(agent));
    }

    /// Phase 1: collect broadcast opinions, then deliver to each
    /// listener what its inbound edges carry.
    fn opinion_phase(&self) {
        let view = self.market.view();
        let shared: Vec<Option<OpinionShared>> = map_mutex_slice(&self.agents, |agent| {
            let from = agent.id();
            agent
                .share_opinion(&view)
                .map(|opinion| OpinionShared { from, opinion })
        });
        for_each_index(&self.opinion_listeners, |slot| {
            let heard: Vec<f64> = self
                .graph
                .inbound(slot)
                .iter()
                .filter_map(|&speaker| shared[speaker].map(|message| message.opinion))
                .collect();
            self.agents[slot].lock().on_opinions(&heard, &view);
        });
    }

    /// Phase 2: serve the credit relation.
    ///
    /// Repayments are collected before requests are served, so capital
    /// returning to the bank this tick is lendable this tick. Requests
    /// are served in slot order, and every book then accrues daily loan
    /// interest and re-checks solvency, borrower or not.
    fn credit_phase(&mut self) {
        let view = self.market.view();
        let mut repayments = Vec::new();
        let mut requests = Vec::new();
        for slot in &self.agents {
            let mut agent = slot.lock();
            let book = agent.book_mut();
            if book.repayment_due(view.tick) {
                if let Some(repayment) = book.make_repayment(&view) {
                    repayments.push(repayment);
                }
            }
            if let Some(request) = book.take_borrow_request() {
                requests.push(request);
            }
        }
        self.bank.collect_repayments(&repayments);
        let outcomes: HashMap<AgentId, BorrowOutcome> = self
            .bank
            .process_requests(&requests)
            .into_iter()
            .map(|outcome| (outcome.borrower, outcome))
            .collect();
        for slot in &self.agents {
            let mut agent = slot.lock();
            let id = agent.id();
            agent.book_mut().act_on_loan(outcomes.get(&id), &view);
        }
    }

    /// Phase 3: age option positions and settle expiries.
    fn option_phase(&self) {
        let view = self.market.view();
        for_each_mutex_slice(&self.agents, |agent| agent.book_mut().age_options(&view));
    }

    /// Phase 4: route last tick's option purchases to their writers,
    /// then let every participant trade.
    fn decision_phase(&mut self) {
        let view = self.market.view();
        if !self.pending_option_notices.is_empty() {
            if self.market_maker_slots.is_empty() {
                debug!(
                    dropped = self.pending_option_notices.len(),
                    "option purchases had no market maker to write them"
                );
                self.pending_option_notices.clear();
            } else {
                // Round-robin across makers; each contract gets exactly
                // one writer.
                let writers = self.market_maker_slots.len();
                let mut batches: Vec<Vec<OptionBought>> = vec![Vec::new(); writers];
                for (n, notice) in self.pending_option_notices.drain(..).enumerate() {
                    batches[n % writers].push(notice);
                }
                for (&slot, batch) in self.market_maker_slots.iter().zip(&batches) {
                    if !batch.is_empty() {
                        self.agents[slot].lock().on_options_written(batch, &view);
                    }
                }
            }
        }
        for_each_mutex_slice(&self.agents, |agent| agent.on_tick(&view));
    }

    /// Phase 5: drain outboxes into aggregate flow and move the price.
    fn pricing_phase(&mut self) -> TickRecord {
        let outboxes = map_mutex_slice(&self.agents, |agent| agent.book_mut().take_outbox());

        let mut buys = 0.0;
        let mut sells = 0.0;
        let mut shorts = 0.0;
        let mut calls = 0u32;
        let mut puts = 0u32;
        for outbox in outboxes {
            buys += outbox.buy_volume;
            sells += outbox.sell_volume;
            shorts += outbox.short_volume;
            calls += outbox.calls_bought;
            puts += outbox.puts_bought;
            self.pending_option_notices.extend(outbox.options_bought);
        }

        let tick = self.market.tick();
        self.market.apply_orders(buys, sells);
        self.market.update_forecasts();
        let rate = self.rates.step(&mut self.engine_rng);
        self.market.set_interest_rate(rate);
        self.volatility.update(self.market.price());
        self.market.set_volatility(self.volatility.current());

        TickRecord {
            tick,
            price: self.market.price(),
            price_change: self.market.price_change(),
            net_demand: buys - sells,
            total_demand: buys + sells,
            interest_rate: rate,
            volatility: self.market.volatility(),
            buys,
            sells,
            shorts,
            calls_bought: calls,
            puts_bought: puts,
            market_failed: self.market.market_failed(),
        }
    }

    /// Phase 6: hedge, accrue cash interest, and mark portfolio value.
    /// Hedge orders land in outboxes and join the next tick's flow.
    fn revalue_phase(&self) {
        let view = self.market.view();
        for_each_mutex_slice(&self.agents, |agent| agent.revalue(&view));
    }

    /// Advance one tick through all six phases and record the result.
    pub fn step(&mut self) -> TickRecord {
        self.opinion_phase();
        self.credit_phase();
        self.option_phase();
        self.decision_phase();
        let record = self.pricing_phase();
        self.revalue_phase();
        self.market.finalize_tick();
        self.records.push(record.clone());
        record
    }

    /// Run `ticks` ticks, or fewer if the market fails and the
    /// configuration says to halt.
    pub fn run(&mut self, ticks: Tick) -> RunSummary {
        info!(
            ticks,
            agents = self.agents.len(),
            price = self.market.price(),
            "starting run"
        );
        for _ in 0..ticks {
            let record = self.step();
            if record.market_failed && self.config.halt_on_market_failure {
                warn!(tick = record.tick, "market failed, halting run");
                break;
            }
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            final_price = summary.final_price,
            peak = summary.peak_price,
            "run complete"
        );
        summary
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The tick about to be simulated next.
    pub fn tick(&self) -> Tick {
        self.market.tick()
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    /// Summary over everything recorded so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_records(&self.records, self.config.initial_price)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Lock and return the participant in `slot`.
    pub fn agent(&self, slot: usize) -> MutexGuard<'_, Box<dyn Agent>> {
        self.agents[slot].lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents::{CreditTerms, MarketView, TraderBook};
    use types::Archetype;

    /// One market maker and nothing else; inert until probes are added.
    fn lean_config() -> SimConfig {
        SimConfig::default()
            .noise_traders(0)
            .momentum_traders(0)
            .fundamental_traders(0)
            .retail_investors(0)
            .market_makers(1)
            .initiators(0)
            .hedge_funds(0)
    }

    struct PassiveAgent {
        id: AgentId,
        book: TraderBook,
    }

    impl PassiveAgent {
        fn boxed(slot: u64) -> Box<dyn Agent> {
            let id = AgentId(slot);
            Box::new(Self {
                id,
                book: TraderBook::new(id, TraderParams::default()),
            })
        }
    }

    impl Agent for PassiveAgent {
        fn id(&self) -> AgentId {
            self.id
        }
        fn archetype(&self) -> Archetype {
            Archetype::Noise
        }
        fn book(&self) -> &TraderBook {
            &self.book
        }
        fn book_mut(&mut self) -> &mut TraderBook {
            &mut self.book
        }
        fn on_tick(&mut self, _view: &MarketView<'_>) {}
    }

    /// Buys (positive volume) or sells (negative volume) once.
    struct OneShotAgent {
        id: AgentId,
        book: TraderBook,
        fire_tick: Tick,
        volume: f64,
    }

    impl OneShotAgent {
        fn boxed(slot: u64, fire_tick: Tick, volume: f64) -> Box<dyn Agent> {
            let id = AgentId(slot);
            Box::new(Self {
                id,
                book: TraderBook::new(id, TraderParams::default()),
                fire_tick,
                volume,
            })
        }
    }

    impl Agent for OneShotAgent {
        fn id(&self) -> AgentId {
            self.id
        }
        fn archetype(&self) -> Archetype {
            Archetype::Noise
        }
        fn book(&self) -> &TraderBook {
            &self.book
        }
        fn book_mut(&mut self) -> &mut TraderBook {
            &mut self.book
        }
        fn on_tick(&mut self, view: &MarketView<'_>) {
            if view.tick == self.fire_tick {
                if self.volume > 0.0 {
                    self.book.buy(self.volume, view);
                } else {
                    self.book.sell(-self.volume, view);
                }
            }
        }
    }

    /// Buys a single call on the first tick.
    struct OptionShopper {
        id: AgentId,
        book: TraderBook,
        bought: bool,
    }

    impl OptionShopper {
        fn boxed(slot: u64) -> Box<dyn Agent> {
            let id = AgentId(slot);
            Box::new(Self {
                id,
                book: TraderBook::new(id, TraderParams::default()),
                bought: false,
            })
        }
    }

    impl Agent for OptionShopper {
        fn id(&self) -> AgentId {
            self.id
        }
        fn archetype(&self) -> Archetype {
            Archetype::Noise
        }
        fn book(&self) -> &TraderBook {
            &self.book
        }
        fn book_mut(&mut self) -> &mut TraderBook {
            &mut self.book
        }
        fn on_tick(&mut self, view: &MarketView<'_>) {
            if !self.bought {
                self.book.buy_call(15, view);
                self.bought = true;
            }
        }
    }

    /// Starts in the red and buys on credit at tick 0.
    struct BorrowProbe {
        id: AgentId,
        book: TraderBook,
    }

    impl BorrowProbe {
        fn boxed(slot: u64) -> Box<dyn Agent> {
            let id = AgentId(slot);
            let mut book =
                TraderBook::new(id, TraderParams::default()).with_credit(CreditTerms::default());
            book.capital = -50.0;
            Box::new(Self { id, book })
        }
    }

    impl Agent for BorrowProbe {
        fn id(&self) -> AgentId {
            self.id
        }
        fn archetype(&self) -> Archetype {
            Archetype::Noise
        }
        fn book(&self) -> &TraderBook {
            &self.book
        }
        fn book_mut(&mut self) -> &mut TraderBook {
            &mut self.book
        }
        fn on_tick(&mut self, view: &MarketView<'_>) {
            if view.tick == 0 {
                self.book.buy(10.0, view);
            }
        }
    }

    #[test]
    fn rejects_an_empty_population() {
        let config = lean_config().market_makers(0);
        assert_eq!(
            Simulation::new(config).err(),
            Some(ConfigError::EmptySimulation)
        );
    }

    #[test]
    fn maker_only_market_stays_flat() {
        let mut sim = Simulation::new(lean_config().seed(99)).unwrap();
        for _ in 0..30 {
            let record = sim.step();
            assert_eq!(record.price, 15.0);
            assert_eq!(record.net_demand, 0.0);
            assert!(!record.market_failed);
        }
    }

    #[test]
    fn a_buy_order_moves_the_price_by_the_impact_rule() {
        let mut sim = Simulation::new(lean_config().seed(5)).unwrap();
        sim.add_agent(OneShotAgent::boxed(1, 0, 100.0));

        // (100 net / 2 participants) / lambda 10 = 5.
        let record = sim.step();
        assert_eq!(record.price, 20.0);
        assert_eq!(record.price_change, 5.0);
        assert_eq!(record.buys, 100.0);

        let record = sim.step();
        assert_eq!(record.price, 20.0);
        assert_eq!(record.net_demand, 0.0);
    }

    #[test]
    fn sell_glut_fails_the_market_and_halts_the_run() {
        let config = lean_config().seed(5).halt_on_market_failure(true);
        let mut sim = Simulation::new(config).unwrap();
        sim.add_agent(OneShotAgent::boxed(1, 0, -10_000.0));

        let summary = sim.run(5);

        assert_eq!(sim.records().len(), 1);
        assert_eq!(sim.tick(), 1);
        let record = &sim.records()[0];
        assert_eq!(record.price, 0.0);
        assert_eq!(record.price_change, -500.0);
        assert!(record.market_failed);
        assert!(summary.market_failed);
        assert_eq!(summary.final_price, 0.0);
    }

    #[test]
    fn option_purchases_route_to_the_writer_next_tick() {
        let mut sim = Simulation::new(lean_config().seed(3)).unwrap();
        sim.add_agent(OptionShopper::boxed(1));

        let first = sim.step();
        assert_eq!(first.calls_bought, 1);
        assert_eq!(first.buys, 0.0);

        // The maker covers the 10-share stock leg of the written call.
        let second = sim.step();
        assert_eq!(second.buys, 10.0);
        assert_eq!(sim.agent(0).book().shares, 10.0);
        assert_eq!(sim.agent(1).book().options.len(), 1);
    }

    #[test]
    fn option_purchases_without_a_maker_are_dropped() {
        // A hedge fund sits idle until its entry tick, so the only
        // activity here is the shopper's purchase.
        let config = lean_config().market_makers(0).hedge_funds(1).seed(17);
        let mut sim = Simulation::new(config).unwrap();
        sim.add_agent(OptionShopper::boxed(1));

        let first = sim.step();
        assert_eq!(first.calls_bought, 1);
        let second = sim.step();
        assert_eq!(second.buys, 0.0);
    }

    #[test]
    fn credit_purchases_get_funded_by_the_bank() {
        let mut sim = Simulation::new(lean_config().seed(11)).unwrap();
        sim.add_agent(BorrowProbe::boxed(1));

        sim.step();
        sim.step();

        // 10 shares at the initial price of 15, requested once.
        assert_eq!(sim.bank().outstanding_loans(), 150.0);
        let probe = sim.agent(1);
        assert_eq!(probe.book().loan.outstanding(), 150.0);
        assert!(probe.book().can_borrow);
    }

    #[test]
    fn same_seed_gives_identical_records() {
        let config = SimConfig::smoke().seed(7);
        let mut a = Simulation::new(config.clone()).unwrap();
        let mut b = Simulation::new(config).unwrap();
        for _ in 0..20 {
            a.step();
            b.step();
        }
        assert_eq!(a.records(), b.records());
    }

    #[test]
    fn run_advances_the_clock_and_keeps_every_record() {
        let mut sim = Simulation::new(SimConfig::smoke().seed(21)).unwrap();
        let summary = sim.run(10);

        assert_eq!(sim.records().len(), 10);
        assert_eq!(sim.tick(), 10);
        assert_eq!(summary.ticks, 10);
        for (offset, record) in sim.records().iter().enumerate() {
            assert_eq!(record.tick, offset as Tick);
            assert!(record.price.is_finite());
            assert!(record.price >= 0.0);
        }
    }

    #[test]
    fn revaluation_accrues_cash_interest_at_the_posted_rate() {
        let mut sim = Simulation::new(lean_config().seed(13)).unwrap();
        sim.add_agent(PassiveAgent::boxed(1));

        let record = sim.step();

        let expected = 10_000.0 * (1.0 + record.interest_rate / 365.0);
        let capital = sim.agent(1).book().capital;
        assert!((capital - expected).abs() < 1e-9);
    }
}
