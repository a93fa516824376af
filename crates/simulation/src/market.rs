//! Shared market state: price formation and the demand forecaster.
//!
//! `MarketState` is the one value every phase reads, through the
//! [`MarketView`] snapshot. Only the price-formation step and the
//! end-of-tick engine updates mutate it, exactly once per tick and
//! strictly after all order-emitting phases.
//!
//! Histories are append-only and keyed by tick: `prices[t]` is the
//! traded price at the start of tick `t`, `net_demand[t]` and
//! `total_demand[t]` the aggregated order flow observed during tick
//! `t`. The forecaster fits polynomials through the trailing window of
//! net demand and price; their extrapolations feed the market makers'
//! imbalance compensation and the borrowers' carry decisions.

use agents::MarketView;
use quant::FittedPoly;
use tracing::{debug, warn};
use types::Tick;

use crate::config::SimConfig;

/// Total-demand forecast while no demand has been observed; large
/// enough that any imbalance ratio against it stays under trading
/// thresholds.
const TOTAL_DEMAND_SENTINEL: f64 = 1_000_000.0;

/// Trailing ticks averaged by the total-demand forecast.
const TOTAL_DEMAND_LOOKBACK: usize = 5;

/// Ticks ahead at which the fitted price curve is read off as the
/// shared `projected_price`.
const PROJECTION_HORIZON: f64 = 1.0;

/// The singleton market: current price, rolling histories, and the
/// fitted forecast curves.
#[derive(Debug)]
pub struct MarketState {
    tick: Tick,
    price: f64,
    price_change: f64,
    interest_rate: f64,
    volatility: f64,
    market_failed: bool,
    lambda: f64,
    participants: usize,
    forecast_window: usize,
    prices: Vec<f64>,
    net_demand: Vec<f64>,
    total_demand: Vec<f64>,
    net_demand_fit: Option<FittedPoly>,
    price_fit: Option<FittedPoly>,
}

impl MarketState {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            tick: 0,
            price: config.initial_price,
            price_change: 0.0,
            interest_rate: config.initial_rate,
            volatility: config.default_volatility,
            market_failed: false,
            lambda: config.lambda,
            participants: config.order_emitting_participants(),
            forecast_window: config.forecast_window,
            prices: vec![config.initial_price],
            net_demand: Vec::new(),
            total_demand: Vec::new(),
            net_demand_fit: None,
            price_fit: None,
        }
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn price_change(&self) -> f64 {
        self.price_change
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn market_failed(&self) -> bool {
        self.market_failed
    }

    /// Price history keyed by tick; the last entry is the current price.
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Snapshot handed to agents for the current phase.
    pub fn view(&self) -> MarketView<'_> {
        MarketView {
            tick: self.tick,
            price: self.price,
            price_change: self.price_change,
            interest_rate: self.interest_rate,
            volatility: self.volatility,
            projected_price: self.project_price(PROJECTION_HORIZON),
            predicted_net_demand: self.predict_net_demand(0.0),
            predicted_total_demand: self.predict_total_demand(),
            prices: &self.prices,
            market_failed: self.market_failed,
        }
    }

    /// Count one more order-emitting participant in the impact
    /// denominator. Used when agents are added past construction.
    pub(crate) fn add_participant(&mut self) {
        self.participants += 1;
    }

    /// Apply this tick's aggregated order flow to the price.
    ///
    /// `priceChange = (netDemand / participants) / lambda`; a zero net
    /// demand leaves the price untouched and broadcasts a zero change.
    /// A price driven to or below zero is clamped at zero and latches
    /// the market-failure flag; the broadcast change stays the raw
    /// computed one. The history entry for the next tick is appended
    /// here, so `prices` always ends at the current price.
    pub fn apply_orders(&mut self, buys: f64, sells: f64) {
        let net = buys - sells;
        let total = buys + sells;
        self.net_demand.push(net);
        self.total_demand.push(total);

        if net == 0.0 {
            self.price_change = 0.0;
        } else {
            let change = (net / self.participants as f64) / self.lambda;
            self.price_change = change;
            let new_price = self.price + change;
            if new_price > 0.0 {
                self.price = new_price;
            } else {
                self.price = 0.0;
                if !self.market_failed {
                    warn!(tick = self.tick, change, "price clamped at zero: market failed");
                }
                self.market_failed = true;
            }
        }
        self.prices.push(self.price);
        debug!(
            tick = self.tick,
            price = self.price,
            net,
            total,
            "price formed"
        );
    }

    /// Refit the forecast curves over the trailing window.
    ///
    /// Runs right after price formation; no-ops until a full window of
    /// demand history exists. Both fits span `forecast_window + 1`
    /// points at degree `forecast_window`, so a full window is an
    /// exact interpolation.
    pub fn update_forecasts(&mut self) {
        if self.tick < self.forecast_window as Tick {
            return;
        }
        let span = self.forecast_window + 1;

        let start = self.net_demand.len() - span.min(self.net_demand.len());
        let xs: Vec<f64> = (start..self.net_demand.len()).map(|i| i as f64).collect();
        self.net_demand_fit = FittedPoly::fit(&xs, &self.net_demand[start..], self.forecast_window);

        let start = self.prices.len() - span.min(self.prices.len());
        let xs: Vec<f64> = (start..self.prices.len()).map(|i| i as f64).collect();
        self.price_fit = FittedPoly::fit(&xs, &self.prices[start..], self.forecast_window);
    }

    /// Net demand forecast `tick_offset` ticks ahead of the current
    /// tick; 0 while history is shorter than the forecast window.
    pub fn predict_net_demand(&self, tick_offset: f64) -> f64 {
        if self.tick <= self.forecast_window as Tick {
            return 0.0;
        }
        match &self.net_demand_fit {
            Some(fit) => fit.value(self.tick as f64 + tick_offset),
            None => 0.0,
        }
    }

    /// Average total demand over the trailing lookback, or the large
    /// sentinel while nothing (or only silence) has been observed, so
    /// imbalance ratios stay negligible until the market wakes up.
    pub fn predict_total_demand(&self) -> f64 {
        let len = self.total_demand.len();
        if len == 0 {
            return TOTAL_DEMAND_SENTINEL;
        }
        let taken = len.min(TOTAL_DEMAND_LOOKBACK);
        let sum: f64 = self.total_demand[len - taken..].iter().sum();
        if sum == 0.0 {
            TOTAL_DEMAND_SENTINEL
        } else {
            sum / taken as f64
        }
    }

    /// Price read off the fitted price curve `tick_offset` ticks past
    /// the newest observation; the current price until a fit exists.
    pub fn project_price(&self, tick_offset: f64) -> f64 {
        match &self.price_fit {
            Some(fit) => fit.value((self.prices.len() - 1) as f64 + tick_offset),
            None => self.price,
        }
    }

    pub(crate) fn set_interest_rate(&mut self, rate: f64) {
        self.interest_rate = rate;
    }

    pub(crate) fn set_volatility(&mut self, volatility: f64) {
        self.volatility = volatility;
    }

    /// Advance to the next tick. The runner calls this once, after the
    /// revaluation phase.
    pub(crate) fn finalize_tick(&mut self) {
        self.tick += 1;
    }
}
