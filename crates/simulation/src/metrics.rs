//! Per-tick records and end-of-run aggregation.
//!
//! The runner drains the named order-flow accumulators (buys, sells,
//! shorts, calls, puts) once per tick, together with the freshly formed
//! price and engine state, into an append-only vector of `TickRecord`s.
//! The binary serializes them as JSON lines; `RunSummary` condenses a
//! whole run for the end-of-run report.

use serde::Serialize;
use types::Tick;

/// One tick's worth of aggregated market activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick: Tick,
    /// Price after this tick's formation step.
    pub price: f64,
    pub price_change: f64,
    pub net_demand: f64,
    pub total_demand: f64,
    pub interest_rate: f64,
    pub volatility: f64,
    /// Aggregate buy volume, including short covers.
    pub buys: f64,
    /// Aggregate sell volume, including the shorted portion.
    pub sells: f64,
    /// Shorted portion of the sell volume, tallied separately.
    pub shorts: f64,
    pub calls_bought: u32,
    pub puts_bought: u32,
    pub market_failed: bool,
}

/// Aggregates over a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: usize,
    pub final_price: f64,
    pub peak_price: f64,
    pub trough_price: f64,
    pub total_buys: f64,
    pub total_sells: f64,
    pub total_shorts: f64,
    pub calls_bought: u64,
    pub puts_bought: u64,
    pub market_failed: bool,
}

impl RunSummary {
    /// Condense a run's records; `initial_price` stands in for the
    /// price extremes when no tick ever ran.
    pub fn from_records(records: &[TickRecord], initial_price: f64) -> Self {
        let mut summary = Self {
            ticks: records.len(),
            final_price: records.last().map_or(initial_price, |r| r.price),
            peak_price: initial_price,
            trough_price: initial_price,
            total_buys: 0.0,
            total_sells: 0.0,
            total_shorts: 0.0,
            calls_bought: 0,
            puts_bought: 0,
            market_failed: records.last().is_some_and(|r| r.market_failed),
        };
        for record in records {
            summary.peak_price = summary.peak_price.max(record.price);
            summary.trough_price = summary.trough_price.min(record.price);
            summary.total_buys += record.buys;
            summary.total_sells += record.sells;
            summary.total_shorts += record.shorts;
            summary.calls_bought += u64::from(record.calls_bought);
            summary.puts_bought += u64::from(record.puts_bought);
        }
        summary
    }
}
