//! swarm-market binary.
//!
//! Assembles the configured population, runs the requested number of
//! ticks headless, optionally streams every tick record to a JSON-lines
//! file, and prints a closing report to stderr. Engine logs go through
//! `tracing`; raise `RUST_LOG` for per-phase detail.

mod config;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use clap::Parser;
use simulation::{RunSummary, Simulation, TickRecord};
use tracing::info;

use crate::config::Args;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = args.sim_config();

    eprintln!(
        "swarm-market: {} agents ({} emitting orders), {} ticks, seed {}",
        config.total_agents(),
        config.order_emitting_participants(),
        args.ticks,
        config.seed
    );

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    let started = Instant::now();
    let summary = sim.run(args.ticks);
    let elapsed = started.elapsed().as_secs_f64();

    if let Some(path) = &args.output {
        match write_records(path, sim.records()) {
            Ok(()) => info!(
                path = %path.display(),
                records = sim.records().len(),
                "tick records written"
            ),
            Err(err) => {
                eprintln!("failed to write {}: {err}", path.display());
                std::process::exit(1);
            }
        }
    }

    report(&summary, elapsed);
}

/// One JSON object per tick, in tick order.
fn write_records(path: &Path, records: &[TickRecord]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

fn report(summary: &RunSummary, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        summary.ticks as f64 / elapsed
    } else {
        0.0
    };
    eprintln!();
    eprintln!(
        "run complete: {} ticks in {elapsed:.2}s ({rate:.0} ticks/s)",
        summary.ticks
    );
    eprintln!(
        "  price    final {:.2}   peak {:.2}   trough {:.2}",
        summary.final_price, summary.peak_price, summary.trough_price
    );
    eprintln!(
        "  volume   buys {:.0}   sells {:.0}   shorts {:.0}",
        summary.total_buys, summary.total_sells, summary.total_shorts
    );
    eprintln!(
        "  options  calls {}   puts {}",
        summary.calls_bought, summary.puts_bought
    );
    if summary.market_failed {
        eprintln!("  market failed: the price was clamped at zero");
    }
}
