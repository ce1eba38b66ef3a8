//! Differential stress bench for tide-core detector nodes.
//!
//! Drives randomized flooding runs (claims, blossom formation and shattering)
//! over square-lattice decoding graphs and checks after every time step that
//! the cached radius path, the chain walk and an independent reference agree.
//! Reports per-pass latency of cached and uncached radius queries.

mod simulation;
mod stats;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tide_core::testing_graphs::GraphConfig;
use tide_core::{Arena, GraphBuilder};
use tracing_subscriber::EnvFilter;

use crate::simulation::{FloodSimulation, RunReport, SimulationParams};
use crate::stats::{calculate_percentiles, format_number, LatencyStats};

#[derive(Parser, Debug)]
#[command(name = "tide-bench")]
#[command(about = "Stress-test tide-core radius bookkeeping against a reference model")]
struct Args {
    /// Lattice sizes to run (square grids)
    #[arg(long, num_args = 1.., default_values_t = vec![17, 32, 64])]
    grids: Vec<usize>,

    /// Decoding runs per grid
    #[arg(long, default_value_t = 1000)]
    runs: usize,

    /// Time steps per run
    #[arg(long, default_value_t = 24)]
    steps: i32,

    /// Detection events seeded per run
    #[arg(long, default_value_t = 16)]
    sources: usize,

    /// Probability of wrapping two top-level regions at each step
    #[arg(long, default_value_t = 0.4)]
    wrap_prob: f64,

    /// Probability of shattering a top-level blossom at each step
    #[arg(long, default_value_t = 0.2)]
    shatter_prob: f64,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Aggregated results for one grid size.
struct GridResults {
    size: usize,
    runs: usize,
    claimed: usize,
    checked: usize,
    wraps: usize,
    shatters: usize,
    max_depth: usize,
    uncached: LatencyStats,
    cached: LatencyStats,
}

fn run_grid(size: usize, args: &Args) -> Result<GridResults> {
    let config = GraphConfig::new(size, size, 2);
    let edges: Vec<_> = config.edges().collect();
    let builder = GraphBuilder::new(config.num_nodes())
        .edges(&edges)
        .num_observables(1);

    let mut buffer = vec![0u8; builder.required_buffer_size()];
    let mut arena = Arena::new(&mut buffer);
    let (graph, regions) = builder
        .build_with_regions(&mut arena)
        .with_context(|| format!("building {size}x{size} graph"))?;
    tracing::info!(
        nodes = config.num_nodes(),
        edges = edges.len(),
        bytes = arena.used(),
        "graph ready"
    );

    let params = SimulationParams {
        sources: args.sources,
        steps: args.steps,
        wrap_probability: args.wrap_prob,
        shatter_probability: args.shatter_prob,
    };
    let mut sim = FloodSimulation::new(graph, regions, args.seed ^ size as u64, params);

    let mut reports: Vec<RunReport> = Vec::with_capacity(args.runs);
    for run in 0..args.runs {
        let report = sim
            .run()
            .with_context(|| format!("run {run} on {size}x{size}"))?;
        tracing::debug!(
            run,
            claimed = report.claimed,
            wraps = report.wraps,
            shatters = report.shatters,
            depth = report.max_depth,
            "run verified"
        );
        reports.push(report);
    }

    let uncached: Vec<_> = reports.iter().map(|r| r.uncached_time).collect();
    let cached: Vec<_> = reports.iter().map(|r| r.cached_time).collect();
    Ok(GridResults {
        size,
        runs: args.runs,
        claimed: reports.iter().map(|r| r.claimed).sum(),
        checked: reports.iter().map(|r| r.checked).sum(),
        wraps: reports.iter().map(|r| r.wraps).sum(),
        shatters: reports.iter().map(|r| r.shatters).sum(),
        max_depth: reports.iter().map(|r| r.max_depth).max().unwrap_or(0),
        uncached: calculate_percentiles(&uncached),
        cached: calculate_percentiles(&cached),
    })
}

fn print_results(results: &[GridResults]) {
    println!();
    println!("{}", "=".repeat(70));
    println!("Verification");
    println!("{}", "=".repeat(70));
    println!("{:-<8}+{:-<10}+{:-<14}+{:-<16}+{:-<10}+{:-<8}", "", "", "", "", "", "");
    println!(
        "{:>8}|{:>10}|{:>14}|{:>16}|{:>10}|{:>8}",
        "Grid", "Runs", "Claimed", "Node checks", "Wraps", "Depth"
    );
    println!("{:-<8}+{:-<10}+{:-<14}+{:-<16}+{:-<10}+{:-<8}", "", "", "", "", "", "");
    for r in results {
        println!(
            "{:>8}|{:>10}|{:>14}|{:>16}|{:>10}|{:>8}",
            format!("{0}x{0}", r.size),
            format_number(r.runs),
            format_number(r.claimed),
            format_number(r.checked),
            format!("{}/{}", format_number(r.wraps), format_number(r.shatters)),
            r.max_depth,
        );
    }
    println!("{:-<8}+{:-<10}+{:-<14}+{:-<16}+{:-<10}+{:-<8}", "", "", "", "", "", "");

    println!("\nRadius query pass latency (nanoseconds):");
    println!("{:-<8}+{:-<10}+{:-<10}+{:-<10}+{:-<10}+{:-<10}", "", "", "", "", "", "");
    println!(
        "{:>8}|{:>10}|{:>10}|{:>10}|{:>10}|{:>10}",
        "Grid", "Path", "avg", "p50", "p95", "p99"
    );
    println!("{:-<8}+{:-<10}+{:-<10}+{:-<10}+{:-<10}+{:-<10}", "", "", "", "", "", "");
    for r in results {
        for (label, s) in [("walk", &r.uncached), ("cached", &r.cached)] {
            println!(
                "{:>8}|{:>10}|{:>10.0}|{:>10.0}|{:>10.0}|{:>10.0}",
                format!("{0}x{0}", r.size),
                label,
                s.avg_ns,
                s.p50_ns,
                s.p95_ns,
                s.p99_ns,
            );
        }
        println!(
            "{:>8}|{:>10}|{:>9.2}x|",
            "",
            "speedup",
            r.cached.speedup_over(&r.uncached)
        );
    }
    println!("{:-<8}+{:-<10}+{:-<10}+{:-<10}+{:-<10}+{:-<10}", "", "", "", "", "", "");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.steps > 0, "--steps must be positive");
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.wrap_prob) && (0.0..=1.0).contains(&args.shatter_prob),
        "probabilities must lie in [0, 1]"
    );

    println!("Stress: tide-core detector-node radius bookkeeping");
    println!("Grids: {:?}", args.grids);
    println!("Runs per grid: {}", format_number(args.runs));

    let started = Instant::now();
    let mut results = Vec::with_capacity(args.grids.len());
    for &size in &args.grids {
        tracing::info!(size, "running grid");
        results.push(run_grid(size, &args)?);
    }

    print_results(&results);
    println!(
        "\nAll {} node checks passed in {:.2?}.",
        format_number(results.iter().map(|r| r.checked).sum()),
        started.elapsed()
    );
    Ok(())
}
