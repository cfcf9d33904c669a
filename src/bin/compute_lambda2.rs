//! Phase 2: load the edge list and star mapping, build the coarse
//! Laplacian and report its spectral gap λ2.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use sigma_net_sim::config::{RunConfig, SolverConfig, DEFAULT_EDGES_PATH, DEFAULT_STARS_PATH};
use sigma_net_sim::pipeline;

#[derive(Parser)]
#[command(name = "compute-lambda2")]
#[command(version, about = "Spectral gap of the block-star coarse graph")]
struct Cli {
    /// Fine edge list written by build-sigma-net
    #[arg(long, default_value = DEFAULT_EDGES_PATH)]
    edges: PathBuf,

    /// Star mapping written by build-sigma-net
    #[arg(long, default_value = DEFAULT_STARS_PATH)]
    stars: PathBuf,

    /// Ritz residual tolerance (speed/accuracy trade-off)
    #[arg(long, default_value_t = SolverConfig::default().tol)]
    tol: f64,

    /// Maximum Lanczos steps
    #[arg(long, default_value_t = SolverConfig::default().max_iter)]
    max_iter: usize,

    /// Seed of the Lanczos start vector
    #[arg(long, default_value_t = SolverConfig::default().seed)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = RunConfig {
        edges_path: cli.edges,
        stars_path: cli.stars,
        solver: SolverConfig {
            tol: cli.tol,
            max_iter: cli.max_iter,
            seed: cli.seed,
        },
        ..RunConfig::default()
    };

    let analysis = pipeline::analyze_files(&cfg)?;
    println!("  fine edges : {}", analysis.fine_edges);
    println!("  block stars: {} (dense rows)", analysis.stars);
    println!();
    println!("lambda2 = {:.6}", analysis.gap.lambda2);
    println!("done.");
    Ok(())
}
