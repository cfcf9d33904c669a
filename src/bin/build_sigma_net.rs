//! Phase 1: periodic T⁴ lattice and 2×2×2×2 block stars, written to disk.
//!
//! ```text
//! build-sigma-net --N0 32 --N1 64 --N2 64 --N3 64 \
//!     --out_edges fine_graph.edgelist --out_stars block_stars.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use sigma_net_sim::config::{RunConfig, DEFAULT_EDGES_PATH, DEFAULT_STARS_PATH};
use sigma_net_sim::lattice::LatticeSize;
use sigma_net_sim::pipeline;

#[derive(Parser)]
#[command(name = "build-sigma-net")]
#[command(version, about = "Generate the fine edge list and block-star mapping of a T⁴ lattice")]
struct Cli {
    /// Lattice extent along direction 0
    #[arg(long = "N0", alias = "n0", default_value_t = 4)]
    n0: usize,

    /// Lattice extent along direction 1
    #[arg(long = "N1", alias = "n1", default_value_t = 4)]
    n1: usize,

    /// Lattice extent along direction 2
    #[arg(long = "N2", alias = "n2", default_value_t = 4)]
    n2: usize,

    /// Lattice extent along direction 3
    #[arg(long = "N3", alias = "n3", default_value_t = 4)]
    n3: usize,

    /// Output file: one "src dst mu" line per fine edge
    #[arg(long = "out_edges", alias = "out-edges", default_value = DEFAULT_EDGES_PATH)]
    out_edges: PathBuf,

    /// Output file: JSON object coarse id → fine edge ids
    #[arg(long = "out_stars", alias = "out-stars", default_value = DEFAULT_STARS_PATH)]
    out_stars: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = RunConfig {
        lattice: LatticeSize::new([cli.n0, cli.n1, cli.n2, cli.n3]),
        edges_path: cli.out_edges,
        stars_path: cli.out_stars,
        ..RunConfig::default()
    };

    pipeline::generate_and_write(&cfg)?;
    Ok(())
}
