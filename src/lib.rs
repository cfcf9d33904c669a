//! # sigma-net-sim
//!
//! Block-star coarse graining of the periodic 4D lattice T⁴ and the spectral
//! gap of the resulting coarse graph.
//!
//! ## Pipeline
//!
//! ```text
//! Phase 1:  lattice → fine edges → coarse edges → block stars → files
//! Phase 2:  files → M (stars × fine edges) → S = M·Mᵗ
//!           → L = I − D^(−1/2) S D^(−1/2) → λ1 ≈ 0, λ2
//! ```
//!
//! The fine lattice has 4·∏Ni edges. Stars are anchored on the even
//! sublattice (one per even vertex and direction) and collect nearby fine
//! edges; the aggregation runs in time linear in the number of fine edges.
//! λ2 of the coarse Laplacian measures how fast diffusion mixes on the
//! coarse graph and closes like 1/L² with the box size.
//!
//! ## Usage
//!
//! ```no_run
//! use sigma_net_sim::prelude::*;
//!
//! let cfg = RunConfig::with_lattice(LatticeSize::cubic(8));
//! let analysis = run_in_memory(&cfg).unwrap();
//! println!("lambda2 = {:.6}", analysis.gap.lambda2);
//! ```

pub mod config;
pub mod error;
pub mod lattice;
pub mod stars;
pub mod persist;
pub mod aggregation;
pub mod laplacian;
pub mod spectral;
pub mod pipeline;
pub mod scaling;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::lattice::*;
    pub use crate::stars::*;
    pub use crate::persist::*;
    pub use crate::aggregation::*;
    pub use crate::laplacian::*;
    pub use crate::spectral::*;
    pub use crate::pipeline::*;
    pub use crate::scaling::*;
}
