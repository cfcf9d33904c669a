//! Run configuration shared by both phases.
//!
//! One [`RunConfig`] value carries the lattice size, both file paths and the
//! solver parameters. Phase 1 uses the lattice and the output paths; phase 2
//! reads the same paths back.

use std::path::PathBuf;

use crate::error::{SigmaError, SigmaResult};
use crate::lattice::LatticeSize;

/// Default location of the fine edge list.
pub const DEFAULT_EDGES_PATH: &str = "fine_graph.edgelist";

/// Default location of the star mapping.
pub const DEFAULT_STARS_PATH: &str = "block_stars.json";

/// Parameters for the iterative eigensolver.
///
/// `tol` bounds the Ritz residual `|beta_m * s_m|` relative to the Ritz
/// value |θ|, the ARPACK convention. 1e-3 alone is a loose, fast criterion
/// that can leave λ2 off in the fifth decimal, so Lanczos also requires the
/// residual² / separation error bound and the change of θ between checks
/// to be below 1e-9. Together these keep the six printed digits exact.
/// Tightening `tol` only adds Lanczos steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Residual tolerance for convergence.
    pub tol: f64,
    /// Maximum Lanczos steps before giving up.
    pub max_iter: usize,
    /// Seed for the random start vector.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tol: 1e-3,
            max_iter: 300,
            seed: 0x5167_4d41,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SigmaResult<()> {
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(SigmaError::Config(format!(
                "solver tolerance must be positive and finite, got {}",
                self.tol
            )));
        }
        if self.max_iter == 0 {
            return Err(SigmaError::Config(
                "solver iteration cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a generation or analysis run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Toroidal lattice dimensions (N0, N1, N2, N3).
    pub lattice: LatticeSize,
    /// Fine edge list, one "src dst mu" line per edge.
    pub edges_path: PathBuf,
    /// Star mapping, JSON object of coarse id → fine edge ids.
    pub stars_path: PathBuf,
    /// Eigensolver parameters for phase 2.
    pub solver: SolverConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeSize::cubic(4),
            edges_path: PathBuf::from(DEFAULT_EDGES_PATH),
            stars_path: PathBuf::from(DEFAULT_STARS_PATH),
            solver: SolverConfig::default(),
        }
    }
}

impl RunConfig {
    /// Default paths and solver, given lattice.
    pub fn with_lattice(lattice: LatticeSize) -> Self {
        Self {
            lattice,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SigmaResult<()> {
        self.lattice.validate()?;
        self.solver.validate()
    }
}
