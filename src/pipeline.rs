//! The two batch phases.
//!
//! Phase 1 builds the lattice, the coarse edges and the stars, and writes
//! the edge list and star mapping. Phase 2 reads those two files back,
//! builds M, S and L, and extracts λ2. The files are the only state shared
//! between the phases, so a large lattice can be generated once and
//! analyzed repeatedly.

use crate::aggregation::AggregationMatrix;
use crate::config::RunConfig;
use crate::error::SigmaResult;
use crate::lattice::{EdgeIndex, FineEdge, LatticeSize};
use crate::laplacian::CoarseLaplacian;
use crate::persist;
use crate::spectral::{spectral_gap, Lanczos, SpectralGap, SymmetricEigensolver};
use crate::stars::{aggregate_stars, CoarseIndex, StarMap};

/// Output of phase 1.
#[derive(Debug, Clone)]
pub struct SigmaNet {
    pub lattice: LatticeSize,
    /// Fine edges in dense id order.
    pub edges: Vec<FineEdge>,
    /// Coarse edge ids handed out, including ones that lost their key.
    pub coarse_edges: usize,
    pub stars: StarMap,
}

/// Build edges and stars for a lattice.
pub fn generate(lattice: &LatticeSize) -> SigmaResult<SigmaNet> {
    lattice.validate()?;
    log::info!("[σ-net] lattice size {}", lattice);

    let index = EdgeIndex::build(lattice);
    log::info!("[σ-net] fine edges : {}", index.len());

    let coarse = CoarseIndex::build(lattice, index.edges());
    log::info!("[σ-net] coarse edges: {}", coarse.len());

    let stars = aggregate_stars(lattice, &index, &coarse);
    log::debug!(
        "[σ-net] {} stars, {} memberships",
        stars.len(),
        stars.total_members()
    );

    Ok(SigmaNet {
        lattice: *lattice,
        coarse_edges: coarse.len(),
        edges: index.into_edges(),
        stars,
    })
}

/// Persist phase 1 output to the configured paths.
pub fn write_net(cfg: &RunConfig, net: &SigmaNet) -> SigmaResult<()> {
    persist::write_edges(&cfg.edges_path, &net.edges)?;
    persist::write_stars(&cfg.stars_path, &net.stars)?;
    log::info!(
        "[σ-net] written {} {}",
        cfg.edges_path.display(),
        cfg.stars_path.display()
    );
    Ok(())
}

/// Phase 1: generate and write.
pub fn generate_and_write(cfg: &RunConfig) -> SigmaResult<SigmaNet> {
    cfg.validate()?;
    let net = generate(&cfg.lattice)?;
    write_net(cfg, &net)?;
    Ok(net)
}

/// Output of phase 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Analysis {
    pub fine_edges: usize,
    pub stars: usize,
    pub gap: SpectralGap,
}

/// Build M, L and the gap from loaded data.
pub fn analyze<S: SymmetricEigensolver + ?Sized>(
    fine_edges: usize,
    stars: &StarMap,
    solver: &S,
) -> SigmaResult<Analysis> {
    log::info!("building aggregation matrix");
    let agg = AggregationMatrix::build(fine_edges, stars)?;

    log::info!("building Laplacian L_sym = I - D^(-1/2) S D^(-1/2)");
    let lap = CoarseLaplacian::build(&agg)?;
    log::debug!("laplacian {}x{}, nnz {}", lap.dim(), lap.dim(), lap.matrix().nnz());

    log::info!("extracting second smallest eigenvalue");
    let gap = spectral_gap(&lap, solver)?;
    log::info!(
        "lambda1 = {:.3e}, lambda2 = {:.6} after {} iterations (residual {:.2e})",
        gap.lambda1,
        gap.lambda2,
        gap.iterations,
        gap.residual
    );

    Ok(Analysis {
        fine_edges,
        stars: agg.num_stars(),
        gap,
    })
}

/// Phase 2: read the configured files and analyze them with Lanczos.
pub fn analyze_files(cfg: &RunConfig) -> SigmaResult<Analysis> {
    cfg.solver.validate()?;
    log::info!(
        "loading {} and {}",
        cfg.edges_path.display(),
        cfg.stars_path.display()
    );
    let edges = persist::read_edges(&cfg.edges_path)?;
    let stars = persist::read_stars(&cfg.stars_path)?;
    analyze(edges.len(), &stars, &Lanczos::from_config(&cfg.solver))
}

/// Both phases without touching the filesystem.
pub fn run_in_memory(cfg: &RunConfig) -> SigmaResult<Analysis> {
    cfg.validate()?;
    let net = generate(&cfg.lattice)?;
    analyze(net.edges.len(), &net.stars, &Lanczos::from_config(&cfg.solver))
}
