//! Smallest eigenvalues of the coarse Laplacian.
//!
//! The solver contract is a trait: extract the k smallest-magnitude
//! eigenvalues of a symmetric sparse operator. Two implementations:
//!
//! - [`Lanczos`]: Krylov tridiagonalization with full reorthogonalization
//!   and locking. Eigenpairs are found one at a time; each new Krylov
//!   sequence runs in the orthogonal complement of the pairs already
//!   locked, so an eigenvalue of multiplicity m is reported m times (two
//!   zero modes on a disconnected coarse graph, for instance). The
//!   iteration cap is hard: failing to converge is an error, never a
//!   silently returned approximation.
//! - [`DenseEigensolver`]: full dense decomposition, exact but O(n³). Used
//!   for small operators and for cross-checking Lanczos.
//!
//! For the positive semi-definite Laplacian the smallest-magnitude
//! eigenvalues sit at the bottom edge of the spectrum, where Lanczos
//! converges first.

use nalgebra::{DMatrix, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprs::CsMat;

use crate::config::SolverConfig;
use crate::error::{SigmaError, SigmaResult};
use crate::laplacian::{apply, CoarseLaplacian};

/// β below this ends the Krylov sequence (invariant subspace).
const BREAKDOWN: f64 = 1e-10;

/// Ritz values are recomputed every this many Lanczos steps.
const CHECK_INTERVAL: usize = 5;

/// Bound on the error of an accepted eigenvalue.
const ACCURACY: f64 = 1e-9;

/// Scale floor for relative residuals near zero, ε^(2/3) as in ARPACK.
const ZERO_FLOOR: f64 = 3.7e-11;

/// Eigenvalue estimates with solver diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenEstimate {
    /// Eigenvalues, ascending.
    pub values: Vec<f64>,
    /// Lanczos steps taken (0 for dense).
    pub iterations: usize,
    /// Largest residual among the returned pairs.
    pub residual: f64,
}

/// Extract the k smallest-magnitude eigenvalues of a symmetric operator.
pub trait SymmetricEigensolver {
    fn smallest(&self, op: &CsMat<f64>, k: usize) -> SigmaResult<EigenEstimate>;
}

/// Lanczos iteration with full reorthogonalization and locking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lanczos {
    pub tol: f64,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for Lanczos {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl SymmetricEigensolver for Lanczos {
    fn smallest(&self, op: &CsMat<f64>, k: usize) -> SigmaResult<EigenEstimate> {
        let n = op.rows();
        if k > n {
            return Err(SigmaError::TooSmall {
                requested: k,
                dimension: n,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut locked: Vec<Vec<f64>> = Vec::with_capacity(k);
        let mut values = Vec::with_capacity(k);
        let mut iterations = 0;
        let mut residual = 0.0_f64;
        while locked.len() < k {
            let pair = self.lowest_pair(op, &locked, &mut rng)?;
            log::debug!(
                "locked eigenvalue {} = {:.10} after {} steps (residual {:.2e})",
                locked.len(),
                pair.value,
                pair.iterations,
                pair.residual
            );
            iterations += pair.iterations;
            residual = residual.max(pair.residual);
            values.push(pair.value);
            locked.push(pair.vector);
        }
        values.sort_by(f64::total_cmp);

        Ok(EigenEstimate {
            values,
            iterations,
            residual,
        })
    }
}

/// A converged eigenpair.
struct RitzPair {
    value: f64,
    vector: Vec<f64>,
    residual: f64,
    iterations: usize,
}

impl Lanczos {
    pub fn from_config(cfg: &SolverConfig) -> Self {
        Self {
            tol: cfg.tol,
            max_iter: cfg.max_iter,
            seed: cfg.seed,
        }
    }

    /// Smallest-magnitude eigenpair of `op` restricted to the orthogonal
    /// complement of `locked`. `max_iter` caps each such run.
    fn lowest_pair(
        &self,
        op: &CsMat<f64>,
        locked: &[Vec<f64>],
        rng: &mut StdRng,
    ) -> SigmaResult<RitzPair> {
        let n = op.rows();
        let room = n - locked.len();
        let steps_cap = self.max_iter.min(room);

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(steps_cap);
        let start = random_unit_orthogonal(n, locked, &[], rng);
        basis.push(start);
        let mut alpha: Vec<f64> = Vec::with_capacity(steps_cap);
        let mut beta: Vec<f64> = Vec::with_capacity(steps_cap);
        let mut w = vec![0.0; n];
        let mut previous: Option<f64> = None;

        for j in 0..steps_cap {
            apply(op, &basis[j], &mut w);
            if j > 0 {
                axpy(-beta[j - 1], &basis[j - 1], &mut w);
            }
            let a = dot(&w, &basis[j]);
            alpha.push(a);
            axpy(-a, &basis[j], &mut w);
            for q in locked.iter().chain(&basis) {
                let proj = dot(&w, q);
                axpy(-proj, q, &mut w);
            }
            let b = dot(&w, &w).sqrt();

            let steps = j + 1;
            // Locked vectors plus basis span the whole space: T is exact.
            let complete = steps == room;
            let exhausted = b < BREAKDOWN;
            if complete || steps == steps_cap || (!exhausted && steps % CHECK_INTERVAL == 0) {
                let b_next = if complete || exhausted { 0.0 } else { b };
                let ritz = lowest_ritz(&alpha, &beta, b_next);
                log::debug!(
                    "lanczos step {}: theta {:.10}, residual {:.2e}, separation {:.2e}",
                    steps,
                    ritz.theta,
                    ritz.residual,
                    ritz.separation
                );
                if complete || self.accepts(&ritz, previous) {
                    return Ok(RitzPair {
                        value: ritz.theta,
                        vector: ritz_vector(&basis, &ritz.coords),
                        residual: ritz.residual,
                        iterations: steps,
                    });
                }
                if steps == steps_cap {
                    return Err(SigmaError::NoConvergence {
                        iterations: steps,
                        residual: ritz.residual,
                        tol: self.tol,
                    });
                }
                previous = Some(ritz.theta);
            }

            if exhausted {
                // Invariant subspace: continue from a fresh direction so
                // eigenvalues the start vector missed are still reached.
                beta.push(0.0);
                let next = random_unit_orthogonal(n, locked, &basis, rng);
                basis.push(next);
            } else {
                beta.push(b);
                basis.push(w.iter().map(|x| x / b).collect());
            }
        }

        // Only reachable with a zero step cap.
        Err(SigmaError::NoConvergence {
            iterations: 0,
            residual: f64::INFINITY,
            tol: self.tol,
        })
    }

    /// A Ritz value is accepted when
    /// - its residual is below `tol` relative to |θ| (ARPACK convention),
    /// - the error bound residual² / separation is below [`ACCURACY`],
    /// - θ moved by less than [`ACCURACY`] since the previous check.
    fn accepts(&self, ritz: &RitzCandidate, previous: Option<f64>) -> bool {
        let relative = ritz.residual <= self.tol * ritz.theta.abs().max(ZERO_FLOOR);
        let bounded = ritz.residual * ritz.residual <= ACCURACY * ritz.separation;
        let stable = previous.map_or(false, |p| (ritz.theta - p).abs() <= ACCURACY);
        relative && bounded && stable
    }
}

/// Dense symmetric eigendecomposition of the whole operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseEigensolver;

impl DenseEigensolver {
    /// All eigenvalues, ascending.
    pub fn eigenvalues(&self, op: &CsMat<f64>) -> Vec<f64> {
        let eigen = SymmetricEigen::new(to_dense(op));
        let mut vals: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
        vals.sort_by(f64::total_cmp);
        vals
    }
}

impl SymmetricEigensolver for DenseEigensolver {
    fn smallest(&self, op: &CsMat<f64>, k: usize) -> SigmaResult<EigenEstimate> {
        let n = op.rows();
        if k > n {
            return Err(SigmaError::TooSmall {
                requested: k,
                dimension: n,
            });
        }
        let mut vals = self.eigenvalues(op);
        vals.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
        vals.truncate(k);
        vals.sort_by(f64::total_cmp);
        Ok(EigenEstimate {
            values: vals,
            iterations: 0,
            residual: 0.0,
        })
    }
}

/// λ1 and λ2 of the coarse Laplacian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralGap {
    /// Trivial eigenvalue, zero up to solver tolerance.
    pub lambda1: f64,
    /// Algebraic connectivity.
    pub lambda2: f64,
    pub iterations: usize,
    pub residual: f64,
}

/// Compute the two smallest eigenvalues of L; the second is the gap.
pub fn spectral_gap<S: SymmetricEigensolver + ?Sized>(
    lap: &CoarseLaplacian,
    solver: &S,
) -> SigmaResult<SpectralGap> {
    let est = solver.smallest(lap.matrix(), 2)?;
    Ok(SpectralGap {
        lambda1: est.values[0],
        lambda2: est.values[1],
        iterations: est.iterations,
        residual: est.residual,
    })
}

/// Smallest-magnitude Ritz value of the current tridiagonal matrix.
struct RitzCandidate {
    theta: f64,
    /// Eigenvector of T, i.e. coordinates in the Krylov basis.
    coords: Vec<f64>,
    /// |β_m · s_m|, the residual norm of the Ritz pair.
    residual: f64,
    /// Distance to the nearest Ritz value resolved apart from θ.
    separation: f64,
}

fn lowest_ritz(alpha: &[f64], beta: &[f64], b_next: f64) -> RitzCandidate {
    let m = alpha.len();
    let mut t = DMatrix::<f64>::zeros(m, m);
    for i in 0..m {
        t[(i, i)] = alpha[i];
        if i + 1 < m {
            t[(i, i + 1)] = beta[i];
            t[(i + 1, i)] = beta[i];
        }
    }
    let eigen = SymmetricEigen::new(t);

    let mut idx = 0;
    for i in 1..m {
        if eigen.eigenvalues[i].abs() < eigen.eigenvalues[idx].abs() {
            idx = i;
        }
    }
    let theta = eigen.eigenvalues[idx];
    let coords: Vec<f64> = eigen.eigenvectors.column(idx).iter().copied().collect();
    let residual = (b_next * coords[m - 1]).abs();
    // Copies of θ within the residual are the same eigenvalue, not a gap.
    let separation = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != idx)
        .map(|(_, &v)| (v - theta).abs())
        .filter(|&d| d > residual)
        .fold(f64::INFINITY, f64::min);

    RitzCandidate {
        theta,
        coords,
        residual,
        separation,
    }
}

/// Σ s_i · q_i, normalized.
fn ritz_vector(basis: &[Vec<f64>], coords: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; basis.first().map_or(0, Vec::len)];
    for (q, &s) in basis.iter().zip(coords) {
        axpy(s, q, &mut x);
    }
    let norm = dot(&x, &x).sqrt();
    if norm > 0.0 {
        x.iter_mut().for_each(|v| *v /= norm);
    }
    x
}

fn random_unit_orthogonal(
    n: usize,
    locked: &[Vec<f64>],
    basis: &[Vec<f64>],
    rng: &mut StdRng,
) -> Vec<f64> {
    loop {
        let mut v: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() - 0.5).collect();
        for _ in 0..2 {
            for q in locked.iter().chain(basis) {
                let proj = dot(&v, q);
                axpy(-proj, q, &mut v);
            }
        }
        let norm = dot(&v, &v).sqrt();
        if norm > 1e-8 {
            v.iter_mut().for_each(|x| *x /= norm);
            return v;
        }
    }
}

fn to_dense(op: &CsMat<f64>) -> DMatrix<f64> {
    let mut mat = DMatrix::zeros(op.rows(), op.cols());
    for (i, vec) in op.outer_iterator().enumerate() {
        for (j, &val) in vec.iter() {
            mat[(i, j)] += val;
        }
    }
    mat
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// y += s·x
fn axpy(s: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi += s * xi;
    }
}
