//! Coarse similarity operator and symmetric normalized Laplacian.
//!
//! S = M·Mᵗ measures how much two stars overlap through shared fine edges.
//! With degrees d = S·1 and D = diag(d):
//!
//!   L = I − D^(−1/2) · S · D^(−1/2)
//!
//! L is symmetric with spectrum in [0, 2]. The vector D^(1/2)·1 is always
//! in its kernel, so λ1 = 0 and the next eigenvalue λ2 is the spectral gap
//! of the coarse graph.

use std::collections::BTreeMap;

use sprs::{CsMat, TriMat};

use crate::aggregation::{transpose_csr, AggregationMatrix};
use crate::error::{SigmaError, SigmaResult};

/// S = M·Mᵗ (stars × stars).
pub fn similarity(agg: &AggregationMatrix) -> CsMat<f64> {
    let mt = agg.transpose();
    agg.matrix() * &mt
}

/// y = A·x for a CSR matrix.
pub fn apply(a: &CsMat<f64>, x: &[f64], y: &mut [f64]) {
    for (row, vec) in a.outer_iterator().enumerate() {
        y[row] = vec.iter().map(|(col, &val)| val * x[col]).sum();
    }
}

/// Symmetric normalized Laplacian of the coarse graph.
#[derive(Debug, Clone)]
pub struct CoarseLaplacian {
    matrix: CsMat<f64>,
    degrees: Vec<f64>,
}

impl CoarseLaplacian {
    /// Build L from the aggregation matrix.
    pub fn build(agg: &AggregationMatrix) -> SigmaResult<Self> {
        Self::from_similarity(&similarity(agg))
    }

    /// Build L from a symmetric similarity matrix.
    ///
    /// Fails with [`SigmaError::Degenerate`] when a row has zero (or
    /// non-finite) degree, since it cannot be normalized.
    pub fn from_similarity(s: &CsMat<f64>) -> SigmaResult<Self> {
        let n = s.rows();
        let mut degrees = vec![0.0; n];
        for (row, vec) in s.outer_iterator().enumerate() {
            let d: f64 = vec.data().iter().sum();
            if !(d > 0.0 && d.is_finite()) {
                return Err(SigmaError::Degenerate { row });
            }
            degrees[row] = d;
        }
        let inv_sqrt: Vec<f64> = degrees.iter().map(|d| 1.0 / d.sqrt()).collect();

        let mut tri = TriMat::with_capacity((n, n), s.nnz() + n);
        for (i, vec) in s.outer_iterator().enumerate() {
            let mut row: BTreeMap<usize, f64> = BTreeMap::new();
            row.insert(i, 1.0);
            for (j, &s_ij) in vec.iter() {
                *row.entry(j).or_insert(0.0) -= s_ij * inv_sqrt[i] * inv_sqrt[j];
            }
            for (j, val) in row {
                tri.add_triplet(i, j, val);
            }
        }

        Ok(Self {
            matrix: tri.to_csr(),
            degrees,
        })
    }

    pub fn matrix(&self) -> &CsMat<f64> {
        &self.matrix
    }

    /// Row sums of S.
    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Number of coarse vertices (stars).
    pub fn dim(&self) -> usize {
        self.matrix.rows()
    }

    /// Largest |L[i,j] − L[j,i]|.
    pub fn asymmetry(&self) -> f64 {
        let t = transpose_csr(&self.matrix);
        let mut worst = 0.0_f64;
        for (i, vec) in self.matrix.outer_iterator().enumerate() {
            for (j, &val) in vec.iter() {
                let other = t.get(i, j).copied().unwrap_or(0.0);
                worst = worst.max((val - other).abs());
            }
        }
        worst
    }

    /// Ground state D^(1/2)·1 normalized to unit length.
    pub fn ground_state(&self) -> Vec<f64> {
        let total: f64 = self.degrees.iter().sum();
        self.degrees.iter().map(|d| (d / total).sqrt()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{EdgeIndex, LatticeSize};
    use crate::stars::{aggregate_stars, CoarseIndex, StarMap};

    fn lattice_laplacian(size: LatticeSize) -> CoarseLaplacian {
        let index = EdgeIndex::build(&size);
        let coarse = CoarseIndex::build(&size, index.edges());
        let stars = aggregate_stars(&size, &index, &coarse);
        let agg = AggregationMatrix::build(index.len(), &stars).unwrap();
        CoarseLaplacian::build(&agg).unwrap()
    }

    #[test]
    fn similarity_is_star_overlap() {
        let mut stars = StarMap::new();
        stars.insert(0, vec![0, 1]);
        stars.insert(1, vec![1, 2, 2, 3]);
        let agg = AggregationMatrix::build(4, &stars).unwrap();
        let s = similarity(&agg);
        let at = |i, j| s.get(i, j).copied().unwrap_or(0.0);
        // Row 0: [1/2, 1/2, 0, 0], row 1: [0, 1/4, 1/2, 1/4]
        assert!((at(0, 0) - 0.5).abs() < 1e-15);
        assert!((at(0, 1) - 0.125).abs() < 1e-15);
        assert!((at(1, 0) - 0.125).abs() < 1e-15);
        assert!((at(1, 1) - 0.375).abs() < 1e-15);
    }

    #[test]
    fn laplacian_symmetric() {
        let lap = lattice_laplacian(LatticeSize::cubic(4));
        assert!(lap.asymmetry() < 1e-9, "asymmetry {}", lap.asymmetry());
    }

    #[test]
    fn ground_state_in_kernel() {
        for size in [LatticeSize::cubic(4), LatticeSize::new([6, 4, 4, 4])] {
            let lap = lattice_laplacian(size);
            let x = lap.ground_state();
            let mut y = vec![0.0; lap.dim()];
            apply(lap.matrix(), &x, &mut y);
            let norm: f64 = y.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!(norm < 1e-10, "L·D^(1/2)1 has norm {} on {}", norm, size);
        }
    }

    #[test]
    fn diagonal_entries_bounded() {
        let lap = lattice_laplacian(LatticeSize::cubic(4));
        for i in 0..lap.dim() {
            let d = lap.matrix().get(i, i).copied().unwrap_or(0.0);
            assert!((0.0..1.0).contains(&d), "L[{},{}] = {}", i, i, d);
        }
        assert!(lap.degrees().iter().all(|&d| d > 0.0));
    }

    #[test]
    fn zero_degree_row_is_degenerate() {
        let mut tri = TriMat::new((3, 3));
        tri.add_triplet(0, 0, 1.0);
        tri.add_triplet(2, 2, 2.0);
        let s: CsMat<f64> = tri.to_csr();
        assert!(matches!(
            CoarseLaplacian::from_similarity(&s),
            Err(SigmaError::Degenerate { row: 1 })
        ));
    }

    #[test]
    fn two_identical_stars_give_gap_of_one() {
        // S = [[a, a], [a, a]] → L = [[1/2, -1/2], [-1/2, 1/2]], spectrum {0, 1}.
        let mut stars = StarMap::new();
        stars.insert(0, vec![0, 1]);
        stars.insert(1, vec![0, 1]);
        let agg = AggregationMatrix::build(2, &stars).unwrap();
        let lap = CoarseLaplacian::build(&agg).unwrap();
        let at = |i, j| lap.matrix().get(i, j).copied().unwrap_or(0.0);
        assert!((at(0, 0) - 0.5).abs() < 1e-15);
        assert!((at(0, 1) + 0.5).abs() < 1e-15);
    }
}
