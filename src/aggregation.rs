//! Aggregation operator M: stars × fine edges.
//!
//! Rows are the stars re-indexed densely in ascending coarse id order.
//! Every occurrence of fine edge f in star s adds 1/|s| to M[s, f], so a
//! fine edge listed k times carries weight k/|s| and each row sums to 1.
//!
//! Repeated (row, col) pairs are summed in an ordered map before the sparse
//! matrix is assembled, so the result never depends on how the sparse
//! backend treats duplicate triplets.

use std::collections::BTreeMap;

use sprs::{CsMat, TriMat};

use crate::error::{SigmaError, SigmaResult};
use crate::stars::StarMap;

/// Sparse star-by-fine-edge weight matrix (CSR).
#[derive(Debug, Clone)]
pub struct AggregationMatrix {
    matrix: CsMat<f64>,
    star_ids: Vec<usize>,
}

impl AggregationMatrix {
    /// Build M for `fine_edges` columns from a star mapping.
    pub fn build(fine_edges: usize, stars: &StarMap) -> SigmaResult<Self> {
        let star_ids: Vec<usize> = stars.ids().collect();
        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for (row, (coarse_id, members)) in stars.iter().enumerate() {
            if members.is_empty() {
                return Err(SigmaError::EmptyStar { coarse_id });
            }
            let w = 1.0 / members.len() as f64;
            for &fine_id in members {
                if fine_id >= fine_edges {
                    return Err(SigmaError::UnknownFineEdge {
                        coarse_id,
                        fine_id,
                        fine_edges,
                    });
                }
                *weights.entry((row, fine_id)).or_insert(0.0) += w;
            }
        }

        let mut tri = TriMat::with_capacity((star_ids.len(), fine_edges), weights.len());
        for (&(row, col), &w) in &weights {
            tri.add_triplet(row, col, w);
        }
        log::debug!(
            "aggregation matrix {}x{} with {} nonzeros",
            star_ids.len(),
            fine_edges,
            weights.len()
        );
        Ok(Self {
            matrix: tri.to_csr(),
            star_ids,
        })
    }

    pub fn matrix(&self) -> &CsMat<f64> {
        &self.matrix
    }

    /// Number of stars (rows).
    pub fn num_stars(&self) -> usize {
        self.matrix.rows()
    }

    /// Number of fine edges (columns).
    pub fn num_fine_edges(&self) -> usize {
        self.matrix.cols()
    }

    /// Coarse id of each dense row.
    pub fn star_ids(&self) -> &[usize] {
        &self.star_ids
    }

    /// Dense row of a coarse id.
    pub fn row_of(&self, coarse_id: usize) -> Option<usize> {
        self.star_ids.binary_search(&coarse_id).ok()
    }

    /// M[row, col], zero when absent.
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col).copied().unwrap_or(0.0)
    }

    /// Sum of one row's weights.
    pub fn row_sum(&self, row: usize) -> f64 {
        self.matrix
            .outer_view(row)
            .map(|v| v.data().iter().sum())
            .unwrap_or(0.0)
    }

    /// Mᵗ as a CSR matrix.
    pub fn transpose(&self) -> CsMat<f64> {
        transpose_csr(&self.matrix)
    }
}

/// Transpose of a CSR matrix, returned in CSR.
pub(crate) fn transpose_csr(m: &CsMat<f64>) -> CsMat<f64> {
    let mut tri = TriMat::with_capacity((m.cols(), m.rows()), m.nnz());
    for (row, vec) in m.outer_iterator().enumerate() {
        for (col, &val) in vec.iter() {
            tri.add_triplet(col, row, val);
        }
    }
    tri.to_csr()
}
