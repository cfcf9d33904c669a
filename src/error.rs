//! Error hierarchy for the sigma-net pipeline.
//!
//! Every failure is fatal for a batch run: errors bubble up to the binary,
//! which reports them and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

/// Root error type for generation and analysis.
#[derive(Error, Debug)]
pub enum SigmaError {
    /// Invalid lattice size or solver parameters.
    #[error("config error: {0}")]
    Config(String),

    /// A persisted file could not be read or written.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An edge-list line is not three non-negative integers.
    #[error("malformed edge list {path} at line {line}: {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The star mapping is not a JSON object of id arrays.
    #[error("malformed star mapping {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A star has no members, so its weights cannot be normalized.
    #[error("aggregation inconsistency: star {coarse_id} is empty")]
    EmptyStar { coarse_id: usize },

    /// A star references a fine edge that is not in the edge list.
    #[error(
        "aggregation inconsistency: star {coarse_id} references fine edge {fine_id}, \
         but only {fine_edges} fine edges were loaded"
    )]
    UnknownFineEdge {
        coarse_id: usize,
        fine_id: usize,
        fine_edges: usize,
    },

    /// A coarse row has zero weighted degree.
    #[error("degenerate similarity operator: row {row} has zero degree")]
    Degenerate { row: usize },

    /// The eigensolver hit its iteration cap before the residuals dropped below tol.
    #[error("eigensolver did not converge after {iterations} iterations (residual {residual:.3e} > tol {tol:.1e})")]
    NoConvergence {
        iterations: usize,
        residual: f64,
        tol: f64,
    },

    /// Fewer rows than requested eigenvalues.
    #[error("cannot extract {requested} eigenvalues from a {dimension}x{dimension} operator")]
    TooSmall { requested: usize, dimension: usize },
}

pub type SigmaResult<T> = Result<T, SigmaError>;

impl SigmaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SigmaError::Io {
            path: path.into(),
            source,
        }
    }
}
