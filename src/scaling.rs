//! Finite-size scaling of the spectral gap.
//!
//! For a diffusive coarse graph the gap closes like λ2 ≈ C / L². Given a set
//! of (L, λ2) measurements this module fits C, reports the log-log slope,
//! and checks that the gap shrinks monotonically. Plotting is left to
//! external tools; everything here is plain numbers.

use crate::config::RunConfig;
use crate::error::{SigmaError, SigmaResult};
use crate::lattice::LatticeSize;
use crate::pipeline::run_in_memory;

/// One measurement: box size L and its gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingPoint {
    pub size: usize,
    pub lambda2: f64,
}

/// Inverse-square fit λ2 ≈ C / L² and the least-squares log-log slope.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingFit {
    /// C = mean(λ2 · L²).
    pub constant: f64,
    /// Slope of ln λ2 against ln L.
    pub slope: f64,
    /// C / L² at each measured size.
    pub fitted: Vec<f64>,
}

impl ScalingFit {
    pub fn from_points(points: &[ScalingPoint]) -> SigmaResult<Self> {
        if points.len() < 2 {
            return Err(SigmaError::Config(format!(
                "scaling fit needs at least 2 points, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| p.size == 0 || !(p.lambda2 > 0.0)) {
            return Err(SigmaError::Config(
                "scaling fit needs positive sizes and gaps".to_string(),
            ));
        }

        let n = points.len() as f64;
        let constant = points
            .iter()
            .map(|p| p.lambda2 * (p.size * p.size) as f64)
            .sum::<f64>()
            / n;
        let fitted = points
            .iter()
            .map(|p| constant / (p.size * p.size) as f64)
            .collect();

        let xs: Vec<f64> = points.iter().map(|p| (p.size as f64).ln()).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.lambda2.ln()).collect();
        let x_bar = xs.iter().sum::<f64>() / n;
        let y_bar = ys.iter().sum::<f64>() / n;
        let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - x_bar) * (y - y_bar)).sum();
        let sxx: f64 = xs.iter().map(|x| (x - x_bar).powi(2)).sum();
        if sxx == 0.0 {
            return Err(SigmaError::Config(
                "scaling fit needs at least two distinct sizes".to_string(),
            ));
        }

        Ok(Self {
            constant,
            slope: sxy / sxx,
            fitted,
        })
    }
}

/// True when λ2 strictly decreases as L grows.
pub fn is_monotone_decreasing(points: &[ScalingPoint]) -> bool {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.size);
    sorted.windows(2).all(|w| w[1].lambda2 < w[0].lambda2)
}

/// Run the in-memory pipeline on L×L×L×L lattices.
pub fn sweep(sizes: &[usize], base: &RunConfig) -> SigmaResult<Vec<ScalingPoint>> {
    sizes
        .iter()
        .map(|&l| {
            let cfg = RunConfig {
                lattice: LatticeSize::cubic(l),
                ..base.clone()
            };
            let analysis = run_in_memory(&cfg)?;
            log::info!("L = {}: lambda2 = {:.6}", l, analysis.gap.lambda2);
            Ok(ScalingPoint {
                size: l,
                lambda2: analysis.gap.lambda2,
            })
        })
        .collect()
}
