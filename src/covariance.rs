//! Per-source feature covariance and its inverse (the local metric).
//!
//! The L perturbed feature vectors around a training source yield an empirical
//! covariance of the RTF feature under small positional changes. With L small
//! relative to the feature dimension the sample covariance is rank-deficient,
//! so a ridge term `reg·I` is always added before inversion. The inverse
//! (precision) is what the Mahalanobis kernel consumes.

use log::{debug, warn};
use smartcore::linalg::basic::arrays::{Array, Array2, MutArray};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::EchoError;

/// Covariance estimation parameters.
#[derive(Debug, Clone, Copy)]
pub struct CovarianceParams {
    /// Ridge regularizer added to the diagonal.
    pub reg: f64,
    /// Pivot magnitude below which the matrix is declared singular.
    pub pivot_tol: f64,
}

impl Default for CovarianceParams {
    fn default() -> Self {
        Self { reg: 1e-6, pivot_tol: 1e-12 }
    }
}

/// Local anisotropic metric of one training source.
#[derive(Debug, Clone)]
pub struct SourceMetric {
    pub covariance: DenseMatrix<f64>,
    pub precision: DenseMatrix<f64>,
}

/// Estimate the regularized covariance and its precision from the L stacked
/// perturbation features of training source `source`.
pub fn estimate_metric(
    samples: &[Vec<f64>],
    params: CovarianceParams,
    source: usize,
) -> Result<SourceMetric, EchoError> {
    assert!(
        samples.len() >= 2,
        "covariance for source {} needs at least 2 perturbations, got {}",
        source,
        samples.len()
    );
    let dim = samples[0].len();
    for s in samples {
        assert_eq!(s.len(), dim, "inconsistent feature dimension for source {}", source);
    }

    let covariance = sample_covariance(samples, params.reg);
    let precision = invert(&covariance, params.pivot_tol, source)?;

    debug!(
        "Source {}: covariance {}x{} from {} perturbations (reg={:.1e})",
        source,
        dim,
        dim,
        samples.len(),
        params.reg
    );

    Ok(SourceMetric { covariance, precision })
}

/// Unbiased sample covariance (divisor L-1) plus `reg` on the diagonal.
fn sample_covariance(samples: &[Vec<f64>], reg: f64) -> DenseMatrix<f64> {
    let l = samples.len();
    let dim = samples[0].len();

    let mut mean = vec![0.0; dim];
    for s in samples {
        for (m, &v) in mean.iter_mut().zip(s.iter()) {
            *m += v;
        }
    }
    for m in mean.iter_mut() {
        *m /= l as f64;
    }

    let divisor = (l - 1) as f64;
    let mut cov = vec![0.0; dim * dim];
    for s in samples {
        for i in 0..dim {
            let di = s[i] - mean[i];
            for j in 0..dim {
                cov[i * dim + j] += di * (s[j] - mean[j]);
            }
        }
    }
    for (idx, c) in cov.iter_mut().enumerate() {
        *c /= divisor;
        if idx % (dim + 1) == 0 {
            *c += reg;
        }
    }

    DenseMatrix::from_iterator(cov.into_iter(), dim, dim, 0)
}

/// Gauss-Jordan inversion with partial pivoting. Fails fast with the source
/// index when a pivot collapses below `tol`.
fn invert(mat: &DenseMatrix<f64>, tol: f64, source: usize) -> Result<DenseMatrix<f64>, EchoError> {
    let (n, m) = mat.shape();
    assert_eq!(n, m, "precision requires a square covariance, got {}x{}", n, m);

    // Augmented [A | I], reduced in place.
    let mut a: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row: Vec<f64> = (0..n).map(|j| *mat.get((i, j))).collect();
            row.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            row
        })
        .collect();

    for col in 0..n {
        let mut max_val = a[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            if a[row][col].abs() > max_val {
                max_val = a[row][col].abs();
                max_row = row;
            }
        }
        if max_val < tol {
            warn!(
                "Covariance for source {} singular at column {} (pivot {:.3e})",
                source, col, max_val
            );
            return Err(EchoError::SingularCovariance { source_index: source, pivot: max_val });
        }
        a.swap(col, max_row);

        let pivot = a[col][col];
        for v in a[col].iter_mut() {
            *v /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor != 0.0 {
                for k in 0..2 * n {
                    a[row][k] -= factor * a[col][k];
                }
            }
        }
    }

    let mut inv = DenseMatrix::from_iterator(std::iter::repeat(0.0).take(n * n), n, n, 0);
    for (i, row) in a.iter().enumerate() {
        for j in 0..n {
            inv.set((i, j), row[n + j]);
        }
    }
    Ok(inv)
}

/// Quadratic form `δᵀ P δ` for the Mahalanobis distance.
pub fn mahalanobis_sq(delta: &[f64], precision: &DenseMatrix<f64>) -> f64 {
    let n = delta.len();
    debug_assert_eq!(precision.shape(), (n, n), "precision shape mismatch");
    let mut acc = 0.0;
    for i in 0..n {
        let di = delta[i];
        if di == 0.0 {
            continue;
        }
        for j in 0..n {
            acc += di * precision.get((i, j)) * delta[j];
        }
    }
    acc
}
