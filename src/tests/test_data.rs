//! Shared synthetic fixtures for the stage tests.

use std::f64::consts::TAU;

use smartcore::linalg::basic::arrays::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::covariance::SourceMetric;

/// n feature vectors on a circle of the given radius in the first two
/// coordinates, zero elsewhere. A minimal smooth one-parameter manifold.
pub fn ring_features(n: usize, dim: usize, radius: f64) -> Vec<Vec<f64>> {
    assert!(dim >= 2);
    (0..n)
        .map(|i| {
            let theta = i as f64 * TAU / n as f64;
            let mut v = vec![0.0; dim];
            v[0] = radius * theta.cos();
            v[1] = radius * theta.sin();
            v
        })
        .collect()
}

fn identity(dim: usize) -> DenseMatrix<f64> {
    DenseMatrix::from_iterator(
        (0..dim * dim).map(|idx| if idx % (dim + 1) == 0 { 1.0 } else { 0.0 }),
        dim,
        dim,
        0,
    )
}

/// Isotropic unit metrics: covariance and precision both identity, so the
/// Mahalanobis kernel reduces to a plain Gaussian and the symmetric/asymmetric
/// kernels coincide.
pub fn identity_metrics(n: usize, dim: usize) -> Vec<SourceMetric> {
    (0..n)
        .map(|_| SourceMetric { covariance: identity(dim), precision: identity(dim) })
        .collect()
}
