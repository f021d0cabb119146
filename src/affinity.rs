//! Mahalanobis-Gaussian affinity matrices.
//!
//! Training affinity `W` (m×m): `W_ij = exp(-d²_ij / ε)` with the averaged
//! local metric `d²_ij = ½ (x_i-x_j)ᵀ (P_i + P_j) (x_i-x_j)`, where `P_j` is
//! the precision of training source j. Symmetric by construction, unit
//! diagonal.
//!
//! Extended affinity `A` ((m+M)×m): the top m×m block is `W` itself; each test
//! row is computed against the training metrics only,
//! `A_tj = exp(-(t-x_j)ᵀ P_j (t-x_j) / ε)`.
//!
//! The bandwidth ε either comes in fixed or is resolved from the median of the
//! training pair distances (self-tuning). A collapsed kernel (everything ≈ 0,
//! near-identity W, or everything ≈ 1, uniform W) is reported as an error
//! since the embedding step would be meaningless.

use log::{debug, info, warn};
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::covariance::{mahalanobis_sq, SourceMetric};
use crate::error::EchoError;

/// Kernel bandwidth policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    /// Use ε as given.
    Fixed(f64),
    /// ε = factor · median of the training pair distances d².
    MedianScale(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct AffinityParams {
    pub bandwidth: Bandwidth,
}

/// Training kernel with its resolved bandwidth.
#[derive(Debug, Clone)]
pub struct TrainingAffinity {
    pub matrix: DenseMatrix<f64>,
    pub epsilon: f64,
    pub n_train: usize,
}

/// Build the symmetric m×m training affinity.
pub fn build_training_affinity(
    features: &[Vec<f64>],
    metrics: &[SourceMetric],
    params: AffinityParams,
) -> Result<TrainingAffinity, EchoError> {
    let m = features.len();
    assert!(m >= 2, "need at least 2 training features, got {}", m);
    assert_eq!(metrics.len(), m, "one metric per training source required");

    info!("Building {}x{} training affinity ({:?})", m, m, params.bandwidth);

    // Pairwise averaged-metric distances; symmetric, zero diagonal.
    let dist_rows: Vec<Vec<f64>> = (0..m)
        .into_par_iter()
        .map(|i| {
            (0..m)
                .map(|j| {
                    if i == j {
                        return 0.0;
                    }
                    let delta: Vec<f64> = features[i]
                        .iter()
                        .zip(features[j].iter())
                        .map(|(a, b)| a - b)
                        .collect();
                    0.5 * (mahalanobis_sq(&delta, &metrics[i].precision)
                        + mahalanobis_sq(&delta, &metrics[j].precision))
                })
                .collect()
        })
        .collect();

    let epsilon = resolve_bandwidth(params.bandwidth, &dist_rows)?;
    debug!("Resolved kernel bandwidth epsilon = {:.6e}", epsilon);

    let w = DenseMatrix::from_iterator(
        dist_rows
            .iter()
            .flat_map(|row| row.iter().map(|&d2| (-d2 / epsilon).exp())),
        m,
        m,
        0,
    );

    check_degeneracy(&w, m)?;

    Ok(TrainingAffinity { matrix: w, epsilon, n_train: m })
}

/// Stack the (m+M)×m extension: training block is `W` verbatim, test rows use
/// the per-training-source metric.
pub fn extend_affinity(
    training: &TrainingAffinity,
    train_features: &[Vec<f64>],
    test_features: &[Vec<f64>],
    metrics: &[SourceMetric],
) -> DenseMatrix<f64> {
    let m = training.n_train;
    let n_test = test_features.len();
    assert_eq!(train_features.len(), m, "training feature count mismatch");

    info!("Extending affinity to {}x{} ({} test rows)", m + n_test, m, n_test);

    let test_rows: Vec<Vec<f64>> = test_features
        .par_iter()
        .map(|t| {
            (0..m)
                .map(|j| {
                    let delta: Vec<f64> = t
                        .iter()
                        .zip(train_features[j].iter())
                        .map(|(a, b)| a - b)
                        .collect();
                    let d2 = mahalanobis_sq(&delta, &metrics[j].precision);
                    (-d2 / training.epsilon).exp()
                })
                .collect()
        })
        .collect();

    let w = &training.matrix;
    let top = (0..m).flat_map(|i| (0..m).map(move |j| *w.get((i, j))));
    let bottom = test_rows.into_iter().flatten();

    DenseMatrix::from_iterator(top.chain(bottom), m + n_test, m, 0)
}

fn resolve_bandwidth(bandwidth: Bandwidth, dist_rows: &[Vec<f64>]) -> Result<f64, EchoError> {
    let epsilon = match bandwidth {
        Bandwidth::Fixed(eps) => eps,
        Bandwidth::MedianScale(factor) => {
            let mut offdiag: Vec<f64> = dist_rows
                .iter()
                .enumerate()
                .flat_map(|(i, row)| row.iter().copied().skip(i + 1))
                .collect();
            offdiag.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let median = offdiag[offdiag.len() / 2];
            factor * median
        }
    };
    if !(epsilon > 0.0) || !epsilon.is_finite() {
        return Err(EchoError::DegenerateAffinity {
            reason: format!("resolved bandwidth {:e} is not a positive finite value", epsilon),
        });
    }
    Ok(epsilon)
}

fn check_degeneracy(w: &DenseMatrix<f64>, m: usize) -> Result<(), EchoError> {
    let mut max_off = 0.0_f64;
    let mut min_entry = f64::INFINITY;
    for i in 0..m {
        for j in 0..m {
            let v = *w.get((i, j));
            min_entry = min_entry.min(v);
            if i != j {
                max_off = max_off.max(v);
            }
        }
    }

    debug!("Affinity range: min={:.3e}, max off-diagonal={:.3e}", min_entry, max_off);

    if max_off < 1e-12 {
        return Err(EchoError::DegenerateAffinity {
            reason: format!("all off-diagonal entries below 1e-12 (max {:.3e}); bandwidth too small", max_off),
        });
    }
    if min_entry > 1.0 - 1e-12 {
        return Err(EchoError::DegenerateAffinity {
            reason: format!("all entries within 1e-12 of 1 (min {:.6}); bandwidth too large", min_entry),
        });
    }
    if max_off < 1e-6 {
        warn!("Affinity nearly diagonal (max off-diagonal {:.3e}); embedding may be unstable", max_off);
    }
    if min_entry > 1.0 - 1e-6 {
        warn!("Affinity nearly uniform (min entry {:.6}); embedding may be unstable", min_entry);
    }
    Ok(())
}
