use approx::{abs_diff_eq, relative_eq};
use log::info;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::covariance::{estimate_metric, mahalanobis_sq, CovarianceParams, SourceMetric};
use crate::error::EchoError;

#[test]
fn test_sample_covariance_matches_hand_computation() {
    crate::init();
    info!("Test: covariance of perfectly correlated 2D samples");

    // y = x over [1..5]: variance 2.5, covariance 2.5.
    let samples: Vec<Vec<f64>> = (1..=5).map(|i| vec![i as f64, i as f64]).collect();
    let reg = 0.5;
    let metric = estimate_metric(
        &samples,
        CovarianceParams { reg, ..CovarianceParams::default() },
        0,
    )
    .unwrap();

    assert!(relative_eq!(*metric.covariance.get((0, 0)), 2.5 + reg, epsilon = 1e-12));
    assert!(relative_eq!(*metric.covariance.get((1, 1)), 2.5 + reg, epsilon = 1e-12));
    assert!(relative_eq!(*metric.covariance.get((0, 1)), 2.5, epsilon = 1e-12));
    assert!(relative_eq!(*metric.covariance.get((1, 0)), 2.5, epsilon = 1e-12));
}

#[test]
fn test_precision_inverts_covariance() {
    crate::init();
    info!("Test: precision times covariance is the identity");

    let samples = vec![
        vec![1.0, 0.2, -0.3],
        vec![0.4, -1.1, 0.8],
        vec![-0.6, 0.9, 0.1],
        vec![1.3, 0.5, -0.7],
        vec![-0.2, -0.4, 1.2],
    ];
    let metric = estimate_metric(
        &samples,
        CovarianceParams { reg: 1e-3, ..CovarianceParams::default() },
        2,
    )
    .unwrap();

    let n = 3;
    for i in 0..n {
        for j in 0..n {
            let mut acc = 0.0;
            for k in 0..n {
                acc += metric.precision.get((i, k)) * metric.covariance.get((k, j));
            }
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!(
                abs_diff_eq!(acc, expected, epsilon = 1e-8),
                "(P·Σ)[{},{}] = {}",
                i,
                j,
                acc
            );
        }
    }
}

#[test]
fn test_singular_covariance_reports_source_index() {
    crate::init();
    info!("Test: unregularized rank-1 covariance fails fast with the source index");

    // Perfectly correlated samples, rank 1 without the ridge.
    let samples: Vec<Vec<f64>> = (1..=4).map(|i| vec![i as f64, i as f64, i as f64]).collect();
    let result = estimate_metric(
        &samples,
        CovarianceParams { reg: 0.0, ..CovarianceParams::default() },
        3,
    );

    match result {
        Err(EchoError::SingularCovariance { source_index, .. }) => assert_eq!(source_index, 3),
        other => panic!("expected SingularCovariance, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_ridge_restores_invertibility() {
    crate::init();
    let samples: Vec<Vec<f64>> = (1..=4).map(|i| vec![i as f64, i as f64, i as f64]).collect();
    let result = estimate_metric(
        &samples,
        CovarianceParams { reg: 1e-4, ..CovarianceParams::default() },
        0,
    );
    assert!(result.is_ok(), "ridge term must make a rank-deficient covariance invertible");
}

#[test]
fn test_mahalanobis_reduces_to_euclidean_under_identity() {
    crate::init();
    let identity =
        DenseMatrix::from_iterator([1.0, 0.0, 0.0, 1.0].into_iter(), 2, 2, 0);
    let metric = SourceMetric { covariance: identity.clone(), precision: identity };

    let delta = [3.0, 4.0];
    assert!(relative_eq!(
        mahalanobis_sq(&delta, &metric.precision),
        25.0,
        epsilon = 1e-12
    ));
}

#[test]
fn test_anisotropic_metric_weights_directions() {
    crate::init();
    info!("Test: precision weights the quadratic form per direction");

    let precision = DenseMatrix::from_iterator([4.0, 0.0, 0.0, 0.25].into_iter(), 2, 2, 0);
    assert!(relative_eq!(mahalanobis_sq(&[1.0, 0.0], &precision), 4.0, epsilon = 1e-12));
    assert!(relative_eq!(mahalanobis_sq(&[0.0, 1.0], &precision), 0.25, epsilon = 1e-12));
}
