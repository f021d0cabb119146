//! Angular error evaluation.
//!
//! The per-sample residual is the 2-vector (wrapped azimuth difference,
//! elevation difference); the reported figure is the root-mean-square of its
//! Euclidean norm over all test samples, in radians.

use std::f64::consts::{PI, TAU};

use log::info;

use crate::geometry::SphericalAngle;

/// Wrap an angle difference to (-π, π].
pub fn wrap_to_pi(x: f64) -> f64 {
    let mut d = x.rem_euclid(TAU);
    if d > PI {
        d -= TAU;
    }
    d
}

/// Root-mean-square angular error between predictions and ground truth.
pub fn angular_rmse(predicted: &[SphericalAngle], truth: &[SphericalAngle]) -> f64 {
    assert_eq!(
        predicted.len(),
        truth.len(),
        "prediction count {} must match ground-truth count {}",
        predicted.len(),
        truth.len()
    );
    assert!(!predicted.is_empty(), "cannot evaluate an empty prediction set");

    let sum_sq: f64 = predicted
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| {
            let daz = wrap_to_pi(p.azimuth - t.azimuth);
            let del = p.elevation - t.elevation;
            daz * daz + del * del
        })
        .sum();

    let rmse = (sum_sq / predicted.len() as f64).sqrt();
    info!("Angular RMSE over {} test samples: {:.6} rad", predicted.len(), rmse);
    rmse
}
