//! Locally weighted angle interpolation in embedding space.
//!
//! For each test embedding the k nearest training embeddings (Euclidean in the
//! d-dimensional coordinates) contribute inverse-distance weights, normalized
//! to sum to 1. The predicted azimuth is the weighted mean on the unit circle
//! (weighted (cos, sin) averaged, then atan2), so predictions near the 0/2π
//! seam are unbiased; elevation is interpolated linearly. An exact embedding
//! hit short-circuits to a unit weight on that neighbor.

use std::f64::consts::TAU;

use log::{debug, info};

use crate::geometry::SphericalAngle;
use crate::spectral::Embedding;

/// Distance below which a test embedding is treated as coinciding with a
/// training embedding.
const EXACT_HIT: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct InterpolationParams {
    /// Neighbor count k.
    pub neighbors: usize,
}

/// Normalized inverse-distance weights over the k nearest of `dists`
/// (index, distance) pairs. Weights are non-negative and sum to 1.
pub fn knn_weights(dists: &[(usize, f64)], k: usize) -> Vec<(usize, f64)> {
    assert!(k >= 1, "neighbor count must be at least 1");
    let mut sorted = dists.to_vec();
    sorted.sort_unstable_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    sorted.truncate(k.min(sorted.len()));

    if let Some(&(idx, d)) = sorted.first() {
        if d < EXACT_HIT {
            return vec![(idx, 1.0)];
        }
    }

    let inv: Vec<f64> = sorted.iter().map(|&(_, d)| d.recip()).collect();
    let total: f64 = inv.iter().sum();
    sorted
        .iter()
        .zip(inv.iter())
        .map(|(&(idx, _), &w)| (idx, w / total))
        .collect()
}

/// Predict angles for every test row of `embedding` from the known training
/// angles.
pub fn interpolate_angles(
    embedding: &Embedding,
    train_angles: &[SphericalAngle],
    params: InterpolationParams,
) -> Vec<SphericalAngle> {
    assert_eq!(
        train_angles.len(),
        embedding.n_train,
        "one training angle per training embedding required"
    );
    assert!(
        params.neighbors <= embedding.n_train,
        "neighbor count {} exceeds {} training samples",
        params.neighbors,
        embedding.n_train
    );

    info!(
        "Interpolating {} test directions from {} training directions (k={})",
        embedding.n_test, embedding.n_train, params.neighbors
    );

    let train_rows: Vec<Vec<f64>> = (0..embedding.n_train)
        .map(|i| embedding.train_row(i))
        .collect();

    (0..embedding.n_test)
        .map(|t| {
            let query = embedding.test_row(t);
            let dists: Vec<(usize, f64)> = train_rows
                .iter()
                .enumerate()
                .map(|(j, row)| {
                    let d2: f64 = query
                        .iter()
                        .zip(row.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    (j, d2.sqrt())
                })
                .collect();

            let weights = knn_weights(&dists, params.neighbors);

            let mut x = 0.0;
            let mut y = 0.0;
            let mut el = 0.0;
            for &(j, w) in &weights {
                let angle = train_angles[j];
                x += w * angle.azimuth.cos();
                y += w * angle.azimuth.sin();
                el += w * angle.elevation;
            }
            let az = y.atan2(x).rem_euclid(TAU);

            debug!(
                "Test {}: neighbors {:?} -> azimuth {:.4}, elevation {:.4}",
                t,
                weights.iter().map(|&(j, _)| j).collect::<Vec<_>>(),
                az,
                el
            );

            SphericalAngle::new(az, el)
        })
        .collect()
}
