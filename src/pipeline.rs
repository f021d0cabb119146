//! End-to-end localization pipeline.
//!
//! `LocalizerBuilder` wires the stages together: ring geometry with seeded
//! perturbations → batch room simulation → RTF features → per-source
//! covariance metrics → training/extended affinities → spectral embedding →
//! k-NN angle interpolation → angular RMSE. One call, one report.

use std::f64::consts::{PI, TAU};

use log::{debug, info, trace};

use crate::affinity::{self, AffinityParams, Bandwidth};
use crate::covariance::{self, CovarianceParams};
use crate::error::EchoError;
use crate::evaluate::angular_rmse;
use crate::features::{RtfExtractor, RtfParams};
use crate::geometry::{RingLayout, SphericalAngle};
use crate::interpolate::{interpolate_angles, InterpolationParams};
use crate::room::{simulate_batch, RoomSimulator};
use crate::spectral::{embed, SpectralParams};

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct LocalizationReport {
    pub predictions: Vec<SphericalAngle>,
    pub ground_truth: Vec<SphericalAngle>,
    /// Retained embedding eigenvalues, descending.
    pub eigenvalues: Vec<f64>,
    /// Resolved kernel bandwidth.
    pub epsilon: f64,
    pub rmse: f64,
}

/// Builder for the localization pipeline. All parameters are fixed at run
/// start; `run` is repeatable and fully determined by the seed.
#[derive(Debug, Clone)]
pub struct LocalizerBuilder {
    n_train: usize,
    n_test: usize,
    n_perturb: usize,
    perturb_sigma: f64,
    n_bins: usize,
    bandwidth: Bandwidth,
    cov_reg: f64,
    dim: usize,
    neighbors: usize,
    ring_radius: f64,
    ring_elevation: f64,
    ring_span: f64,
    seed: u64,
}

impl Default for LocalizerBuilder {
    fn default() -> Self {
        debug!("Creating LocalizerBuilder with default parameters");
        Self {
            n_train: 50,
            n_test: 49,
            n_perturb: 5,
            perturb_sigma: 0.01,
            n_bins: 9,
            bandwidth: Bandwidth::MedianScale(1.0),
            cov_reg: 1e-6,
            dim: 2,
            neighbors: 3,
            ring_radius: 1.5,
            ring_elevation: 0.0,
            // Half circle: a mic pair cannot separate mirrored azimuths.
            ring_span: PI,
            seed: 7,
        }
    }
}

impl LocalizerBuilder {
    pub fn new() -> Self {
        info!("Initializing new LocalizerBuilder");
        Self::default()
    }

    /// Training source count m and test source count M.
    pub fn with_sources(mut self, n_train: usize, n_test: usize) -> Self {
        info!("Configuring sources: {} training, {} test", n_train, n_test);
        self.n_train = n_train;
        self.n_test = n_test;
        self
    }

    /// Perturbation count L per training source and positional std in meters.
    pub fn with_perturbations(mut self, n_perturb: usize, sigma: f64) -> Self {
        info!("Configuring perturbations: L={}, sigma={}", n_perturb, sigma);
        self.n_perturb = n_perturb;
        self.perturb_sigma = sigma;
        self
    }

    /// Number of RTF frequency bins D.
    pub fn with_feature_bins(mut self, n_bins: usize) -> Self {
        info!("Configuring feature bins: D={}", n_bins);
        self.n_bins = n_bins;
        self
    }

    /// Kernel bandwidth policy for the affinity matrices.
    pub fn with_kernel(mut self, bandwidth: Bandwidth) -> Self {
        info!("Configuring kernel bandwidth: {:?}", bandwidth);
        self.bandwidth = bandwidth;
        self
    }

    /// Ridge regularizer added to every perturbation covariance.
    pub fn with_covariance_reg(mut self, reg: f64) -> Self {
        info!("Configuring covariance regularizer: {:.1e}", reg);
        self.cov_reg = reg;
        self
    }

    /// Embedding dimensionality d.
    pub fn with_embedding(mut self, dim: usize) -> Self {
        info!("Configuring embedding dimension: d={}", dim);
        self.dim = dim;
        self
    }

    /// Interpolation neighbor count k.
    pub fn with_neighbors(mut self, k: usize) -> Self {
        info!("Configuring interpolation neighbors: k={}", k);
        self.neighbors = k;
        self
    }

    /// Radius and elevation of the source arc around the array center.
    pub fn with_source_ring(mut self, radius: f64, elevation: f64) -> Self {
        info!("Configuring source arc: radius={}, elevation={}", radius, elevation);
        self.ring_radius = radius;
        self.ring_elevation = elevation;
        self
    }

    /// Azimuth extent of the source arc in (0, 2π]. The half-circle default
    /// keeps directions identifiable for a two-microphone array.
    pub fn with_source_arc(mut self, span: f64) -> Self {
        info!("Configuring source arc span: {}", span);
        self.ring_span = span;
        self
    }

    /// Seed for the perturbation stream; runs with equal seeds are identical.
    pub fn with_seed(mut self, seed: u64) -> Self {
        info!("Configuring seed: {}", seed);
        self.seed = seed;
        self
    }

    fn validate(&self, rir_len: usize) -> Result<(), EchoError> {
        let fail = |msg: String| Err(EchoError::InvalidConfig(msg));
        if self.n_train < 2 {
            return fail(format!("need at least 2 training sources, got {}", self.n_train));
        }
        if self.n_test == 0 {
            return fail("need at least 1 test source".into());
        }
        if self.n_perturb < 2 {
            return fail(format!("need at least 2 perturbations per source, got {}", self.n_perturb));
        }
        if self.dim == 0 {
            return fail("embedding dimension must be at least 1".into());
        }
        if self.dim + 1 > self.n_train {
            return fail(format!(
                "embedding dimension {} plus the trivial eigenpair exceeds {} training sources",
                self.dim, self.n_train
            ));
        }
        if self.neighbors == 0 || self.neighbors > self.n_train {
            return fail(format!(
                "neighbor count {} must be in 1..={}",
                self.neighbors, self.n_train
            ));
        }
        if self.n_bins == 0 || self.n_bins >= rir_len / 2 {
            return fail(format!(
                "feature bin count {} must be in 1..{} for {}-sample responses",
                self.n_bins,
                rir_len / 2,
                rir_len
            ));
        }
        if !(self.cov_reg > 0.0) {
            return fail(format!("covariance regularizer must be positive, got {}", self.cov_reg));
        }
        if !(self.ring_span > 0.0) || self.ring_span > TAU {
            return fail(format!("source arc span {} must lie in (0, 2π]", self.ring_span));
        }
        Ok(())
    }

    /// Run the full pipeline against the given simulation backend.
    pub fn run<S: RoomSimulator + Sync>(&self, sim: &S) -> Result<LocalizationReport, EchoError> {
        self.validate(sim.rir_len())?;

        let [mic_a, mic_b] = sim.mic_positions();
        let center = [
            0.5 * (mic_a[0] + mic_b[0]),
            0.5 * (mic_a[1] + mic_b[1]),
            0.5 * (mic_a[2] + mic_b[2]),
        ];
        info!(
            "Pipeline run: m={}, M={}, L={}, D={}, d={}, k={}, seed={}",
            self.n_train, self.n_test, self.n_perturb, self.n_bins, self.dim, self.neighbors, self.seed
        );

        // Stage 1: geometry.
        let layout = RingLayout {
            center,
            radius: self.ring_radius,
            elevation: self.ring_elevation,
            span: self.ring_span,
        }
        .generate(self.n_train, self.n_test, self.n_perturb, self.perturb_sigma, self.seed);

        // Stage 2: simulation + feature extraction, one flat batch.
        let extractor = RtfExtractor::new(
            sim.rir_len(),
            RtfParams { n_bins: self.n_bins, ..RtfParams::default() },
        );

        let mut positions: Vec<[f64; 3]> = Vec::new();
        positions.extend(layout.training.iter().map(|s| s.position));
        for perturbed in &layout.perturbations {
            positions.extend(perturbed.iter().copied());
        }
        positions.extend(layout.test.iter().map(|s| s.position));

        info!("Simulating {} impulse-response pairs", positions.len());
        let rirs = simulate_batch(sim, &positions)?;
        let features: Vec<Vec<f64>> = rirs.iter().map(|pair| extractor.extract(pair)).collect();
        trace!("Extracted {} stacked features of length {}", features.len(), features[0].len());

        let m = self.n_train;
        let train_features = &features[..m];
        let perturb_features = &features[m..m + m * self.n_perturb];
        let test_features = &features[m + m * self.n_perturb..];

        // Stage 3: per-source covariance metrics.
        info!("Estimating {} covariance metrics (L={})", m, self.n_perturb);
        let cov_params = CovarianceParams { reg: self.cov_reg, ..CovarianceParams::default() };
        let metrics = (0..m)
            .map(|i| {
                let chunk = &perturb_features[i * self.n_perturb..(i + 1) * self.n_perturb];
                covariance::estimate_metric(chunk, cov_params, i)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Stage 4: affinities.
        let training_affinity = affinity::build_training_affinity(
            train_features,
            &metrics,
            AffinityParams { bandwidth: self.bandwidth },
        )?;
        let extended = affinity::extend_affinity(
            &training_affinity,
            train_features,
            test_features,
            &metrics,
        );

        // Stage 5: spectral embedding with Nyström extension.
        let embedding = embed(
            &extended,
            m,
            &SpectralParams { dim: self.dim, ..SpectralParams::default() },
        )?;
        debug!("Embedding eigenvalues: {:?}", embedding.eigenvalues);

        // Stage 6: interpolation.
        let predictions = interpolate_angles(
            &embedding,
            &layout.training_angles(),
            InterpolationParams { neighbors: self.neighbors },
        );

        // Stage 7: evaluation.
        let ground_truth = layout.test_angles();
        let rmse = angular_rmse(&predictions, &ground_truth);

        info!("Pipeline complete: RMSE {:.6} rad (epsilon {:.3e})", rmse, training_affinity.epsilon);

        Ok(LocalizationReport {
            predictions,
            ground_truth,
            eigenvalues: embedding.eigenvalues,
            epsilon: training_affinity.epsilon,
            rmse,
        })
    }
}
