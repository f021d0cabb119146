//! Relative-transfer-function (RTF) feature extraction.
//!
//! Each source is characterized by the frequency-domain ratio of its transfer
//! functions to the two microphones: `T(ω) = H1(ω) / H2(ω)`, sampled at D
//! evenly spaced bins below Nyquist (DC skipped). The ratio cancels everything
//! common to both channels and keeps only the inter-microphone cue that varies
//! with source direction.
//!
//! Features are returned as stacked real vectors (all real parts, then all
//! imaginary parts, length 2D) so the downstream covariance and Mahalanobis
//! forms stay in real arithmetic.
//!
//! Near-zero denominator bins are clamped in magnitude (phase preserved); an
//! exactly zero denominator yields a zero ratio for that bin.

use std::sync::Arc;

use log::{debug, trace};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

/// RTF extraction parameters.
#[derive(Debug, Clone, Copy)]
pub struct RtfParams {
    /// Number of frequency bins D retained per feature vector.
    pub n_bins: usize,
    /// Magnitude floor for the denominator transfer function.
    pub denom_floor: f64,
}

impl Default for RtfParams {
    fn default() -> Self {
        Self { n_bins: 9, denom_floor: 1e-9 }
    }
}

/// Length of the stacked real feature vector for D bins.
pub fn stacked_dim(n_bins: usize) -> usize {
    2 * n_bins
}

/// FFT-backed RTF extractor for impulse responses of a fixed length.
pub struct RtfExtractor {
    fft: Arc<dyn Fft<f64>>,
    len: usize,
    params: RtfParams,
}

impl RtfExtractor {
    pub fn new(rir_len: usize, params: RtfParams) -> Self {
        assert!(params.n_bins >= 1, "need at least one frequency bin");
        assert!(
            params.n_bins < rir_len / 2,
            "cannot place {} bins below Nyquist of a {}-sample response",
            params.n_bins,
            rir_len
        );
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(rir_len);
        debug!(
            "RTF extractor: {}-point FFT, {} bins, denominator floor {:.1e}",
            rir_len, params.n_bins, params.denom_floor
        );
        Self { fft, len: rir_len, params }
    }

    /// Indices of the D retained bins, evenly spaced in (0, N/2).
    pub fn bin_indices(&self) -> Vec<usize> {
        let half = self.len / 2;
        let step = ((half - 1) / self.params.n_bins).max(1);
        (0..self.params.n_bins).map(|i| 1 + i * step).collect()
    }

    fn spectrum(&self, rir: &[f64]) -> Vec<Complex64> {
        let mut buf: Vec<Complex64> = rir.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        buf.resize(self.len, Complex64::new(0.0, 0.0));
        self.fft.process(&mut buf);
        buf
    }

    /// Complex RTF at the retained bins.
    pub fn extract_complex(&self, rirs: &[Vec<f64>; 2]) -> Vec<Complex64> {
        let h1 = self.spectrum(&rirs[0]);
        let h2 = self.spectrum(&rirs[1]);
        let floor = self.params.denom_floor;

        self.bin_indices()
            .iter()
            .map(|&b| {
                let denom = h2[b];
                let mag = denom.norm();
                if mag == 0.0 {
                    trace!("bin {}: zero denominator, ratio excluded as 0", b);
                    Complex64::new(0.0, 0.0)
                } else if mag < floor {
                    // Clamp magnitude, keep phase.
                    h1[b] / (denom * (floor / mag))
                } else {
                    h1[b] / denom
                }
            })
            .collect()
    }

    /// Stacked real RTF feature (re‖im, length 2D).
    pub fn extract(&self, rirs: &[Vec<f64>; 2]) -> Vec<f64> {
        let complex = self.extract_complex(rirs);
        let mut out = Vec::with_capacity(2 * complex.len());
        out.extend(complex.iter().map(|c| c.re));
        out.extend(complex.iter().map(|c| c.im));
        out
    }
}
