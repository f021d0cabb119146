//! Error taxonomy for the localization pipeline.
//!
//! Every numerical guard in the pipeline surfaces as a distinct variant carrying
//! enough context (source index, offending value) to identify the failing stage
//! without re-running it. All public fallible operations return
//! `Result<_, EchoError>`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EchoError {
    /// A source position falls outside the simulated room volume.
    #[error("source position {position:?} lies outside room bounds {bounds:?}")]
    SourceOutsideRoom { position: [f64; 3], bounds: [f64; 3] },

    /// Covariance inversion hit a vanishing pivot; the Mahalanobis metric for
    /// this training source is undefined.
    #[error("singular covariance for training source {source_index}: pivot {pivot:.3e} below tolerance")]
    SingularCovariance { source_index: usize, pivot: f64 },

    /// The affinity matrix collapsed to (near-)identity or (near-)uniform,
    /// which makes the spectral embedding meaningless. Usually a kernel
    /// bandwidth misconfiguration.
    #[error("degenerate affinity matrix: {reason}")]
    DegenerateAffinity { reason: String },

    /// An eigenvalue needed in the extension denominator is zero, negative, or
    /// numerically negligible.
    #[error("non-positive eigenvalue {value:.3e} at embedding dimension {index}")]
    NonPositiveEigenvalue { index: usize, value: f64 },

    /// A column of the extended affinity matrix has zero degree, so the
    /// normalization S^(-1/2) is undefined.
    #[error("zero degree at affinity column {column}")]
    ZeroDegree { column: usize },

    /// Pipeline parameters failed up-front validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
