//! # echomap
//!
//! Manifold-learning acoustic source localization from a fixed microphone
//! pair. A single batch pipeline maps simulated room acoustics to source
//! directions:
//!
//! 1. **Geometry/Simulation**: sources on a circular arc around the
//!    microphone pair (half circle by default, so a two-microphone array can
//!    tell every direction apart), L seeded positional perturbations per
//!    training source, shoebox image-source impulse responses ([`room`]).
//! 2. **Features**: relative transfer functions H1/H2 at D frequency bins,
//!    stacked into real vectors ([`features`]).
//! 3. **Covariance**: per-source ridge-regularized perturbation covariance and
//!    its precision, the local anisotropic metric ([`covariance`]).
//! 4. **Affinity**: Mahalanobis-Gaussian training kernel W and its
//!    out-of-sample extension A ([`affinity`]).
//! 5. **Spectral**: Jacobi eigendecomposition of the degree-normalized kernel,
//!    Nyström extension to test rows ([`spectral`]).
//! 6. **Interpolation**: k-NN inverse-distance angle interpolation with
//!    circular azimuth handling ([`interpolate`]).
//! 7. **Evaluation**: wrapped angular RMSE ([`evaluate`]).
//!
//! The [`pipeline::LocalizerBuilder`] front end wires the stages together:
//!
//! ```ignore
//! use echomap::pipeline::LocalizerBuilder;
//! use echomap::room::ShoeboxRoom;
//!
//! let room = ShoeboxRoom::default();
//! let report = LocalizerBuilder::new()
//!     .with_sources(50, 49)
//!     .with_perturbations(5, 0.01)
//!     .with_embedding(2)
//!     .with_neighbors(3)
//!     .run(&room)?;
//! println!("RMSE: {:.4} rad", report.rmse);
//! ```
//!
//! All stages emit structured logs (info/debug/trace) compatible with
//! `env_logger`; every numerical guard surfaces as an [`error::EchoError`]
//! variant instead of propagating NaN.

pub mod affinity;
pub mod covariance;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod geometry;
pub mod interpolate;
pub mod pipeline;
pub mod room;
pub mod spectral;

#[cfg(test)]
mod tests;

/// Test-only logger hookup; safe to call repeatedly.
#[cfg(test)]
pub(crate) fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
