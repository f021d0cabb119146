//! Spectral embedding with out-of-sample (Nyström) extension.
//!
//! Given the extended affinity `A` ((m+M)×m, training block `W` on top):
//!
//! 1. Degree vector `s = Aᵀ(A·1)`, i.e. `diag(AᵀA·1)`; every component must be
//!    strictly positive for the normalization to exist.
//! 2. The degree-normalized training kernel `W·S^(-1/2)` is conjugate to the
//!    symmetric `C = S^(-1/4) · W · S^(-1/4)`, which is what actually gets
//!    eigendecomposed with classical Jacobi rotations (real spectrum). Right
//!    eigenvectors recover as `φ = S^(1/4) u`.
//! 3. Eigenpairs are ordered by descending magnitude. The leading pair is the
//!    near-constant Perron vector and carries no directional information; the
//!    next `d` pairs become the embedding, each required to be strictly
//!    positive since `√λ` appears in the extension denominator.
//! 4. Nyström extension: `ψ_t = (1/√λ_t) · (A·S^(-1/2)) · φ_t`. On training
//!    rows this reduces to `φ_t √λ_t` identically, so a training sample
//!    reinserted as a query lands on its own embedding coordinates.

use log::{debug, info, warn};
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::EchoError;

/// Embedding configuration.
#[derive(Debug, Clone, Copy)]
pub struct SpectralParams {
    /// Embedding dimensionality d.
    pub dim: usize,
    /// Eigenvalues at or below this threshold are rejected.
    pub eig_tol: f64,
}

impl Default for SpectralParams {
    fn default() -> Self {
        Self { dim: 2, eig_tol: 1e-12 }
    }
}

/// d-dimensional coordinates for every sample (training rows first).
#[derive(Debug, Clone)]
pub struct Embedding {
    /// (m+M)×d coordinate matrix.
    pub coords: DenseMatrix<f64>,
    /// The d retained eigenvalues, descending.
    pub eigenvalues: Vec<f64>,
    pub n_train: usize,
    pub n_test: usize,
}

impl Embedding {
    pub fn dim(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn train_row(&self, i: usize) -> Vec<f64> {
        assert!(i < self.n_train, "training row {} out of bounds ({})", i, self.n_train);
        (0..self.dim()).map(|t| *self.coords.get((i, t))).collect()
    }

    pub fn test_row(&self, i: usize) -> Vec<f64> {
        assert!(i < self.n_test, "test row {} out of bounds ({})", i, self.n_test);
        (0..self.dim()).map(|t| *self.coords.get((self.n_train + i, t))).collect()
    }
}

/// Embed all samples of the extended affinity `a` (training block on top).
pub fn embed(
    a: &DenseMatrix<f64>,
    n_train: usize,
    params: &SpectralParams,
) -> Result<Embedding, EchoError> {
    let (n_total, m) = a.shape();
    assert_eq!(m, n_train, "affinity must have one column per training source");
    assert!(n_total >= m, "extended affinity cannot have fewer rows than columns");
    assert!(
        params.dim + 1 <= m,
        "embedding dimension {} plus the trivial eigenpair exceeds {} training sources",
        params.dim,
        m
    );

    info!(
        "Spectral embedding: {}x{} affinity, {} training rows, target dim {}",
        n_total, m, n_train, params.dim
    );

    // s = Aᵀ (A·1)
    let row_sums: Vec<f64> = (0..n_total)
        .map(|i| (0..m).map(|j| *a.get((i, j))).sum())
        .collect();
    let mut degrees = vec![0.0; m];
    for i in 0..n_total {
        for (j, d) in degrees.iter_mut().enumerate() {
            *d += a.get((i, j)) * row_sums[i];
        }
    }
    for (j, &s) in degrees.iter().enumerate() {
        if !(s > 0.0) {
            return Err(EchoError::ZeroDegree { column: j });
        }
    }

    let s_quarter: Vec<f64> = degrees.iter().map(|&s| s.powf(0.25)).collect();

    // C = S^(-1/4) W S^(-1/4), symmetric.
    let mut c_data = Vec::with_capacity(m * m);
    for i in 0..m {
        for j in 0..m {
            c_data.push(*a.get((i, j)) / (s_quarter[i] * s_quarter[j]));
        }
    }
    let c = DenseMatrix::from_iterator(c_data.into_iter(), m, m, 0);

    let (eigenvalues, eigenvectors) = symmetric_eigen(&c);

    // Descending by magnitude.
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_unstable_by(|&p, &q| {
        eigenvalues[q]
            .abs()
            .partial_cmp(&eigenvalues[p].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let leading = eigenvalues[order[0]];
    debug!("Leading eigenvalue {:.6e} (discarded as trivial)", leading);
    if leading <= 0.0 {
        return Err(EchoError::NonPositiveEigenvalue { index: 0, value: leading });
    }

    let mut retained = Vec::with_capacity(params.dim);
    for (rank, &idx) in order.iter().enumerate().skip(1).take(params.dim) {
        let lambda = eigenvalues[idx];
        if lambda <= params.eig_tol {
            warn!(
                "Eigenvalue {} of the affinity kernel is {:.3e}; kernel bandwidth likely misconfigured",
                rank, lambda
            );
            return Err(EchoError::NonPositiveEigenvalue { index: rank, value: lambda });
        }
        retained.push(idx);
    }

    let lambdas: Vec<f64> = retained.iter().map(|&idx| eigenvalues[idx]).collect();
    info!(
        "Retained eigenvalues: {:?} (leading trivial {:.6} discarded)",
        lambdas, leading
    );

    // ψ_it = (1/√λ_t) Σ_j A_ij s_j^(-1/2) φ_t[j],  φ_t[j] = s_j^(1/4) u_t[j]
    //      = (1/√λ_t) Σ_j A_ij s_j^(-1/4) u_t[j]
    let mut coords = Vec::with_capacity(n_total * lambdas.len());
    for i in 0..n_total {
        for (t, &idx) in retained.iter().enumerate() {
            let inv_sqrt_lambda = lambdas[t].sqrt().recip();
            let mut acc = 0.0;
            for j in 0..m {
                acc += a.get((i, j)) / s_quarter[j] * eigenvectors.get((j, idx));
            }
            coords.push(acc * inv_sqrt_lambda);
        }
    }

    Ok(Embedding {
        coords: DenseMatrix::from_iterator(coords.into_iter(), n_total, lambdas.len(), 0),
        eigenvalues: lambdas,
        n_train,
        n_test: n_total - n_train,
    })
}

/// Classical Jacobi eigendecomposition of a real symmetric matrix: repeatedly
/// rotate away the largest off-diagonal element. Returns eigenvalues and the
/// accumulated rotation matrix (eigenvectors column-wise, unsorted).
pub fn symmetric_eigen(mat: &DenseMatrix<f64>) -> (Vec<f64>, DenseMatrix<f64>) {
    let (n, cols) = mat.shape();
    assert_eq!(n, cols, "symmetric eigendecomposition requires a square matrix");

    let mut a: Vec<f64> = (0..n)
        .flat_map(|i| (0..n).map(move |j| *mat.get((i, j))))
        .collect();
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let max_iter = 100 * n * n;
    let tol = 1e-12;

    for _ in 0..max_iter {
        let mut p = 0;
        let mut q = 1;
        let mut max_off = 0.0_f64;
        for i in 0..n {
            for j in (i + 1)..n {
                let val = a[i * n + j].abs();
                if val > max_off {
                    max_off = val;
                    p = i;
                    q = j;
                }
            }
        }
        if max_off < tol {
            break;
        }

        let app = a[p * n + p];
        let aqq = a[q * n + q];
        let apq = a[p * n + q];
        let theta = if (app - aqq).abs() < 1e-30 {
            std::f64::consts::FRAC_PI_4
        } else {
            0.5 * (2.0 * apq / (app - aqq)).atan()
        };
        let (sin, cos) = theta.sin_cos();

        // A' = Gᵀ A G on rows/columns p and q.
        for i in 0..n {
            let aip = a[p * n + i];
            let aiq = a[q * n + i];
            a[p * n + i] = cos * aip + sin * aiq;
            a[q * n + i] = -sin * aip + cos * aiq;
        }
        for i in 0..n {
            let api = a[i * n + p];
            let aqi = a[i * n + q];
            a[i * n + p] = cos * api + sin * aqi;
            a[i * n + q] = -sin * api + cos * aqi;
        }
        // V' = V G
        for i in 0..n {
            let vip = v[i * n + p];
            let viq = v[i * n + q];
            v[i * n + p] = cos * vip + sin * viq;
            v[i * n + q] = -sin * vip + cos * viq;
        }
    }

    let eigenvalues: Vec<f64> = (0..n).map(|i| a[i * n + i]).collect();
    let eigenvectors = DenseMatrix::from_iterator(v.into_iter(), n, n, 0);
    (eigenvalues, eigenvectors)
}
