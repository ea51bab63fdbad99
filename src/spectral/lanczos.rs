// SPDX-License-Identifier: AGPL-3.0-only

//! Lanczos tridiagonalization for extremal eigenvalues.
//!
//! Krylov subspace method with full reorthogonalization. Extremal Ritz
//! values converge first; with a generic starting vector and iteration to
//! breakdown they equal the extremal eigenvalues of the matrix exactly
//! (up to rounding), degenerate levels included.

use nalgebra::{DMatrix, DVector};

use super::tridiag::eigenvalue_at;
use crate::tolerances;

/// Krylov-subspace tridiagonal representation of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct LanczosTridiag {
    /// Diagonal elements α_j = ⟨v_j, A v_j⟩
    pub alpha: Vec<f64>,
    /// Off-diagonal elements β_j = ‖w_j‖ (length = iterations; the last
    /// entry is the residual norm at termination)
    pub beta: Vec<f64>,
}

impl LanczosTridiag {
    /// Number of Lanczos steps taken.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.alpha.len()
    }

    /// Whether every coefficient is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.alpha.iter().chain(&self.beta).all(|x| x.is_finite())
    }

    /// Off-diagonal of the m×m tridiagonal (drops the residual entry).
    #[must_use]
    pub fn off_diagonal(&self) -> &[f64] {
        let m = self.iterations();
        &self.beta[..m.saturating_sub(1)]
    }

    /// Smallest and largest Ritz values, or `None` for an empty run.
    #[must_use]
    pub fn extremal_ritz_values(&self) -> Option<(f64, f64)> {
        let m = self.iterations();
        let off = self.off_diagonal();
        let lo = eigenvalue_at(&self.alpha, off, 0)?;
        let hi = eigenvalue_at(&self.alpha, off, m.checked_sub(1)?)?;
        Some((lo, hi))
    }
}

/// Lanczos with full reorthogonalization on a dense symmetric matrix.
///
/// Runs at most `max_iter` steps (capped at the dimension) and stops early
/// when the residual drops below [`tolerances::LANCZOS_BREAKDOWN`], i.e.
/// when the Krylov space has become invariant.
///
/// # Provenance
/// Lanczos (1950), J. Res. Nat. Bur. Standards 45, 255
#[must_use]
pub fn lanczos(matrix: &DMatrix<f64>, max_iter: usize, seed: u64) -> LanczosTridiag {
    let n = matrix.nrows();
    let m = max_iter.min(n);
    let mut alpha = Vec::with_capacity(m);
    let mut beta = Vec::with_capacity(m);
    if m == 0 {
        return LanczosTridiag { alpha, beta };
    }

    let mut rng = LcgRng::new(seed);
    let mut v = DVector::from_fn(n, |_, _| rng.uniform() - 0.5);
    let norm = v.norm();
    v /= norm;

    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(m);
    let mut v_prev = DVector::zeros(n);
    let mut beta_prev = 0.0;

    for _ in 0..m {
        basis.push(v.clone());
        let mut w = matrix * &v - &v_prev * beta_prev;

        let a_j = w.dot(&v);
        alpha.push(a_j);
        w -= &v * a_j;

        for prev in &basis {
            let proj = w.dot(prev);
            w -= prev * proj;
        }

        let b_next = w.norm();
        beta.push(b_next);
        if b_next < tolerances::LANCZOS_BREAKDOWN {
            break;
        }

        v_prev = std::mem::replace(&mut v, w / b_next);
        beta_prev = b_next;
    }

    LanczosTridiag { alpha, beta }
}

/// Deterministic 64-bit LCG for reproducible starting vectors.
struct LcgRng(u64);

impl LcgRng {
    const fn new(seed: u64) -> Self {
        Self(seed.wrapping_add(1))
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }

    #[allow(clippy::cast_precision_loss)]
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }
}
