// SPDX-License-Identifier: AGPL-3.0-only

//! Sturm bisection for symmetric tridiagonal matrices.
//!
//! Counts eigenvalues below a shift from the LDLᵀ pivots and locates any
//! single eigenvalue by index, so extremal queries cost O(N log 1/ε)
//! instead of a full decomposition.

use crate::tolerances;

/// Count eigenvalues of a symmetric tridiagonal matrix strictly below λ.
///
/// The number of negative pivots of LDLᵀ(T − λI) equals the count
/// (Sylvester's law of inertia).
///
/// - `diagonal`: d[0..n]
/// - `off_diag`: e[0..n−1]
#[must_use]
pub fn sturm_count(diagonal: &[f64], off_diag: &[f64], lambda: f64) -> usize {
    let Some(&d0) = diagonal.first() else {
        return 0;
    };

    let guard = tolerances::STURM_PIVOT_GUARD;
    let mut q = d0 - lambda;
    let mut count = usize::from(q < 0.0);
    for (d, e) in diagonal[1..].iter().zip(off_diag) {
        let q_safe = if q.abs() < guard {
            guard.copysign(q)
        } else {
            q
        };
        q = (d - lambda) - e * e / q_safe;
        if q < 0.0 {
            count += 1;
        }
    }
    count
}

/// Gershgorin interval containing every eigenvalue, padded by 1.
#[must_use]
pub fn gershgorin_bounds(diagonal: &[f64], off_diag: &[f64]) -> (f64, f64) {
    let n = diagonal.len();
    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    for (i, &d) in diagonal.iter().enumerate() {
        let left = if i > 0 { off_diag[i - 1].abs() } else { 0.0 };
        let right = if i + 1 < n { off_diag[i].abs() } else { 0.0 };
        lo = lo.min(d - left - right);
        hi = hi.max(d + left + right);
    }
    (lo - 1.0, hi + 1.0)
}

/// The k-th smallest eigenvalue (0-based) by bisection on the Sturm count.
///
/// Returns `None` when `k` is out of range.
#[must_use]
pub fn eigenvalue_at(diagonal: &[f64], off_diag: &[f64], k: usize) -> Option<f64> {
    if k >= diagonal.len() {
        return None;
    }
    let (mut a, mut b) = gershgorin_bounds(diagonal, off_diag);
    for _ in 0..tolerances::BISECTION_MAX_ITER {
        let mid = 0.5 * (a + b);
        if (b - a) < 2.0 * f64::EPSILON * mid.abs().max(1.0) {
            break;
        }
        if sturm_count(diagonal, off_diag, mid) <= k {
            a = mid;
        } else {
            b = mid;
        }
    }
    Some(0.5 * (a + b))
}

/// All eigenvalues, ascending. O(N² log 1/ε).
#[must_use]
pub fn find_all_eigenvalues(diagonal: &[f64], off_diag: &[f64]) -> Vec<f64> {
    (0..diagonal.len())
        .filter_map(|k| eigenvalue_at(diagonal, off_diag, k))
        .collect()
}
