// SPDX-License-Identifier: AGPL-3.0-only

//! Cyclic Jacobi eigenvalue iteration for dense symmetric matrices.
//!
//! Each sweep annihilates every off-diagonal pair once with a plane
//! rotation. Slower than implicit QR but unconditionally stable and easy
//! to audit, which makes it the cross-check driver for band edges.
//!
//! # Provenance
//! Golub & Van Loan, *Matrix Computations* (4th ed.), §8.5.2

use nalgebra::DMatrix;

use crate::tolerances;

/// Eigenvalues of a symmetric matrix, ascending.
///
/// Returns `None` if the off-diagonal mass has not dropped below
/// [`tolerances::JACOBI_OFF_DIAG_REL`] of the Frobenius norm after
/// `max_sweeps` sweeps, or if the iteration produced non-finite values.
#[must_use]
pub fn jacobi_eigenvalues(matrix: &DMatrix<f64>, max_sweeps: usize) -> Option<Vec<f64>> {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let total = a.norm();
    if !total.is_finite() {
        return None;
    }
    let threshold = tolerances::JACOBI_OFF_DIAG_REL * total;

    for _ in 0..max_sweeps {
        if off_diagonal_norm(&a) <= threshold {
            return sorted_diagonal(&a);
        }
        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, p, q);
            }
        }
    }

    if off_diagonal_norm(&a) <= threshold {
        sorted_diagonal(&a)
    } else {
        None
    }
}

/// Zero a[p][q] with a rotation applied from both sides.
fn rotate(a: &mut DMatrix<f64>, p: usize, q: usize) {
    let apq = a[(p, q)];
    if apq == 0.0 {
        return;
    }
    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
    let c = 1.0 / t.hypot(1.0);
    let s = t * c;

    let n = a.nrows();
    for k in 0..n {
        let akp = a[(k, p)];
        let akq = a[(k, q)];
        a[(k, p)] = c * akp - s * akq;
        a[(k, q)] = s * akp + c * akq;
    }
    for k in 0..n {
        let apk = a[(p, k)];
        let aqk = a[(q, k)];
        a[(p, k)] = c * apk - s * aqk;
        a[(q, k)] = s * apk + c * aqk;
    }
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;
}

fn off_diagonal_norm(a: &DMatrix<f64>) -> f64 {
    let mut sum = 0.0;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            if i != j {
                sum += a[(i, j)] * a[(i, j)];
            }
        }
    }
    sum.sqrt()
}

fn sorted_diagonal(a: &DMatrix<f64>) -> Option<Vec<f64>> {
    let mut evals: Vec<f64> = a.diagonal().iter().copied().collect();
    if evals.iter().any(|x| !x.is_finite()) {
        return None;
    }
    evals.sort_by(f64::total_cmp);
    Some(evals)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two() {
        // [[2, 1], [1, 2]] → 1, 3
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let evals = jacobi_eigenvalues(&m, tolerances::JACOBI_MAX_SWEEPS).unwrap();
        assert!((evals[0] - 1.0).abs() < tolerances::EXACT_F64);
        assert!((evals[1] - 3.0).abs() < tolerances::EXACT_F64);
    }

    #[test]
    fn ring_matches_cosine_formula() {
        // Periodic ring: eigenvalues 2 cos(2πk/n).
        let n = 9;
        let m = DMatrix::from_fn(n, n, |i, j| {
            let d = i.abs_diff(j);
            if d == 1 || d == n - 1 {
                1.0
            } else {
                0.0
            }
        });
        let evals = jacobi_eigenvalues(&m, tolerances::JACOBI_MAX_SWEEPS).unwrap();
        let mut exact: Vec<f64> = (0..n)
            .map(|k| 2.0 * (std::f64::consts::TAU * k as f64 / n as f64).cos())
            .collect();
        exact.sort_by(f64::total_cmp);
        for (got, want) in evals.iter().zip(&exact) {
            assert!((got - want).abs() < tolerances::EXACT_F64, "{got} vs {want}");
        }
    }

    #[test]
    fn diagonal_input_converges_immediately() {
        let m = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![3.0, -1.0, 2.0]));
        assert_eq!(jacobi_eigenvalues(&m, 0), Some(vec![-1.0, 2.0, 3.0]));
    }

    #[test]
    fn zero_sweeps_fail_on_coupled_input() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        assert!(jacobi_eigenvalues(&m, 0).is_none());
    }

    #[test]
    fn nan_input_fails() {
        let m = DMatrix::from_row_slice(2, 2, &[f64::NAN, 1.0, 1.0, 0.0]);
        assert!(jacobi_eigenvalues(&m, tolerances::JACOBI_MAX_SWEEPS).is_none());
    }
}
