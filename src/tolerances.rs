// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized numerical thresholds with justification.
//!
//! Every convergence cap and comparison tolerance used by the eigensolvers,
//! the continued-fraction expansion of reals, tests, and the validation
//! binary is defined here. No ad-hoc magic numbers.
//!
//! | Category | Basis | Example |
//! |----------|-------|---------|
//! | Machine precision | IEEE 754 f64 | 1e-10 for exact small-matrix spectra |
//! | Solver control | Convergence caps | Jacobi sweep limit |
//! | Physical model | Band structure | driver parity of band edges |

// ═══════════════════════════════════════════════════════════════════
// Machine-precision tolerances
// ═══════════════════════════════════════════════════════════════════

/// Tolerance for quantities that should be exact in f64.
///
/// Eigenvalues of the q×q twisted operators are computed to ~1e-14 for
/// q ≲ 100; 1e-10 leaves four digits of headroom for accumulated rounding.
pub const EXACT_F64: f64 = 1e-10;

/// Tolerance for comparing band edges produced by different eigen drivers.
///
/// Dense QR and cyclic Jacobi both converge to machine precision on
/// symmetric matrices; the Sturm bisection used after Lanczos stops at
/// 2ε relative width. 1e-8 covers all three at q ≤ 200.
pub const DRIVER_PARITY: f64 = 1e-8;

// ═══════════════════════════════════════════════════════════════════
// Eigensolver control
// ═══════════════════════════════════════════════════════════════════

/// Convergence epsilon handed to nalgebra's `SymmetricEigen::try_new`.
pub const DENSE_EIGH_EPS: f64 = f64::EPSILON;

/// Iteration cap for the dense symmetric QR sweep.
///
/// Implicit QR needs O(q) iterations in practice; 10⁵ is far beyond any
/// frequency denominator this engine is run at and only trips on NaN input.
pub const DENSE_EIGH_MAX_ITER: usize = 100_000;

/// Maximum cyclic Jacobi sweeps before declaring non-convergence.
///
/// Cyclic Jacobi converges quadratically once off-diagonal mass is small;
/// 10–15 sweeps suffice for q ≤ 500. 100 is a generous ceiling.
pub const JACOBI_MAX_SWEEPS: usize = 100;

/// Jacobi stops once the off-diagonal Frobenius norm falls below this
/// fraction of the full Frobenius norm.
pub const JACOBI_OFF_DIAG_REL: f64 = 1e-14;

/// Lanczos breakdown threshold: ‖w‖ below this means an invariant
/// subspace has been found and the Krylov sequence terminates.
pub const LANCZOS_BREAKDOWN: f64 = 1e-12;

/// Seed for the Lanczos starting vector (deterministic runs).
pub const LANCZOS_SEED: u64 = 42;

/// Pivot guard for the Sturm LDLᵀ recurrence; replaces exact-zero pivots.
pub const STURM_PIVOT_GUARD: f64 = 1e-300;

/// Bisection iteration cap for Sturm eigenvalue location.
///
/// 200 halvings shrink any Gershgorin interval below f64 resolution.
pub const BISECTION_MAX_ITER: usize = 200;

// ═══════════════════════════════════════════════════════════════════
// Continued fractions of reals
// ═══════════════════════════════════════════════════════════════════

/// A remainder within this distance of an integer ends the expansion.
///
/// f64 carries ~16 digits; after a dozen terms the remainder has lost most
/// of them, so anything tighter than 1e-9 would chase rounding noise.
pub const CONTINUED_FRACTION_REAL_EPS: f64 = 1e-9;

// ═══════════════════════════════════════════════════════════════════
// Band-structure validation
// ═══════════════════════════════════════════════════════════════════

/// v ↔ −v reflection: band edges of H(−v) equal negated edges of H(v).
pub const AMPLITUDE_REFLECTION: f64 = 1e-9;

/// Free lattice (v = 0): adjacent bands touch, so gap widths vanish.
pub const FREE_LATTICE_GAP: f64 = 1e-9;
