// SPDX-License-Identifier: AGPL-3.0-only

//! Spectral theory for the periodic Harper/Kohmoto operator.
//!
//! - `harper` - q×q cell construction and boundary twists
//! - `solver` - band intervals and spectral extremes
//! - `jacobi` - cyclic Jacobi eigensolver
//! - `lanczos` - Krylov tridiagonalization for extremal eigenvalues
//! - `tridiag` - Sturm-sequence bisection
//!
//! # Provenance
//!
//! - Hofstadter (1976) "Energy levels and wave functions of Bloch electrons
//!   in rational and irrational magnetic fields"
//! - Kohmoto, Kadanoff & Tang (1983) "Localization problem in one dimension:
//!   mapping and escape"
//! - Last (1994) "Zero measure spectrum for the almost Mathieu operator"

pub mod harper;
pub mod jacobi;
pub mod lanczos;
pub mod solver;
pub mod tridiag;

pub use harper::{potential_site, HarperOperator, Twist};
pub use jacobi::jacobi_eigenvalues;
pub use lanczos::{lanczos, LanczosTridiag};
pub use solver::{
    bands_from_twists, gaps, total_measure, BandEngine, EigenDriver, SpectralExtremes,
    SpectralInterval, SpectrumSolver,
};
pub use tridiag::{eigenvalue_at, find_all_eigenvalues, gershgorin_bounds, sturm_count};
