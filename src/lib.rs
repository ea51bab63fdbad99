// SPDX-License-Identifier: AGPL-3.0-only

//! Kohmoto butterfly: band spectra of the periodic Harper/Kohmoto operator
//! over the Farey rationals.
//!
//! For each frequency α = p/q the q×q cell of
//!   (H ψ)_n = ψ_{n+1} + ψ_{n−1} + v·χ_{[1−α, 1)}({nα}) ψ_n
//! is solved under periodic and antiperiodic boundary twists; the merged
//! eigenvalues pair up into the q allowed bands. Stacking the bands of every
//! p/q with q ≤ n draws the butterfly. Bands can additionally be labeled by
//! containment in the bands of the two continued-fraction neighbors of α.
//!
//! ## Modules
//!   - `rational` - exact reduced fractions
//!   - `farey` - Farey sequence enumeration
//!   - `continued_fraction` - expansions, convergents, and neighbors
//!   - `spectral` - operator construction, eigen drivers, band intervals
//!   - `classify` - neighbor-containment band labels
//!   - `pipeline` - per-frequency rows, parallel scans, output sinks
//!   - `config` - scan configuration (JSON, validated)
//!   - `validation` - pass/fail harness for the validation binary
//!   - `tolerances` - every numerical threshold in one place
//!
//! ## Binaries
//!   - `butterfly_scan` - scan a Farey order and write JSON rows
//!   - `validate_butterfly` - physics checks with exit code 0/1

pub mod classify;
pub mod config;
pub mod continued_fraction;
pub mod error;
pub mod farey;
pub mod pipeline;
pub mod rational;
pub mod spectral;
pub mod tolerances;
pub mod validation;

pub use error::{ButterflyError, Result};
