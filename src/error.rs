// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for the butterfly spectral engine.
//!
//! Every failure is raised for one frequency at a time. Batch callers decide
//! whether a failed frequency aborts the scan or is skipped (see
//! [`crate::pipeline::BatchPolicy`]); the engine itself never drops a band.

use thiserror::Error;

use crate::spectral::{EigenDriver, Twist};

/// Errors arising from rational arithmetic, operator construction, or eigensolve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ButterflyError {
    /// Frequency with zero denominator handed to the operator builder.
    #[error("invalid frequency {numerator}/{denominator}: denominator must be positive")]
    InvalidFrequency {
        /// Numerator as supplied.
        numerator: i64,
        /// Denominator as supplied.
        denominator: i64,
    },

    /// Fraction constructed with a zero denominator.
    #[error("division by zero constructing {numerator}/0")]
    DivisionByZero {
        /// Numerator as supplied.
        numerator: i64,
    },

    /// Neighbor derivation needs at least two continued-fraction terms.
    #[error("{fraction} has a {terms}-term continued fraction; neighbors need at least 2")]
    InsufficientPrecision {
        /// The fraction whose neighbors were requested, as `p/q`.
        fraction: String,
        /// Length of its continued-fraction expansion.
        terms: usize,
    },

    /// The symmetric eigenproblem did not converge.
    #[error("{driver} eigensolve did not converge ({twist} twist, dimension {dimension})")]
    EigensolveNonConvergence {
        /// Solver strategy in use.
        driver: EigenDriver,
        /// Boundary twist being solved.
        twist: Twist,
        /// Matrix dimension (the frequency denominator).
        dimension: usize,
    },

    /// Malformed input (overflow, non-finite reals, empty expansions).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration rejected by validation or JSON parsing.
    #[error("config error: {0}")]
    Config(String),

    /// An output sink failed to serialize or write a row.
    #[error("output error: {0}")]
    Output(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ButterflyError>;
