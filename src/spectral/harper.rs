// SPDX-License-Identifier: AGPL-3.0-only

//! Periodic Kohmoto/Harper operator at rational frequency.
//!
//! For α = p/q the potential of the quasiperiodic Schrödinger operator
//!   (H ψ)_n = ψ_{n+1} + ψ_{n−1} + v·χ_{[1−α, 1)}({nα}) ψ_n
//! is q-periodic, so its spectrum is that of a q×q cell with Bloch phase
//! θ on the wrap-around bond. Twists θ = 0 and θ = π give the band edges.
//!
//! The operator keeps only the potential diagonal; the skeleton and the two
//! twisted matrices are materialized on request as independent values, so
//! there is no shared matrix to mutate and restore between solves.
//!
//! # Provenance
//! Kohmoto, Kadanoff & Tang (1983), PRL 50, 1870
//! Harper (1955), Proc. Phys. Soc. London A 68, 874

use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{ButterflyError, Result};
use crate::rational::Fraction;

/// Boundary twist on the wrap-around bond of the periodic cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Twist {
    /// θ = 0: corner coupling +1.
    Periodic,
    /// θ = π: corner coupling −1.
    Antiperiodic,
}

impl Twist {
    /// Both twists, periodic first.
    pub const BOTH: [Self; 2] = [Self::Periodic, Self::Antiperiodic];

    /// Sign of the corner coupling.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Periodic => 1.0,
            Self::Antiperiodic => -1.0,
        }
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic => write!(f, "periodic"),
            Self::Antiperiodic => write!(f, "antiperiodic"),
        }
    }
}

/// Whether site `n` carries the potential at frequency α.
///
/// The rule is {nα} ≥ 1 − α. With α = p/q both sides share the
/// denominator q, so the test is the exact integer comparison
/// (n·p mod q) ≥ q − p.
#[must_use]
pub fn potential_site(alpha: &Fraction, site: i64) -> bool {
    let p = i128::from(alpha.numerator());
    let q = i128::from(alpha.denominator());
    (p * i128::from(site)).rem_euclid(q) >= q - p
}

/// The q-site cell of the Harper operator at frequency p/q.
#[derive(Debug, Clone, PartialEq)]
pub struct HarperOperator {
    frequency: Fraction,
    amplitude: f64,
    diagonal: Vec<f64>,
}

impl HarperOperator {
    /// Build the operator for frequency p/q and amplitude v.
    ///
    /// p/q is reduced first, so `build(2, 6, v)` is the 3-site cell of 1/3.
    ///
    /// # Errors
    /// [`ButterflyError::InvalidFrequency`] when `q == 0`;
    /// [`ButterflyError::InvalidInput`] for a non-finite amplitude.
    pub fn build(p: i64, q: i64, amplitude: f64) -> Result<Self> {
        if q == 0 {
            return Err(ButterflyError::InvalidFrequency {
                numerator: p,
                denominator: q,
            });
        }
        Self::from_fraction(&Fraction::new(p, q)?, amplitude)
    }

    /// Build the operator for an already-reduced frequency.
    ///
    /// # Errors
    /// [`ButterflyError::InvalidInput`] for a non-finite amplitude or a
    /// denominator too large to index.
    pub fn from_fraction(frequency: &Fraction, amplitude: f64) -> Result<Self> {
        if !amplitude.is_finite() {
            return Err(ButterflyError::InvalidInput(format!(
                "amplitude must be finite, got {amplitude}"
            )));
        }
        let q = frequency.denominator();
        let dimension = usize::try_from(q).map_err(|_| {
            ButterflyError::InvalidInput(format!("denominator {q} exceeds addressable size"))
        })?;

        let diagonal = (0..q)
            .map(|n| {
                if potential_site(frequency, n) {
                    amplitude
                } else {
                    0.0
                }
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(diagonal.len(), dimension);

        Ok(Self {
            frequency: *frequency,
            amplitude,
            diagonal,
        })
    }

    /// Frequency α in lowest terms.
    #[must_use]
    pub const fn frequency(&self) -> Fraction {
        self.frequency
    }

    /// Potential amplitude v.
    #[must_use]
    pub const fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Cell size q.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.diagonal.len()
    }

    /// Potential on each site of the cell.
    #[must_use]
    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    /// Open-chain tridiagonal cell: potential on the diagonal, 1 on the
    /// first sub- and super-diagonal, no wrap-around bond.
    #[must_use]
    pub fn skeleton(&self) -> DMatrix<f64> {
        let q = self.dimension();
        DMatrix::from_fn(q, q, |i, j| {
            if i == j {
                self.diagonal[i]
            } else if i.abs_diff(j) == 1 {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Open `len`-site section of the infinite chain starting at site
    /// `offset`, i.e. the rows and columns `offset..offset + len`.
    ///
    /// The potential repeats with period q, so any offset is valid,
    /// negative ones included. `finite_section(q, 0)` is the skeleton.
    #[must_use]
    pub fn finite_section(&self, len: usize, offset: i64) -> DMatrix<f64> {
        let q = self.dimension();
        let start = usize::try_from(offset.rem_euclid(self.frequency.denominator()))
            .unwrap_or_default();
        DMatrix::from_fn(len, len, |i, j| {
            if i == j {
                self.diagonal[(start + i) % q]
            } else if i.abs_diff(j) == 1 {
                1.0
            } else {
                0.0
            }
        })
    }

    /// Skeleton plus the wrap-around bond with the twist's sign at
    /// (0, q−1) and (q−1, 0).
    ///
    /// For q ≤ 2 the corners coincide with existing entries and the
    /// coupling accumulates onto them (q = 1 receives it twice on its
    /// single entry), which is what the Bloch reduction requires.
    #[must_use]
    pub fn twisted(&self, twist: Twist) -> DMatrix<f64> {
        let mut m = self.skeleton();
        let last = self.dimension() - 1;
        m[(0, last)] += twist.sign();
        m[(last, 0)] += twist.sign();
        m
    }
}
