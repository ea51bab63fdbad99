// SPDX-License-Identifier: AGPL-3.0-only

//! Band intervals from the two boundary twists.
//!
//! By Floquet–Bloch theory the spectrum of a q-periodic Jacobi operator is
//! the union of q bands. Band edges are the eigenvalues of the cell with
//! twist θ = 0 and θ = π; the two sets interleave, so sorting all 2q values
//! and pairing them consecutively yields the bands in ascending order.
//! Adjacent bands may touch (a closed gap), never overlap.
//!
//! # Provenance
//! Toda, *Theory of Nonlinear Lattices*, §4.2 (discriminant of periodic Jacobi matrices)
//! Last (1994), Commun. Math. Phys. 164, 421

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::harper::{HarperOperator, Twist};
use super::jacobi::jacobi_eigenvalues;
use super::lanczos::lanczos;
use crate::error::{ButterflyError, Result};
use crate::tolerances;

/// Symmetric eigensolver strategy.
///
/// All drivers agree to within [`tolerances::DRIVER_PARITY`]; the choice is
/// a performance knob, never a correctness one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EigenDriver {
    /// Implicit symmetric QR (nalgebra `SymmetricEigen`).
    #[default]
    Dense,
    /// Cyclic Jacobi rotations.
    Jacobi,
    /// Lanczos + Sturm bisection for extremal eigenvalues only; full
    /// spectra under this driver go through the dense solver.
    Lanczos,
}

impl fmt::Display for EigenDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => write!(f, "dense"),
            Self::Jacobi => write!(f, "jacobi"),
            Self::Lanczos => write!(f, "lanczos"),
        }
    }
}

impl FromStr for EigenDriver {
    type Err = ButterflyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dense" | "qr" | "ev" | "evd" => Ok(Self::Dense),
            "jacobi" => Ok(Self::Jacobi),
            "lanczos" | "evr" | "extremal" => Ok(Self::Lanczos),
            other => Err(ButterflyError::InvalidInput(format!(
                "unknown eigen driver '{other}' (expected dense, jacobi, or lanczos)"
            ))),
        }
    }
}

/// One allowed-energy band `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralInterval {
    /// Lower band edge.
    pub low: f64,
    /// Upper band edge.
    pub high: f64,
}

impl SpectralInterval {
    /// Interval from its edges.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Band width `high − low`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Band center.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.low + self.high)
    }

    /// Whether `other` lies inside `self`, endpoints inclusive.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.contains_with(other, 0.0)
    }

    /// Containment with both edges of `self` widened by `slack`.
    #[must_use]
    pub fn contains_with(&self, other: &Self, slack: f64) -> bool {
        self.low - slack <= other.low && other.high <= self.high + slack
    }
}

/// Global spectral extent over both twists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralExtremes {
    /// Lowest eigenvalue of either twist.
    pub min: f64,
    /// Highest eigenvalue of either twist.
    pub max: f64,
}

impl SpectralExtremes {
    /// Spectral radius max(|min|, |max|).
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.min.abs().max(self.max.abs())
    }
}

/// Computes band intervals and spectral extremes of Harper operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpectrumSolver {
    driver: EigenDriver,
}

impl SpectrumSolver {
    /// Solver with the given strategy.
    #[must_use]
    pub const fn new(driver: EigenDriver) -> Self {
        Self { driver }
    }

    /// Strategy in use.
    #[must_use]
    pub const fn driver(&self) -> EigenDriver {
        self.driver
    }

    /// All q eigenvalues of the twisted cell, ascending.
    ///
    /// # Errors
    /// [`ButterflyError::EigensolveNonConvergence`] if the solver fails or
    /// returns non-finite values.
    pub fn twist_eigenvalues(&self, op: &HarperOperator, twist: Twist) -> Result<Vec<f64>> {
        let matrix = op.twisted(twist);
        let failed = || self.non_convergence(twist, op.dimension());
        let mut evals = match self.driver {
            EigenDriver::Dense | EigenDriver::Lanczos => {
                dense_eigenvalues(matrix).ok_or_else(failed)?
            }
            EigenDriver::Jacobi => {
                let (unit, scale) = unit_scaled(matrix);
                let mut evals =
                    jacobi_eigenvalues(&unit, tolerances::JACOBI_MAX_SWEEPS).ok_or_else(failed)?;
                evals.iter_mut().for_each(|x| *x *= scale);
                evals
            }
        };
        if evals.iter().any(|x| !x.is_finite()) {
            return Err(failed());
        }
        evals.sort_by(f64::total_cmp);
        Ok(evals)
    }

    /// Lowest and highest eigenvalue of the twisted cell.
    ///
    /// # Errors
    /// As [`Self::twist_eigenvalues`].
    pub fn twist_extremes(&self, op: &HarperOperator, twist: Twist) -> Result<(f64, f64)> {
        if self.driver != EigenDriver::Lanczos {
            let evals = self.twist_eigenvalues(op, twist)?;
            return match (evals.first(), evals.last()) {
                (Some(&lo), Some(&hi)) => Ok((lo, hi)),
                _ => Err(self.non_convergence(twist, op.dimension())),
            };
        }

        let (unit, scale) = unit_scaled(op.twisted(twist));
        let tri = lanczos(&unit, op.dimension(), tolerances::LANCZOS_SEED);
        if !tri.is_finite() {
            return Err(self.non_convergence(twist, op.dimension()));
        }
        tri.extremal_ritz_values()
            .map(|(lo, hi)| (lo * scale, hi * scale))
            .filter(|(lo, hi)| lo.is_finite() && hi.is_finite())
            .ok_or_else(|| self.non_convergence(twist, op.dimension()))
    }

    /// The q bands of the operator, ascending.
    ///
    /// # Errors
    /// [`ButterflyError::EigensolveNonConvergence`] for either twist. No
    /// partial band list is ever returned.
    pub fn compute_bands(&self, op: &HarperOperator) -> Result<Vec<SpectralInterval>> {
        let periodic = self.twist_eigenvalues(op, Twist::Periodic)?;
        let antiperiodic = self.twist_eigenvalues(op, Twist::Antiperiodic)?;
        let bands = bands_from_twists(&periodic, &antiperiodic);
        debug!(
            frequency = %op.frequency(),
            amplitude = op.amplitude(),
            driver = %self.driver,
            bands = bands.len(),
            "computed bands"
        );
        Ok(bands)
    }

    /// Lowest and highest eigenvalue across both twists.
    ///
    /// # Errors
    /// As [`Self::twist_extremes`].
    pub fn compute_extremes(&self, op: &HarperOperator) -> Result<SpectralExtremes> {
        let (min_zero, max_zero) = self.twist_extremes(op, Twist::Periodic)?;
        let (min_pi, max_pi) = self.twist_extremes(op, Twist::Antiperiodic)?;
        Ok(SpectralExtremes {
            min: min_zero.min(min_pi),
            max: max_zero.max(max_pi),
        })
    }

    fn non_convergence(&self, twist: Twist, dimension: usize) -> ButterflyError {
        ButterflyError::EigensolveNonConvergence {
            driver: self.driver,
            twist,
            dimension,
        }
    }
}

/// Source of band intervals and spectral extremes for the batch pipeline.
///
/// [`SpectrumSolver`] is the standard engine; wrappers can add caching or
/// instrumentation around it.
pub trait BandEngine: Send + Sync {
    /// The q bands of `op`, ascending.
    ///
    /// # Errors
    /// Any eigensolve failure.
    fn compute_bands(&self, op: &HarperOperator) -> Result<Vec<SpectralInterval>>;

    /// Lowest and highest eigenvalue of `op` across both twists.
    ///
    /// # Errors
    /// Any eigensolve failure.
    fn compute_extremes(&self, op: &HarperOperator) -> Result<SpectralExtremes>;
}

impl BandEngine for SpectrumSolver {
    fn compute_bands(&self, op: &HarperOperator) -> Result<Vec<SpectralInterval>> {
        SpectrumSolver::compute_bands(self, op)
    }

    fn compute_extremes(&self, op: &HarperOperator) -> Result<SpectralExtremes> {
        SpectrumSolver::compute_extremes(self, op)
    }
}

/// Divide by the largest absolute entry so squared norms cannot overflow.
///
/// Returns the scaled matrix and the factor to multiply eigenvalues by.
/// A zero or non-finite matrix is returned unscaled.
fn unit_scaled(matrix: DMatrix<f64>) -> (DMatrix<f64>, f64) {
    let scale = matrix.amax();
    if scale > 0.0 && scale.is_finite() {
        (matrix / scale, scale)
    } else {
        (matrix, 1.0)
    }
}

fn dense_eigenvalues(matrix: DMatrix<f64>) -> Option<Vec<f64>> {
    SymmetricEigen::try_new(
        matrix,
        tolerances::DENSE_EIGH_EPS,
        tolerances::DENSE_EIGH_MAX_ITER,
    )
    .map(|eig| eig.eigenvalues.iter().copied().collect())
}

/// Merge the two twisted spectra and pair consecutive values into bands.
///
/// Expects equal-length inputs; a trailing unpaired value is dropped.
#[must_use]
pub fn bands_from_twists(periodic: &[f64], antiperiodic: &[f64]) -> Vec<SpectralInterval> {
    let mut edges: Vec<f64> = periodic.iter().chain(antiperiodic).copied().collect();
    edges.sort_by(f64::total_cmp);
    edges
        .chunks_exact(2)
        .map(|pair| SpectralInterval::new(pair[0], pair[1]))
        .collect()
}

/// Lebesgue measure of the spectrum (sum of band widths).
#[must_use]
pub fn total_measure(bands: &[SpectralInterval]) -> f64 {
    bands.iter().map(SpectralInterval::width).sum()
}

/// Open gaps between consecutive bands, as intervals `[high_i, low_{i+1}]`.
#[must_use]
pub fn gaps(bands: &[SpectralInterval]) -> Vec<SpectralInterval> {
    bands
        .windows(2)
        .filter(|w| w[1].low > w[0].high)
        .map(|w| SpectralInterval::new(w[0].high, w[1].low))
        .collect()
}
