// SPDX-License-Identifier: AGPL-3.0-only

//! Band classification against continued-fraction neighbors.
//!
//! Each band of p/q is compared with the bands of its two neighbors
//! (see [`crate::continued_fraction::neighbors_of`]). A band that fits
//! inside some band of a neighbor is attributed to that neighbor, and the
//! mode decides what the attribution is called: the side of the neighbor
//! the frequency lies on, or simply which neighbor it was.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ButterflyError, Result};
use crate::rational::Fraction;
use crate::spectral::SpectralInterval;

/// How a contained band is labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Below/above: which side of the containing neighbor the frequency is on.
    Directional,
    /// First/second: which neighbor contains the band.
    Source,
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directional => write!(f, "directional"),
            Self::Source => write!(f, "source"),
        }
    }
}

impl FromStr for ClassificationMode {
    type Err = ButterflyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "directional" | "up_down" | "updown" => Ok(Self::Directional),
            "source" | "a_b_type" | "ab" => Ok(Self::Source),
            other => Err(ButterflyError::InvalidInput(format!(
                "unknown classification mode '{other}' (expected directional or source)"
            ))),
        }
    }
}

/// Label attached to one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLabel {
    /// Contained in a band of a neighbor greater than the frequency.
    BelowNeighbor,
    /// Contained in a band of a neighbor smaller than the frequency.
    AboveNeighbor,
    /// Contained in a band of the truncated neighbor.
    FirstNeighbor,
    /// Contained in a band of the decremented neighbor.
    SecondNeighbor,
    /// Contained in neither neighbor's bands.
    Unclassified,
}

/// Labels bands by containment in neighbor bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandClassifier {
    mode: ClassificationMode,
    slack: f64,
}

impl BandClassifier {
    /// Classifier with the exact inclusive containment rule.
    #[must_use]
    pub const fn new(mode: ClassificationMode) -> Self {
        Self { mode, slack: 0.0 }
    }

    /// Widen neighbor bands by `slack` on both sides before testing
    /// containment. Negative or non-finite values are treated as 0.
    #[must_use]
    pub fn with_slack(self, slack: f64) -> Self {
        let slack = if slack.is_finite() { slack.max(0.0) } else { 0.0 };
        Self { slack, ..self }
    }

    /// Labeling mode.
    #[must_use]
    pub const fn mode(&self) -> ClassificationMode {
        self.mode
    }

    /// One label per band, aligned with `bands`.
    ///
    /// Neighbor 1 is tried before neighbor 2. In directional mode a
    /// neighbor equal to the frequency carries no direction and is skipped.
    #[must_use]
    pub fn classify(
        &self,
        frequency: &Fraction,
        bands: &[SpectralInterval],
        first: (&Fraction, &[SpectralInterval]),
        second: (&Fraction, &[SpectralInterval]),
    ) -> Vec<BandLabel> {
        bands
            .iter()
            .map(|band| self.label(frequency, band, first, second))
            .collect()
    }

    fn label(
        &self,
        frequency: &Fraction,
        band: &SpectralInterval,
        first: (&Fraction, &[SpectralInterval]),
        second: (&Fraction, &[SpectralInterval]),
    ) -> BandLabel {
        let candidates = [
            (first, BandLabel::FirstNeighbor),
            (second, BandLabel::SecondNeighbor),
        ];
        for ((neighbor, neighbor_bands), source_label) in candidates {
            if !self.contained(band, neighbor_bands) {
                continue;
            }
            match self.mode {
                ClassificationMode::Source => return source_label,
                ClassificationMode::Directional => match frequency.cmp(neighbor) {
                    Ordering::Less => return BandLabel::BelowNeighbor,
                    Ordering::Greater => return BandLabel::AboveNeighbor,
                    Ordering::Equal => {}
                },
            }
        }
        BandLabel::Unclassified
    }

    fn contained(&self, band: &SpectralInterval, neighbor_bands: &[SpectralInterval]) -> bool {
        neighbor_bands
            .iter()
            .any(|outer| outer.contains_with(band, self.slack))
    }
}
