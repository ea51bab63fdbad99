// SPDX-License-Identifier: AGPL-3.0-only

//! Scan configuration.
//!
//! A [`ButterflyConfig`] selects the Farey order, the potential amplitude,
//! the eigen driver, and the optional classification mode for one scan.
//! Every field has a default, so a JSON file only names what it changes.

use serde::{Deserialize, Serialize};

use crate::classify::ClassificationMode;
use crate::error::{ButterflyError, Result};
use crate::farey::FareySequence;
use crate::pipeline::BatchPolicy;
use crate::spectral::EigenDriver;

/// Parameters of a butterfly scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ButterflyConfig {
    /// Farey order n: every frequency p/q with q ≤ n is scanned.
    pub order: u32,
    /// Potential amplitude v (any finite real, including 0 and negatives).
    pub amplitude: f64,
    /// Eigensolver strategy.
    pub driver: EigenDriver,
    /// Scan frequencies from 1 down to 0.
    pub descending: bool,
    /// Include the endpoints 0/1 and 1/1.
    pub include_ends: bool,
    /// Label bands against continued-fraction neighbors.
    pub classification: Option<ClassificationMode>,
    /// Slack added to neighbor band edges when testing containment.
    pub containment_slack: f64,
    /// What a failed frequency does to the rest of the scan.
    pub batch_policy: BatchPolicy,
    /// Solve frequencies on the rayon pool.
    pub parallel: bool,
}

impl Default for ButterflyConfig {
    fn default() -> Self {
        Self {
            order: 30,
            amplitude: 1.0,
            driver: EigenDriver::Dense,
            descending: false,
            include_ends: false,
            classification: None,
            containment_slack: 0.0,
            batch_policy: BatchPolicy::Abort,
            parallel: true,
        }
    }
}

impl ButterflyConfig {
    /// Check parameters that would make the scan meaningless.
    ///
    /// # Errors
    /// [`ButterflyError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.order < 1 {
            return Err(ButterflyError::Config(format!(
                "order must be >= 1, got {}",
                self.order
            )));
        }
        if !self.amplitude.is_finite() {
            return Err(ButterflyError::Config(format!(
                "amplitude must be finite, got {}",
                self.amplitude
            )));
        }
        if !(self.containment_slack.is_finite() && self.containment_slack >= 0.0) {
            return Err(ButterflyError::Config(format!(
                "containment_slack must be finite and >= 0, got {}",
                self.containment_slack
            )));
        }
        if self.classification.is_some() && self.include_ends {
            return Err(ButterflyError::Config(
                "classification needs neighbors, which the endpoints 0 and 1 do not have; \
                 disable include_ends"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON document and validate it.
    ///
    /// # Errors
    /// [`ButterflyError::Config`] for malformed JSON, unknown fields, or
    /// values rejected by [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ButterflyError::Config(format!("JSON parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// The frequency sequence this configuration scans.
    #[must_use]
    pub fn sequence(&self) -> FareySequence {
        let mut seq = FareySequence::new(self.order);
        if self.descending {
            seq = seq.descending();
        }
        if self.include_ends {
            seq = seq.with_ends();
        }
        seq
    }
}
