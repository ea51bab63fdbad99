// SPDX-License-Identifier: AGPL-3.0-only

//! Per-frequency unit of work and the batch scan built on it.
//!
//! [`compute_row`] is a pure function of (frequency, amplitude, solver):
//! no state crosses frequencies, so [`scan`] fans the Farey terms out over
//! the rayon pool and collects results back in enumeration order. Rows are
//! handed to a [`BandSink`], which is the only place output is produced.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::{BandClassifier, BandLabel, ClassificationMode};
use crate::config::ButterflyConfig;
use crate::continued_fraction::neighbors_of;
use crate::error::{ButterflyError, Result};
use crate::rational::Fraction;
use crate::spectral::{
    BandEngine, HarperOperator, SpectralExtremes, SpectralInterval, SpectrumSolver,
};

/// What a failed frequency does to the rest of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Stop at the first failed frequency and return its error.
    #[default]
    Abort,
    /// Log the failure, count it, and keep going.
    SkipAndContinue,
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::SkipAndContinue => write!(f, "skip_and_continue"),
        }
    }
}

impl FromStr for BatchPolicy {
    type Err = ButterflyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" | "skip_and_continue" | "continue" => Ok(Self::SkipAndContinue),
            other => Err(ButterflyError::InvalidInput(format!(
                "unknown batch policy '{other}' (expected abort or skip)"
            ))),
        }
    }
}

/// Neighbor labels for the bands of one frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Mode the labels were produced in.
    pub mode: ClassificationMode,
    /// (truncated, decremented) continued-fraction neighbors.
    pub neighbors: (Fraction, Fraction),
    /// One label per band.
    pub labels: Vec<BandLabel>,
}

/// Bands of one frequency, optionally labeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButterflyRow {
    /// Frequency α = p/q.
    pub frequency: Fraction,
    /// Potential amplitude v.
    pub amplitude: f64,
    /// The q bands, ascending.
    pub bands: Vec<SpectralInterval>,
    /// Neighbor labels, when classification was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

/// Spectral extent of one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusPoint {
    /// Frequency α = p/q.
    pub frequency: Fraction,
    /// Lowest and highest eigenvalue over both twists.
    #[serde(flatten)]
    pub extremes: SpectralExtremes,
}

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Frequencies enumerated.
    pub frequencies: usize,
    /// Rows accepted by the sink.
    pub rows_written: usize,
    /// Frequencies dropped under [`BatchPolicy::SkipAndContinue`].
    pub skipped: usize,
}

/// Consumer of computed rows.
pub trait BandSink {
    /// Accept one row. Rows arrive in enumeration order.
    ///
    /// # Errors
    /// Implementation-defined; a failing sink aborts the run regardless of
    /// the batch policy.
    fn accept(&mut self, row: &ButterflyRow) -> Result<()>;
}

/// Keeps every row in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    rows: Vec<ButterflyRow>,
}

impl CollectingSink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows received so far.
    #[must_use]
    pub fn rows(&self) -> &[ButterflyRow] {
        &self.rows
    }

    /// Take ownership of the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<ButterflyRow> {
        self.rows
    }
}

impl BandSink for CollectingSink {
    fn accept(&mut self, row: &ButterflyRow) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink over any writer; wrap files in a `BufWriter`.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and return the writer.
    ///
    /// # Errors
    /// [`ButterflyError::Output`] if the flush fails.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer
            .flush()
            .map_err(|e| ButterflyError::Output(format!("flush: {e}")))?;
        Ok(self.writer)
    }
}

impl<W: Write> BandSink for JsonLinesSink<W> {
    fn accept(&mut self, row: &ButterflyRow) -> Result<()> {
        serde_json::to_writer(&mut self.writer, row)
            .map_err(|e| ButterflyError::Output(format!("serialize {}: {e}", row.frequency)))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| ButterflyError::Output(format!("write: {e}")))
    }
}

/// Bands of one frequency, labeled when a classifier is given.
///
/// Neighbor bands are computed with the same solver and amplitude.
///
/// # Errors
/// Any error of operator construction or eigensolve, for the frequency or
/// either neighbor; [`ButterflyError::InsufficientPrecision`] when
/// classifying an integer frequency.
pub fn compute_row<E: BandEngine + ?Sized>(
    frequency: &Fraction,
    amplitude: f64,
    solver: &E,
    classifier: Option<&BandClassifier>,
) -> Result<ButterflyRow> {
    let op = HarperOperator::from_fraction(frequency, amplitude)?;
    let bands = solver.compute_bands(&op)?;

    let classification = match classifier {
        None => None,
        Some(classifier) => {
            let (first, second) = neighbors_of(frequency)?;
            let first_bands =
                solver.compute_bands(&HarperOperator::from_fraction(&first, amplitude)?)?;
            let second_bands =
                solver.compute_bands(&HarperOperator::from_fraction(&second, amplitude)?)?;
            let labels = classifier.classify(
                frequency,
                &bands,
                (&first, first_bands.as_slice()),
                (&second, second_bands.as_slice()),
            );
            Some(Classification {
                mode: classifier.mode(),
                neighbors: (first, second),
                labels,
            })
        }
    };

    Ok(ButterflyRow {
        frequency: *frequency,
        amplitude,
        bands,
        classification,
    })
}

/// Spectral extent of one frequency.
///
/// # Errors
/// As [`BandEngine::compute_extremes`].
pub fn compute_radius<E: BandEngine + ?Sized>(
    frequency: &Fraction,
    amplitude: f64,
    solver: &E,
) -> Result<RadiusPoint> {
    let op = HarperOperator::from_fraction(frequency, amplitude)?;
    Ok(RadiusPoint {
        frequency: *frequency,
        extremes: solver.compute_extremes(&op)?,
    })
}

fn classifier_for(config: &ButterflyConfig) -> Option<BandClassifier> {
    config
        .classification
        .map(|mode| BandClassifier::new(mode).with_slack(config.containment_slack))
}

fn map_terms<T, F>(config: &ButterflyConfig, work: F) -> Vec<(Fraction, Result<T>)>
where
    T: Send,
    F: Fn(&Fraction) -> Result<T> + Sync,
{
    let terms: Vec<Fraction> = config.sequence().iter().collect();
    if config.parallel {
        terms.par_iter().map(|f| (*f, work(f))).collect()
    } else {
        terms.iter().map(|f| (*f, work(f))).collect()
    }
}

/// Every frequency of the configured sequence with its result, in
/// enumeration order. Failures are returned in place, not filtered.
#[must_use]
pub fn scan(config: &ButterflyConfig) -> Vec<(Fraction, Result<ButterflyRow>)> {
    scan_with(config, &SpectrumSolver::new(config.driver))
}

/// [`scan`] with an explicit engine in place of `config.driver`.
#[must_use]
pub fn scan_with<E: BandEngine + ?Sized>(
    config: &ButterflyConfig,
    engine: &E,
) -> Vec<(Fraction, Result<ButterflyRow>)> {
    let classifier = classifier_for(config);
    map_terms(config, |f| {
        compute_row(f, config.amplitude, engine, classifier.as_ref())
    })
}

/// `Ok` means the failure was skipped.
fn apply_policy(policy: BatchPolicy, frequency: &Fraction, err: ButterflyError) -> Result<()> {
    match policy {
        BatchPolicy::Abort => Err(err),
        BatchPolicy::SkipAndContinue => {
            warn!(frequency = %frequency, error = %err, "skipping frequency");
            Ok(())
        }
    }
}

/// Validate the configuration, scan, and feed rows to `sink` in order.
///
/// # Errors
/// Configuration errors; the first failed frequency under
/// [`BatchPolicy::Abort`]; any sink error.
pub fn run(config: &ButterflyConfig, sink: &mut dyn BandSink) -> Result<ScanSummary> {
    run_with(config, &SpectrumSolver::new(config.driver), sink)
}

/// [`run`] with an explicit engine in place of `config.driver`.
///
/// # Errors
/// As [`run`].
pub fn run_with<E: BandEngine + ?Sized>(
    config: &ButterflyConfig,
    engine: &E,
    sink: &mut dyn BandSink,
) -> Result<ScanSummary> {
    config.validate()?;
    let results = scan_with(config, engine);
    let mut summary = ScanSummary {
        frequencies: results.len(),
        ..ScanSummary::default()
    };

    for (frequency, result) in results {
        match result {
            Ok(row) => {
                sink.accept(&row)?;
                summary.rows_written += 1;
            }
            Err(err) => {
                apply_policy(config.batch_policy, &frequency, err)?;
                summary.skipped += 1;
            }
        }
    }

    info!(
        order = config.order,
        amplitude = config.amplitude,
        driver = %config.driver,
        frequencies = summary.frequencies,
        rows = summary.rows_written,
        skipped = summary.skipped,
        "butterfly scan complete"
    );
    Ok(summary)
}

/// Spectral extremes for every frequency of the configured sequence.
///
/// # Errors
/// Configuration errors and, under [`BatchPolicy::Abort`], the first failed
/// frequency. Skipped frequencies are absent from the result.
pub fn radius_scan(config: &ButterflyConfig) -> Result<Vec<RadiusPoint>> {
    radius_scan_with(config, &SpectrumSolver::new(config.driver))
}

/// [`radius_scan`] with an explicit engine in place of `config.driver`.
///
/// # Errors
/// As [`radius_scan`].
pub fn radius_scan_with<E: BandEngine + ?Sized>(
    config: &ButterflyConfig,
    engine: &E,
) -> Result<Vec<RadiusPoint>> {
    config.validate()?;
    let results = map_terms(config, |f| compute_radius(f, config.amplitude, engine));

    let mut points = Vec::with_capacity(results.len());
    for (frequency, result) in results {
        match result {
            Ok(point) => points.push(point),
            Err(err) => apply_policy(config.batch_policy, &frequency, err)?,
        }
    }
    debug!(points = points.len(), "radius scan complete");
    Ok(points)
}
