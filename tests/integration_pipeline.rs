// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: configuration → scan → sink.
//!
//! Runs complete scans end-to-end, including JSON configuration, neighbor
//! classification, batch policies, and JSON-lines output.

use kohmoto_butterfly::classify::{BandLabel, ClassificationMode};
use kohmoto_butterfly::config::ButterflyConfig;
use kohmoto_butterfly::continued_fraction::neighbors_of;
use kohmoto_butterfly::error::ButterflyError;
use kohmoto_butterfly::pipeline::{
    radius_scan, radius_scan_with, run, run_with, scan, BatchPolicy, ButterflyRow,
    CollectingSink, JsonLinesSink,
};
use kohmoto_butterfly::rational::Fraction;
use kohmoto_butterfly::spectral::{
    BandEngine, HarperOperator, SpectralExtremes, SpectralInterval, SpectrumSolver,
};
use kohmoto_butterfly::{tolerances, Result};

/// Dense solver that refuses every cell of one denominator.
struct RefusingEngine {
    denominator: i64,
    inner: SpectrumSolver,
}

impl RefusingEngine {
    fn new(denominator: i64) -> Self {
        Self {
            denominator,
            inner: SpectrumSolver::default(),
        }
    }

    fn check(&self, op: &HarperOperator) -> Result<()> {
        if op.frequency().denominator() == self.denominator {
            Err(ButterflyError::InvalidInput(format!("refused {}", op.frequency())))
        } else {
            Ok(())
        }
    }
}

impl BandEngine for RefusingEngine {
    fn compute_bands(&self, op: &HarperOperator) -> Result<Vec<SpectralInterval>> {
        self.check(op)?;
        self.inner.compute_bands(op)
    }

    fn compute_extremes(&self, op: &HarperOperator) -> Result<SpectralExtremes> {
        self.check(op)?;
        self.inner.compute_extremes(op)
    }
}

#[test]
fn json_config_drives_a_classified_scan() {
    let config = ButterflyConfig::from_json(
        r#"{
            "order": 8,
            "amplitude": 1.0,
            "driver": "jacobi",
            "classification": "source",
            "parallel": true
        }"#,
    )
    .expect("valid config");

    let mut sink = CollectingSink::new();
    let summary = run(&config, &mut sink).expect("scan succeeds");
    assert_eq!(summary.frequencies, config.sequence().len());
    assert_eq!(summary.rows_written, summary.frequencies);
    assert_eq!(summary.skipped, 0);

    for row in sink.rows() {
        let c = row
            .classification
            .as_ref()
            .unwrap_or_else(|| panic!("{} missing classification", row.frequency));
        assert_eq!(c.mode, ClassificationMode::Source);
        assert_eq!(c.labels.len(), row.bands.len());
        assert_eq!(c.neighbors, neighbors_of(&row.frequency).expect("interior"));
        assert!(c.labels.iter().all(|l| matches!(
            l,
            BandLabel::FirstNeighbor | BandLabel::SecondNeighbor | BandLabel::Unclassified
        )));
    }
}

#[test]
fn directional_labels_point_toward_containing_neighbor() {
    let config = ButterflyConfig {
        order: 10,
        classification: Some(ClassificationMode::Directional),
        ..ButterflyConfig::default()
    };
    let mut sink = CollectingSink::new();
    run(&config, &mut sink).expect("scan succeeds");

    for row in sink.rows() {
        let c = row.classification.as_ref().expect("classified");
        let (first, second) = c.neighbors;
        for label in &c.labels {
            match label {
                BandLabel::BelowNeighbor => assert!(
                    row.frequency < first || row.frequency < second,
                    "{}: below-neighbor needs a larger neighbor",
                    row.frequency
                ),
                BandLabel::AboveNeighbor => assert!(
                    row.frequency > first || row.frequency > second,
                    "{}: above-neighbor needs a smaller neighbor",
                    row.frequency
                ),
                BandLabel::Unclassified => {}
                other => panic!("{}: source label {other:?} in directional mode", row.frequency),
            }
        }
    }
}

#[test]
fn descending_scan_reverses_rows() {
    let ascending = ButterflyConfig {
        order: 9,
        ..ButterflyConfig::default()
    };
    let descending = ButterflyConfig {
        descending: true,
        ..ascending.clone()
    };
    let up: Vec<Fraction> = scan(&ascending).into_iter().map(|(f, _)| f).collect();
    let mut down: Vec<Fraction> = scan(&descending).into_iter().map(|(f, _)| f).collect();
    down.reverse();
    assert_eq!(up, down);
}

#[test]
fn ends_are_scanned_without_classification() {
    let config = ButterflyConfig {
        order: 4,
        include_ends: true,
        amplitude: 0.5,
        ..ButterflyConfig::default()
    };
    let mut sink = CollectingSink::new();
    run(&config, &mut sink).expect("scan succeeds");
    let rows = sink.into_rows();
    assert_eq!(rows.first().map(|r| r.frequency), Some(Fraction::ZERO));
    assert_eq!(rows.last().map(|r| r.frequency), Some(Fraction::ONE));

    // α = 1: every site carries v, single band [v − 2, v + 2].
    let one = rows.last().expect("non-empty");
    assert_eq!(one.bands.len(), 1);
    assert!((one.bands[0].low + 1.5).abs() < tolerances::EXACT_F64);
    assert!((one.bands[0].high - 2.5).abs() < tolerances::EXACT_F64);
}

#[test]
fn classification_with_ends_is_a_config_error() {
    let config = ButterflyConfig {
        include_ends: true,
        classification: Some(ClassificationMode::Directional),
        batch_policy: BatchPolicy::SkipAndContinue,
        ..ButterflyConfig::default()
    };
    assert!(matches!(
        run(&config, &mut CollectingSink::new()),
        Err(ButterflyError::Config(_))
    ));
}

#[test]
fn json_lines_round_trip() {
    let config = ButterflyConfig {
        order: 6,
        classification: Some(ClassificationMode::Directional),
        parallel: false,
        ..ButterflyConfig::default()
    };
    let mut sink = JsonLinesSink::new(Vec::new());
    let summary = run(&config, &mut sink).expect("scan succeeds");
    let bytes = sink.into_inner().expect("flush");
    let text = String::from_utf8(bytes).expect("utf-8");

    let parsed: Vec<ButterflyRow> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid row"))
        .collect();
    assert_eq!(parsed.len(), summary.rows_written);

    let mut expected = CollectingSink::new();
    run(&config, &mut expected).expect("scan succeeds");
    for (got, want) in parsed.iter().zip(expected.rows()) {
        assert_eq!(got.frequency, want.frequency);
        assert_eq!(got.classification, want.classification);
        assert_eq!(got.bands.len(), want.bands.len());
        for (a, b) in got.bands.iter().zip(&want.bands) {
            assert!(
                (a.low - b.low).abs() < tolerances::EXACT_F64
                    && (a.high - b.high).abs() < tolerances::EXACT_F64,
                "{}: {a:?} vs {b:?}",
                got.frequency
            );
        }
    }
}

#[test]
fn radius_scan_is_ordered_and_bounded() {
    let config = ButterflyConfig {
        order: 12,
        amplitude: 1.0,
        ..ButterflyConfig::default()
    };
    let points = radius_scan(&config).expect("radius scan");
    let expected: Vec<Fraction> = config.sequence().iter().collect();
    let got: Vec<Fraction> = points.iter().map(|p| p.frequency).collect();
    assert_eq!(got, expected);

    // ‖H‖ ≤ 2 + |v| bounds every eigenvalue.
    for p in &points {
        assert!(p.extremes.min >= -3.0 - tolerances::EXACT_F64, "{}", p.frequency);
        assert!(p.extremes.max <= 3.0 + tolerances::EXACT_F64, "{}", p.frequency);
        assert!(p.extremes.min < p.extremes.max);
    }

    let json = serde_json::to_value(points[0]).expect("serialize");
    assert!(json.get("min").is_some() && json.get("max").is_some());
}

#[test]
fn skip_policy_counts_failures_and_keeps_later_rows() {
    let config = ButterflyConfig {
        order: 7,
        batch_policy: BatchPolicy::SkipAndContinue,
        ..ButterflyConfig::default()
    };
    let engine = RefusingEngine::new(5);
    let mut sink = CollectingSink::new();
    let summary = run_with(&config, &engine, &mut sink).expect("failures are skipped");

    let expected: Vec<Fraction> = config
        .sequence()
        .iter()
        .filter(|f| f.denominator() != 5)
        .collect();
    assert_eq!(summary.skipped, 4, "1/5, 2/5, 3/5, 4/5");
    assert_eq!(summary.rows_written + summary.skipped, summary.frequencies);
    let written: Vec<Fraction> = sink.rows().iter().map(|r| r.frequency).collect();
    assert_eq!(written, expected);
    assert!(written.last().is_some_and(|f| *f > Fraction::new(4, 5).expect("valid")));
}

#[test]
fn skip_policy_drops_failed_neighbors_from_classified_rows() {
    // 3/7 and 4/7 have 2/5 and 3/5 as neighbors.
    let config = ButterflyConfig {
        order: 7,
        classification: Some(ClassificationMode::Source),
        batch_policy: BatchPolicy::SkipAndContinue,
        ..ButterflyConfig::default()
    };
    let mut sink = CollectingSink::new();
    let summary = run_with(&config, &RefusingEngine::new(5), &mut sink).expect("skipped");
    assert!(summary.skipped > 4);
    assert_eq!(summary.rows_written + summary.skipped, summary.frequencies);
    for row in sink.rows() {
        let (first, second) = row.classification.as_ref().expect("classified").neighbors;
        assert_ne!(row.frequency.denominator(), 5);
        assert_ne!(first.denominator(), 5, "{}", row.frequency);
        assert_ne!(second.denominator(), 5, "{}", row.frequency);
    }
}

#[test]
fn abort_policy_returns_first_failure_in_order() {
    for (descending, first_failure) in [(false, "refused 1/5"), (true, "refused 4/5")] {
        let config = ButterflyConfig {
            order: 7,
            descending,
            parallel: true,
            ..ButterflyConfig::default()
        };
        let mut sink = CollectingSink::new();
        let err = run_with(&config, &RefusingEngine::new(5), &mut sink)
            .expect_err("abort propagates");
        assert_eq!(err, ButterflyError::InvalidInput(first_failure.into()));

        // Rows before the first q = 5 term reach the sink, nothing after.
        let before: Vec<Fraction> = config
            .sequence()
            .iter()
            .take_while(|f| f.denominator() != 5)
            .collect();
        let written: Vec<Fraction> = sink.rows().iter().map(|r| r.frequency).collect();
        assert_eq!(written, before, "descending={descending}");
    }
}

#[test]
fn radius_scan_policies_with_failing_engine() {
    let skip = ButterflyConfig {
        order: 6,
        batch_policy: BatchPolicy::SkipAndContinue,
        ..ButterflyConfig::default()
    };
    let engine = RefusingEngine::new(4);
    let points = radius_scan_with(&skip, &engine).expect("failures are skipped");
    assert_eq!(points.len(), skip.sequence().len() - 2);
    assert!(points.iter().all(|p| p.frequency.denominator() != 4));

    let abort = ButterflyConfig {
        batch_policy: BatchPolicy::Abort,
        ..skip
    };
    assert_eq!(
        radius_scan_with(&abort, &engine),
        Err(ButterflyError::InvalidInput("refused 1/4".into()))
    );
}
