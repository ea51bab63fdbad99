// SPDX-License-Identifier: AGPL-3.0-only

//! Kohmoto Butterfly Validation - band structure at rational frequency
//!
//! Checks the band engine against exact results:
//! - At α = p/q the spectrum splits into exactly q bands
//! - α = 1/3, v = 1 has hand-computable band edges
//! - v ↔ −v reflects the spectrum about 0 (bipartite sign flip)
//! - At v = 0 every band touches its neighbors and the union is [−2, 2]
//! - Dense, Jacobi, and Lanczos drivers agree on band edges and extremes
//! - Farey enumeration and continued fractions are exact
//!
//! # Provenance
//!
//! Kohmoto, Kadanoff & Tang (1983) PRL 50, 1870 - "Localization problem in
//!   one dimension: mapping and escape"
//! Ostlund, Pandit, Rand, Schellnhuber & Siggia (1983) PRL 50, 1873 -
//!   "One-dimensional Schrödinger equation with an almost periodic potential"
//! Hardy & Wright, *An Introduction to the Theory of Numbers*, ch. 3 & 10

use std::time::Instant;

use kohmoto_butterfly::classify::{BandClassifier, BandLabel, ClassificationMode};
use kohmoto_butterfly::continued_fraction::{
    from_continued_fraction, neighbors_of, rational_approximant, to_continued_fraction,
    GOLDEN_MEAN,
};
use kohmoto_butterfly::farey::{euler_phi, FareySequence};
use kohmoto_butterfly::pipeline::compute_row;
use kohmoto_butterfly::rational::Fraction;
use kohmoto_butterfly::spectral::{
    gaps, total_measure, EigenDriver, HarperOperator, SpectralInterval, SpectrumSolver,
};
use kohmoto_butterfly::tolerances;
use kohmoto_butterfly::validation::ValidationHarness;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Kohmoto Butterfly - Band Structure at Rational Frequency  ║");
    println!("║  Twisted-cell band edges, Farey scans, neighbor labels     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let start = Instant::now();
    let mut harness = ValidationHarness::new("kohmoto_butterfly");

    check_farey_enumeration(&mut harness);
    check_continued_fractions(&mut harness);
    check_one_third_regression(&mut harness);
    check_band_count_and_order(&mut harness);
    check_amplitude_reflection(&mut harness);
    check_free_lattice(&mut harness);
    check_driver_parity(&mut harness);
    check_classification(&mut harness);

    println!("  wall time: {:.2} s", start.elapsed().as_secs_f64());
    harness.finish();
}

fn solve(
    driver: EigenDriver,
    frequency: &Fraction,
    amplitude: f64,
) -> Option<Vec<SpectralInterval>> {
    let op = HarperOperator::from_fraction(frequency, amplitude).ok()?;
    SpectrumSolver::new(driver).compute_bands(&op).ok()
}

/// \[1\] F_5 by hand; |F_n| = Σ φ(k).
fn check_farey_enumeration(harness: &mut ValidationHarness) {
    println!("[1] Farey enumeration");

    let f5: Vec<String> = FareySequence::new(5).iter().map(|f| f.to_string()).collect();
    let expected = ["1/5", "1/4", "1/3", "2/5", "1/2", "3/5", "2/3", "3/4", "4/5"];
    println!("  F_5 = {}", f5.join(", "));
    harness.check_bool("F_5 matches hand enumeration", f5 == expected);

    let n = 60;
    let seq = FareySequence::new(n);
    let terms: Vec<Fraction> = seq.iter().collect();
    let phi_sum: u64 = (2..=u64::from(n)).map(euler_phi).sum();
    let phi_sum = usize::try_from(phi_sum).unwrap_or(usize::MAX);
    harness.check_count("|F_60| without ends = Σφ(k)", terms.len(), phi_sum);
    harness.check_bool(
        "F_60 strictly increasing",
        terms.windows(2).all(|w| w[0] < w[1]),
    );

    let with_ends: Vec<Fraction> = seq.with_ends().descending().iter().collect();
    harness.check_count("|F_60| with ends", with_ends.len(), phi_sum + 2);
    harness.check_bool(
        "descending F_60 runs 1/1 → 0/1",
        with_ends.first() == Some(&Fraction::ONE) && with_ends.last() == Some(&Fraction::ZERO),
    );
    println!();
}

/// \[2\] Round trip, neighbor parent law, golden-mean approximants.
fn check_continued_fractions(harness: &mut ValidationHarness) {
    println!("[2] Continued fractions");

    let mut round_trip = true;
    let mut parents = true;
    for f in FareySequence::new(40).iter() {
        let terms = to_continued_fraction(&f);
        round_trip &= from_continued_fraction(&terms).ok() == Some(f);

        // Neighbors a/b, c/d are the Stern–Brocot parents: |ad − bc| = 1
        // and their mediant is f.
        parents &= match neighbors_of(&f) {
            Ok((a, b)) => {
                let det = i128::from(a.numerator()) * i128::from(b.denominator())
                    - i128::from(b.numerator()) * i128::from(a.denominator());
                let mediant = Fraction::new(
                    a.numerator() + b.numerator(),
                    a.denominator() + b.denominator(),
                );
                det.abs() == 1 && mediant.ok() == Some(f)
            }
            Err(_) => false,
        };
    }
    harness.check_bool("round trip over F_40", round_trip);
    harness.check_bool("neighbors are Stern–Brocot parents over F_40", parents);

    match rational_approximant(GOLDEN_MEAN, 12) {
        Ok(approx) => {
            #[allow(clippy::cast_precision_loss)]
            let q = approx.denominator() as f64;
            let err = (approx.to_f64() - GOLDEN_MEAN).abs();
            println!("  golden mean ≈ {approx} (error {err:.2e})");
            harness.check_upper("golden approximant error < 1/q²", err, 1.0 / (q * q));
        }
        Err(e) => {
            println!("  golden mean expansion failed: {e}");
            harness.check_bool("golden approximant", false);
        }
    }
    println!();
}

/// \[3\] α = 1/3, v = 1: Z = {−1, 1 ± √2}, P = {±√3, 1}.
fn check_one_third_regression(harness: &mut ValidationHarness) {
    println!("[3] α = 1/3, v = 1 regression");

    let s2 = std::f64::consts::SQRT_2;
    let s3 = 3.0_f64.sqrt();
    let expected = [(-s3, -1.0), (1.0 - s2, 1.0), (s3, 1.0 + s2)];

    let bands = Fraction::new(1, 3)
        .ok()
        .and_then(|third| solve(EigenDriver::Dense, &third, 1.0));
    let Some(bands) = bands else {
        harness.check_bool("1/3 bands computed", false);
        return;
    };
    harness.check_count("1/3 band count", bands.len(), 3);
    for (i, (band, &(lo, hi))) in bands.iter().zip(&expected).enumerate() {
        println!("  band {i}: [{:.12}, {:.12}]", band.low, band.high);
        harness.check_abs(&format!("1/3 band {i} low"), band.low, lo, tolerances::EXACT_F64);
        harness.check_abs(&format!("1/3 band {i} high"), band.high, hi, tolerances::EXACT_F64);
    }
    println!();
}

/// \[4\] q bands, ascending, overlapping at most in an endpoint.
fn check_band_count_and_order(harness: &mut ValidationHarness) {
    println!("[4] Band count and ordering over F_25 (with ends)");

    let mut counts_ok = true;
    let mut ordered = true;
    let mut solved = 0_usize;
    for f in FareySequence::new(25).with_ends().iter() {
        let Some(bands) = solve(EigenDriver::Dense, &f, 1.0) else {
            counts_ok = false;
            continue;
        };
        solved += 1;
        counts_ok &= i64::try_from(bands.len()).ok() == Some(f.denominator());
        ordered &= bands.iter().all(|b| b.low <= b.high)
            && bands
                .windows(2)
                .all(|w| w[0].high <= w[1].low + tolerances::EXACT_F64);
    }
    println!("  {solved} frequencies solved");
    harness.check_bool("every p/q yields exactly q bands", counts_ok);
    harness.check_bool("bands ascending, non-overlapping", ordered);
    println!();
}

/// \[5\] Bands of −v are the negated, reversed bands of v.
fn check_amplitude_reflection(harness: &mut ValidationHarness) {
    println!("[5] Amplitude reflection v ↔ −v");

    let v = 1.7;
    let mut worst = 0.0_f64;
    for f in FareySequence::new(15).with_ends().iter() {
        let (Some(plus), Some(minus)) = (
            solve(EigenDriver::Dense, &f, v),
            solve(EigenDriver::Dense, &f, -v),
        ) else {
            worst = f64::INFINITY;
            continue;
        };
        for (a, b) in plus.iter().zip(minus.iter().rev()) {
            worst = worst.max((a.low + b.high).abs()).max((a.high + b.low).abs());
        }
    }
    println!("  max edge deviation: {worst:.2e}");
    harness.check_upper(
        "reflection deviation over F_15",
        worst,
        tolerances::AMPLITUDE_REFLECTION,
    );
    println!();
}

/// \[6\] v = 0: bands close up into [−2, 2].
fn check_free_lattice(harness: &mut ValidationHarness) {
    println!("[6] Free lattice v = 0");

    let mut widest_gap = 0.0_f64;
    let mut worst_measure = 0.0_f64;
    for f in FareySequence::new(20).iter() {
        let Some(bands) = solve(EigenDriver::Dense, &f, 0.0) else {
            widest_gap = f64::INFINITY;
            continue;
        };
        let gap = gaps(&bands).iter().map(SpectralInterval::width).fold(0.0, f64::max);
        widest_gap = widest_gap.max(gap);
        worst_measure = worst_measure.max((total_measure(&bands) - 4.0).abs());
    }
    println!("  widest gap {widest_gap:.2e}, measure deviation {worst_measure:.2e}");
    harness.check_upper("gaps closed at v = 0", widest_gap, tolerances::FREE_LATTICE_GAP);
    harness.check_upper("measure 4 at v = 0", worst_measure, tolerances::FREE_LATTICE_GAP);
    println!();
}

/// \[7\] Drivers agree on bands; Lanczos extremes match dense band edges.
fn check_driver_parity(harness: &mut ValidationHarness) {
    println!("[7] Eigen driver parity");

    let v = 1.3;
    let mut band_dev = 0.0_f64;
    let mut extreme_dev = 0.0_f64;
    for f in FareySequence::new(18).iter() {
        let (Some(dense), Some(jacobi)) = (
            solve(EigenDriver::Dense, &f, v),
            solve(EigenDriver::Jacobi, &f, v),
        ) else {
            band_dev = f64::INFINITY;
            continue;
        };
        for (a, b) in dense.iter().zip(&jacobi) {
            band_dev = band_dev.max((a.low - b.low).abs()).max((a.high - b.high).abs());
        }

        let extremes = HarperOperator::from_fraction(&f, v)
            .and_then(|op| SpectrumSolver::new(EigenDriver::Lanczos).compute_extremes(&op));
        match (extremes, dense.first(), dense.last()) {
            (Ok(ext), Some(lo), Some(hi)) => {
                extreme_dev = extreme_dev
                    .max((ext.min - lo.low).abs())
                    .max((ext.max - hi.high).abs());
            }
            _ => extreme_dev = f64::INFINITY,
        }
    }
    println!("  dense vs jacobi: {band_dev:.2e}, lanczos extremes: {extreme_dev:.2e}");
    harness.check_upper("dense/jacobi band edges", band_dev, tolerances::DRIVER_PARITY);
    harness.check_upper("lanczos extremes", extreme_dev, tolerances::DRIVER_PARITY);
    println!();
}

/// \[8\] Labels of 1/3 against 0/1 and 1/2.
fn check_classification(harness: &mut ValidationHarness) {
    println!("[8] Neighbor classification of 1/3");

    let solver = SpectrumSolver::default();
    let classifier = BandClassifier::new(ClassificationMode::Directional);
    let labels = Fraction::new(1, 3)
        .and_then(|third| compute_row(&third, 1.0, &solver, Some(&classifier)))
        .ok()
        .and_then(|row| row.classification)
        .map(|c| c.labels);
    println!("  labels: {labels:?}");
    harness.check_bool(
        "1/3 directional labels",
        labels
            == Some(vec![
                BandLabel::AboveNeighbor,
                BandLabel::AboveNeighbor,
                BandLabel::BelowNeighbor,
            ]),
    );

    let all_classified = FareySequence::new(12).iter().all(|f| {
        compute_row(&f, 0.0, &solver, Some(&classifier))
            .ok()
            .and_then(|row| row.classification)
            .is_some()
    });
    harness.check_bool("every interior p/q classifies at v = 0", all_classified);
    println!();
}
