// SPDX-License-Identifier: AGPL-3.0-only

//! Simple continued fractions and the two neighbor frequencies of a rational.
//!
//! A rational p/q = [a₀; a₁, …, a_k] has two "one-step-removed" rationals
//! that bracket it in the Stern–Brocot tree:
//!
//! - the truncation [a₀; a₁, …, a_{k−1}]
//! - the decrement  [a₀; a₁, …, a_k − 1]
//!
//! They sit on opposite sides of p/q and are the reference frequencies
//! whose bands are used to classify the bands of p/q.
//!
//! Real frequencies are handled only through their rational approximants
//! ([`expand_real`], [`rational_approximant`]).
//!
//! # Provenance
//! Khinchin, *Continued Fractions* (1964), ch. I
//! Graham, Knuth & Patashnik, *Concrete Mathematics*, §4.5 (Stern–Brocot tree)

use crate::error::{ButterflyError, Result};
use crate::rational::Fraction;
use crate::tolerances;

/// The golden mean (√5 − 1)/2, whose approximants are ratios of
/// consecutive Fibonacci numbers.
pub const GOLDEN_MEAN: f64 = 0.618_033_988_749_894_9;

/// Euclidean expansion of a fraction into continued-fraction terms.
///
/// Uses floor division, so a₀ is negative for negative fractions and all
/// later terms are ≥ 1. For a non-integer the last term is ≥ 2.
#[must_use]
pub fn to_continued_fraction(fraction: &Fraction) -> Vec<i64> {
    let mut n = i128::from(fraction.numerator());
    let mut d = i128::from(fraction.denominator());
    let mut terms = Vec::new();
    loop {
        let a = n.div_euclid(d);
        let r = n.rem_euclid(d);
        // |a| ≤ |n| and n, d start within i64.
        terms.push(i64::try_from(a).unwrap_or(i64::MAX));
        if r == 0 {
            break;
        }
        n = d;
        d = r;
    }
    terms
}

/// Rebuild a fraction from continued-fraction terms.
///
/// Runs the convergent recurrence h_i = a_i·h_{i−1} + h_{i−2},
/// k_i = a_i·k_{i−1} + k_{i−2} from (h, k) seeds (0, 1) and (1, 0).
///
/// # Errors
/// [`ButterflyError::InvalidInput`] for an empty expansion, `i64` overflow,
/// or a degenerate expansion whose value is infinite (e.g. `[a, 0]`).
pub fn from_continued_fraction(terms: &[i64]) -> Result<Fraction> {
    let (h, k) = convergent_terms(terms)?;
    if k == 0 {
        return Err(ButterflyError::InvalidInput(format!(
            "continued fraction {terms:?} has infinite value"
        )));
    }
    let narrow = |x: i128| {
        i64::try_from(x).map_err(|_| {
            ButterflyError::InvalidInput(format!("continued fraction {terms:?} overflows i64"))
        })
    };
    Fraction::new(narrow(h)?, narrow(k)?)
}

fn convergent_terms(terms: &[i64]) -> Result<(i128, i128)> {
    if terms.is_empty() {
        return Err(ButterflyError::InvalidInput(
            "empty continued fraction".to_string(),
        ));
    }
    let overflow =
        || ButterflyError::InvalidInput(format!("continued fraction {terms:?} overflows"));

    let (mut h_prev, mut h) = (0_i128, 1_i128);
    let (mut k_prev, mut k) = (1_i128, 0_i128);
    for &a in terms {
        let a = i128::from(a);
        let h_next = a
            .checked_mul(h)
            .and_then(|x| x.checked_add(h_prev))
            .ok_or_else(overflow)?;
        let k_next = a
            .checked_mul(k)
            .and_then(|x| x.checked_add(k_prev))
            .ok_or_else(overflow)?;
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
    }
    Ok((h, k))
}

/// All convergents [a₀], [a₀; a₁], …, [a₀; …, a_k].
///
/// # Errors
/// As [`from_continued_fraction`] for any prefix.
pub fn convergents(terms: &[i64]) -> Result<Vec<Fraction>> {
    (1..=terms.len())
        .map(|len| from_continued_fraction(&terms[..len]))
        .collect()
}

/// Collapse a trailing zero term: `[…, x, 0]` has the same value as `[…]`.
///
/// The zero makes the last partial quotient infinite, so the term before it
/// drops out as well. Applied repeatedly until no trailing zero remains.
#[must_use]
pub fn normalize_trailing(mut terms: Vec<i64>) -> Vec<i64> {
    while terms.len() >= 2 && terms.last() == Some(&0) {
        terms.truncate(terms.len() - 2);
    }
    terms
}

/// The two continued-fraction neighbors of a fraction.
///
/// Returns `(truncated, decremented)`: the fraction without its last term,
/// and the fraction with its last term reduced by one. A decrement that
/// leaves a trailing zero is normalized with [`normalize_trailing`].
///
/// # Errors
/// [`ButterflyError::InsufficientPrecision`] when the expansion has fewer
/// than two terms (integers, including the endpoints 0 and 1).
pub fn neighbors_of(fraction: &Fraction) -> Result<(Fraction, Fraction)> {
    let terms = to_continued_fraction(fraction);
    if terms.len() < 2 {
        return Err(ButterflyError::InsufficientPrecision {
            fraction: fraction.to_string(),
            terms: terms.len(),
        });
    }

    let truncated = from_continued_fraction(&terms[..terms.len() - 1])?;

    let mut decremented = terms;
    if let Some(last) = decremented.last_mut() {
        *last -= 1;
    }
    let decremented = from_continued_fraction(&normalize_trailing(decremented))?;

    Ok((truncated, decremented))
}

/// Continued-fraction terms of a real number, up to `max_terms`.
///
/// Stops early when the remainder is within
/// [`tolerances::CONTINUED_FRACTION_REAL_EPS`] of an integer; a remainder
/// just below an integer is rounded up and the expansion re-canonicalized
/// so the last term is never 1 (unless it is the only term).
///
/// # Errors
/// [`ButterflyError::InvalidInput`] for non-finite input or a term that
/// does not fit `i64`.
pub fn expand_real(x: f64, max_terms: usize) -> Result<Vec<i64>> {
    if !x.is_finite() {
        return Err(ButterflyError::InvalidInput(format!(
            "cannot expand non-finite {x}"
        )));
    }
    let eps = tolerances::CONTINUED_FRACTION_REAL_EPS;
    let mut terms = Vec::with_capacity(max_terms);
    let mut value = x;
    for _ in 0..max_terms {
        let floor = value.floor();
        let frac = value - floor;
        if 1.0 - frac < eps {
            terms.push(to_term(floor + 1.0)?);
            break;
        }
        terms.push(to_term(floor)?);
        if frac < eps {
            break;
        }
        value = 1.0 / frac;
    }

    // [.., a, 1] == [.., a + 1]
    if terms.len() >= 2 && terms.last() == Some(&1) {
        terms.pop();
        if let Some(last) = terms.last_mut() {
            *last += 1;
        }
    }
    Ok(terms)
}

#[allow(clippy::cast_possible_truncation)]
fn to_term(value: f64) -> Result<i64> {
    // i64::MAX is not representable in f64; 2⁶³ is the first value out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value >= LIMIT || value < -LIMIT {
        return Err(ButterflyError::InvalidInput(format!(
            "continued-fraction term {value} exceeds i64"
        )));
    }
    Ok(value as i64)
}

/// Best rational approximant of `x` from at most `max_terms` terms.
///
/// # Errors
/// As [`expand_real`], and [`ButterflyError::InvalidInput`] when
/// `max_terms == 0`.
pub fn rational_approximant(x: f64, max_terms: usize) -> Result<Fraction> {
    from_continued_fraction(&expand_real(x, max_terms)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::farey::FareySequence;

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).expect("nonzero denominator")
    }

    #[test]
    fn expansion_of_known_values() {
        assert_eq!(to_continued_fraction(&frac(15, 4)), vec![3, 1, 3]);
        assert_eq!(to_continued_fraction(&frac(2, 5)), vec![0, 2, 2]);
        assert_eq!(to_continued_fraction(&frac(1, 2)), vec![0, 2]);
        assert_eq!(to_continued_fraction(&Fraction::ONE), vec![1]);
        assert_eq!(to_continued_fraction(&frac(-7, 3)), vec![-3, 1, 2]);
    }

    #[test]
    fn round_trip_over_farey_sequence() {
        for f in FareySequence::new(60).with_ends().iter() {
            let terms = to_continued_fraction(&f);
            assert_eq!(from_continued_fraction(&terms).unwrap(), f, "terms {terms:?}");
        }
        for f in [frac(-7, 3), frac(355, 113), frac(1_000_003, 7)] {
            assert_eq!(from_continued_fraction(&to_continued_fraction(&f)).unwrap(), f);
        }
    }

    #[test]
    fn last_term_at_least_two_for_non_integers() {
        for f in FareySequence::new(40).iter() {
            let terms = to_continued_fraction(&f);
            assert!(terms.len() >= 2);
            assert!(*terms.last().unwrap() >= 2, "{f}: {terms:?}");
        }
    }

    #[test]
    fn degenerate_expansions_rejected() {
        assert!(from_continued_fraction(&[]).is_err());
        assert!(from_continued_fraction(&[3, 0]).is_err());
        assert!(from_continued_fraction(&[i64::MAX, i64::MAX, i64::MAX]).is_err());
    }

    #[test]
    fn trailing_zero_collapses() {
        assert_eq!(normalize_trailing(vec![0, 2, 0]), vec![0]);
        assert_eq!(normalize_trailing(vec![0, 3, 4, 0]), vec![0, 3]);
        assert_eq!(normalize_trailing(vec![0, 2]), vec![0, 2]);
        // The collapsed expansion has the value the recurrence assigns.
        assert_eq!(
            from_continued_fraction(&[0, 3, 4, 0]).unwrap(),
            from_continued_fraction(&[0, 3]).unwrap()
        );
    }

    #[test]
    fn neighbors_of_small_fractions() {
        assert_eq!(neighbors_of(&frac(1, 2)).unwrap(), (Fraction::ZERO, Fraction::ONE));
        assert_eq!(neighbors_of(&frac(1, 3)).unwrap(), (Fraction::ZERO, frac(1, 2)));
        assert_eq!(neighbors_of(&frac(2, 5)).unwrap(), (frac(1, 2), frac(1, 3)));
        assert_eq!(neighbors_of(&frac(3, 5)).unwrap(), (frac(1, 2), frac(2, 3)));
    }

    #[test]
    fn neighbors_bracket_and_are_farey_parents() {
        for f in FareySequence::new(50).iter() {
            let (n1, n2) = neighbors_of(&f).unwrap();
            let (lo, hi) = if n1 < n2 { (n1, n2) } else { (n2, n1) };
            assert!(lo < f && f < hi, "{lo} < {f} < {hi}");
            // Stern–Brocot parents: the mediant of the pair is f, and they are
            // adjacent (determinant one).
            assert_eq!(lo.numerator() + hi.numerator(), f.numerator(), "{f}");
            assert_eq!(lo.denominator() + hi.denominator(), f.denominator(), "{f}");
            let det = hi.numerator() * lo.denominator() - lo.numerator() * hi.denominator();
            assert_eq!(det, 1, "{f}");
        }
    }

    #[test]
    fn neighbors_distinct_beyond_denominator_two() {
        for f in FareySequence::new(40).iter().filter(|f| f.denominator() > 2) {
            let (n1, n2) = neighbors_of(&f).unwrap();
            assert_ne!(n1, f);
            assert_ne!(n2, f);
            assert_ne!(n1, n2);
        }
    }

    #[test]
    fn neighbors_need_two_terms() {
        for f in [Fraction::ZERO, Fraction::ONE, Fraction::integer(5)] {
            let err = neighbors_of(&f).unwrap_err();
            assert!(matches!(
                err,
                ButterflyError::InsufficientPrecision { terms: 1, .. }
            ));
        }
    }

    #[test]
    fn convergents_of_golden_mean_are_fibonacci_ratios() {
        let terms = expand_real(GOLDEN_MEAN, 12).unwrap();
        assert_eq!(terms[0], 0);
        let convs = convergents(&terms).unwrap();
        let fib = [1_i64, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233];
        // The trailing [.., 1, 1] was folded into [.., 2], so the final
        // convergent skips one Fibonacci ratio ahead.
        let last = convs.len() - 1;
        for (i, c) in convs.iter().enumerate().take(last).skip(1) {
            assert_eq!(*c, frac(fib[i - 1], fib[i]), "convergent {i}");
        }
        assert_eq!(convs[last], frac(fib[last], fib[last + 1]));
    }

    #[test]
    fn real_expansion_terminates_on_rationals() {
        assert_eq!(expand_real(3.75, 10).unwrap(), vec![3, 1, 3]);
        assert_eq!(rational_approximant(3.75, 10).unwrap(), frac(15, 4));
        assert_eq!(expand_real(0.5, 10).unwrap(), vec![0, 2]);
        assert_eq!(expand_real(2.0, 10).unwrap(), vec![2]);
    }

    #[test]
    fn real_approximant_of_pi() {
        assert_eq!(rational_approximant(std::f64::consts::PI, 2).unwrap(), frac(22, 7));
        assert_eq!(rational_approximant(std::f64::consts::PI, 4).unwrap(), frac(355, 113));
    }

    #[test]
    fn real_expansion_rejects_bad_input() {
        assert!(expand_real(f64::NAN, 5).is_err());
        assert!(expand_real(f64::INFINITY, 5).is_err());
        assert!(expand_real(1e300, 5).is_err());
        assert!(rational_approximant(0.3, 0).is_err());
    }
}
