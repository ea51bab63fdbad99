// SPDX-License-Identifier: AGPL-3.0-only

//! Farey sequences: every reduced fraction in [0, 1] with denominator ≤ n.
//!
//! Terms are produced by the neighbor recurrence: if a/b < c/d are
//! consecutive in F_n, the next term is (k·c − a)/(k·d − b) with
//! k = ⌊(n + b)/d⌋. Each term comes out already in lowest terms, so the
//! sequence is lazy, allocation-free, and exact.
//!
//! # Provenance
//! Hardy & Wright, *An Introduction to the Theory of Numbers*, §3.1–3.3

use std::iter::FusedIterator;

use crate::rational::{gcd, Fraction};

/// The n-th Farey sequence, ascending or descending, with or without 0 and 1.
///
/// Iterating borrows the description only, so the same sequence can be
/// walked any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FareySequence {
    order: u32,
    descending: bool,
    include_ends: bool,
}

impl FareySequence {
    /// Ascending F_n without the endpoints 0/1 and 1/1.
    pub const fn new(order: u32) -> Self {
        Self {
            order,
            descending: false,
            include_ends: false,
        }
    }

    /// Walk from 1 down to 0 instead.
    pub const fn descending(self) -> Self {
        Self {
            descending: true,
            ..self
        }
    }

    /// Also yield 0/1 and 1/1.
    pub const fn with_ends(self) -> Self {
        Self {
            include_ends: true,
            ..self
        }
    }

    /// Order n.
    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Number of terms the iterator yields.
    ///
    /// |F_n| = 1 + Σ_{k=1..n} φ(k) including both endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.order == 0 {
            return 0;
        }
        let interior: u64 = (2..=u64::from(self.order)).map(euler_phi).sum();
        let ends = if self.include_ends { 2 } else { 0 };
        usize::try_from(interior).unwrap_or(usize::MAX).saturating_add(ends)
    }

    /// Whether the sequence yields nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh iterator positioned at the first term.
    #[must_use]
    pub fn iter(&self) -> FareyIter {
        let n = i64::from(self.order);
        let (a, b, c, d) = if self.descending {
            (1, 1, n - 1, n)
        } else {
            (0, 1, 1, n)
        };
        FareyIter {
            n,
            a,
            b,
            c,
            d,
            descending: self.descending,
            include_ends: self.include_ends,
            done: self.order == 0,
        }
    }
}

impl IntoIterator for &FareySequence {
    type Item = Fraction;
    type IntoIter = FareyIter;

    fn into_iter(self) -> FareyIter {
        self.iter()
    }
}

/// Iterator over a [`FareySequence`].
#[derive(Debug, Clone)]
pub struct FareyIter {
    n: i64,
    a: i64,
    b: i64,
    c: i64,
    d: i64,
    descending: bool,
    include_ends: bool,
    done: bool,
}

impl FareyIter {
    fn advance(&mut self) {
        let k = (self.n + self.b) / self.d;
        let (c, d) = (k * self.c - self.a, k * self.d - self.b);
        self.a = self.c;
        self.b = self.d;
        self.c = c;
        self.d = d;
    }
}

impl Iterator for FareyIter {
    type Item = Fraction;

    fn next(&mut self) -> Option<Fraction> {
        while !self.done {
            let (p, q) = (self.a, self.b);
            let last = if self.descending { p == 0 } else { p == q };
            if last {
                self.done = true;
            } else {
                self.advance();
            }

            let is_end = p == 0 || p == q;
            if is_end && !self.include_ends {
                continue;
            }
            // Consecutive Farey terms are always coprime pairs.
            return Some(Fraction::from_coprime(p, q));
        }
        None
    }
}

impl FusedIterator for FareyIter {}

/// Euler's totient φ(n): integers in 1..=n coprime to n.
#[must_use]
pub fn euler_phi(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut result = n;
    let mut m = n;
    let mut p = 2;
    while p * p <= m {
        if m % p == 0 {
            while m % p == 0 {
                m /= p;
            }
            result -= result / p;
        }
        p += 1;
    }
    if m > 1 {
        result -= result / m;
    }
    result
}

/// Whether p/q is already in lowest terms with 0 ≤ p ≤ q.
#[must_use]
pub fn is_farey_term(p: i64, q: i64) -> bool {
    q > 0 && (0..=q).contains(&p) && gcd(p, q) == 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn pairs(seq: &FareySequence) -> Vec<(i64, i64)> {
        seq.iter()
            .map(|f| (f.numerator(), f.denominator()))
            .collect()
    }

    #[test]
    fn order_five_ascending_interior() {
        assert_eq!(
            pairs(&FareySequence::new(5)),
            vec![
                (1, 5),
                (1, 4),
                (1, 3),
                (2, 5),
                (1, 2),
                (3, 5),
                (2, 3),
                (3, 4),
                (4, 5)
            ]
        );
    }

    #[test]
    fn order_five_descending_with_ends() {
        let got = pairs(&FareySequence::new(5).descending().with_ends());
        assert_eq!(got.first(), Some(&(1, 1)));
        assert_eq!(got.last(), Some(&(0, 1)));
        assert_eq!(got.len(), 11);
        let mut asc = pairs(&FareySequence::new(5).with_ends());
        asc.reverse();
        assert_eq!(got, asc);
    }

    #[test]
    fn order_one() {
        assert!(FareySequence::new(1).iter().next().is_none());
        assert_eq!(
            pairs(&FareySequence::new(1).with_ends()),
            vec![(0, 1), (1, 1)]
        );
        assert_eq!(
            pairs(&FareySequence::new(1).descending().with_ends()),
            vec![(1, 1), (0, 1)]
        );
    }

    #[test]
    fn order_zero_is_empty() {
        let seq = FareySequence::new(0).with_ends();
        assert!(seq.is_empty());
        assert_eq!(seq.iter().count(), 0);
    }

    #[test]
    fn restartable() {
        let seq = FareySequence::new(7);
        let first: Vec<_> = seq.iter().collect();
        let second: Vec<_> = (&seq).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn len_matches_totient_sum() {
        for n in 1..=40 {
            let seq = FareySequence::new(n);
            assert_eq!(seq.iter().count(), seq.len(), "order {n}");
            let with_ends = seq.with_ends();
            assert_eq!(with_ends.iter().count(), with_ends.len(), "order {n} with ends");
        }
    }

    #[test]
    fn strictly_increasing_and_reduced() {
        let terms: Vec<_> = FareySequence::new(30).iter().collect();
        for w in terms.windows(2) {
            assert!(w[0] < w[1], "{} !< {}", w[0], w[1]);
        }
        for f in &terms {
            assert!(is_farey_term(f.numerator(), f.denominator()));
            assert!(f.denominator() <= 30);
        }
    }

    #[test]
    fn totient_values() {
        let expected = [0, 1, 1, 2, 2, 4, 2, 6, 4, 6, 4];
        for (n, &phi) in expected.iter().enumerate() {
            assert_eq!(euler_phi(n as u64), phi, "φ({n})");
        }
        assert_eq!(euler_phi(97), 96);
    }
}
