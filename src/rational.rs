// SPDX-License-Identifier: AGPL-3.0-only

//! Exact rational arithmetic for frequencies.
//!
//! A [`Fraction`] is always stored in lowest terms with a positive
//! denominator, so equal values have equal representations and the
//! operator structure built from a frequency is reproducible bit for bit.
//! Intermediate products are formed in `i128` and reduced before being
//! narrowed back to `i64`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ButterflyError, Result};

/// Greatest common divisor (Euclid's algorithm), always non-negative.
///
/// `gcd(0, 0) = 0`.
#[must_use]
pub fn gcd(a: i64, b: i64) -> i64 {
    let g = gcd_u128(u128::from(a.unsigned_abs()), u128::from(b.unsigned_abs()));
    // Only gcd(i64::MIN, 0 | i64::MIN) = 2⁶³ falls outside i64; saturate it.
    i64::try_from(g).unwrap_or(i64::MAX)
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Exact rational number in lowest terms, denominator > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFraction", into = "RawFraction")]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

#[derive(Serialize, Deserialize)]
struct RawFraction {
    numerator: i64,
    denominator: i64,
}

impl TryFrom<RawFraction> for Fraction {
    type Error = ButterflyError;

    fn try_from(raw: RawFraction) -> Result<Self> {
        Self::new(raw.numerator, raw.denominator)
    }
}

impl From<Fraction> for RawFraction {
    fn from(f: Fraction) -> Self {
        Self {
            numerator: f.numerator,
            denominator: f.denominator,
        }
    }
}

impl Fraction {
    /// The fraction 0/1.
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 1,
    };

    /// The fraction 1/1.
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Construct `numerator / denominator`, reducing to lowest terms.
    ///
    /// # Errors
    /// [`ButterflyError::DivisionByZero`] when `denominator == 0`.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(ButterflyError::DivisionByZero { numerator });
        }
        Self::reduce(i128::from(numerator), i128::from(denominator)).ok_or_else(|| {
            ButterflyError::InvalidInput(format!("{numerator}/{denominator} overflows i64"))
        })
    }

    /// The integer `n` as `n/1`.
    #[must_use]
    pub const fn integer(n: i64) -> Self {
        Self {
            numerator: n,
            denominator: 1,
        }
    }

    /// Wrap a pair already known to be coprime with `denominator > 0`.
    pub(crate) const fn from_coprime(numerator: i64, denominator: i64) -> Self {
        debug_assert!(denominator > 0);
        Self {
            numerator,
            denominator,
        }
    }

    /// Reduce an `i128` ratio; `None` if the reduced terms do not fit `i64`
    /// or the denominator is zero.
    fn reduce(mut n: i128, mut d: i128) -> Option<Self> {
        if d == 0 {
            return None;
        }
        if d < 0 {
            n = -n;
            d = -d;
        }
        let g = gcd_u128(n.unsigned_abs(), d.unsigned_abs());
        let g = i128::try_from(g).ok()?;
        Some(Self {
            numerator: i64::try_from(n / g).ok()?,
            denominator: i64::try_from(d / g).ok()?,
        })
    }

    /// Numerator (carries the sign).
    #[must_use]
    pub const fn numerator(&self) -> i64 {
        self.numerator
    }

    /// Denominator (always positive).
    #[must_use]
    pub const fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Largest integer ≤ self.
    #[must_use]
    pub const fn floor(&self) -> i64 {
        self.numerator.div_euclid(self.denominator)
    }

    /// Fractional part `self − floor(self)`, in [0, 1).
    #[must_use]
    pub const fn fract(&self) -> Self {
        // n mod d stays coprime to d, so no further reduction is needed.
        Self {
            numerator: self.numerator.rem_euclid(self.denominator),
            denominator: self.denominator,
        }
    }

    /// Whether the denominator is 1.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    /// Reciprocal `d/n`.
    ///
    /// # Errors
    /// [`ButterflyError::DivisionByZero`] for the zero fraction.
    pub fn recip(&self) -> Result<Self> {
        Self::new(self.denominator, self.numerator)
    }

    /// Nearest `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Sum, or `None` on `i64` overflow of the reduced result.
    #[must_use]
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        let n = i128::from(self.numerator) * i128::from(rhs.denominator)
            + i128::from(rhs.numerator) * i128::from(self.denominator);
        let d = i128::from(self.denominator) * i128::from(rhs.denominator);
        Self::reduce(n, d)
    }

    /// Difference, or `None` on overflow.
    #[must_use]
    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        let n = i128::from(self.numerator) * i128::from(rhs.denominator)
            - i128::from(rhs.numerator) * i128::from(self.denominator);
        let d = i128::from(self.denominator) * i128::from(rhs.denominator);
        Self::reduce(n, d)
    }

    /// Product, or `None` on overflow.
    #[must_use]
    pub fn checked_mul(&self, rhs: &Self) -> Option<Self> {
        let n = i128::from(self.numerator) * i128::from(rhs.numerator);
        let d = i128::from(self.denominator) * i128::from(rhs.denominator);
        Self::reduce(n, d)
    }

    /// Negation, or `None` when the numerator is `i64::MIN`.
    #[must_use]
    pub const fn checked_neg(&self) -> Option<Self> {
        match self.numerator.checked_neg() {
            Some(numerator) => Some(Self {
                numerator,
                denominator: self.denominator,
            }),
            None => None,
        }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.numerator) * i128::from(other.denominator);
        let rhs = i128::from(other.numerator) * i128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Neg for Fraction {
    type Output = Self;

    /// # Panics
    /// When the numerator is `i64::MIN`, in every build profile.
    fn neg(self) -> Self {
        match self.checked_neg() {
            Some(value) => value,
            None => panic!("fraction neg overflowed i64"),
        }
    }
}

macro_rules! impl_exact_op {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl $trait for Fraction {
            type Output = Self;

            /// # Panics
            /// On `i64` overflow of the reduced result, like primitive integers.
            fn $method(self, rhs: Self) -> Self {
                match self.$checked(&rhs) {
                    Some(value) => value,
                    None => panic!(concat!("fraction ", stringify!($method), " overflowed i64")),
                }
            }
        }

        impl $trait<i64> for Fraction {
            type Output = Self;

            fn $method(self, rhs: i64) -> Self {
                $trait::$method(self, Self::integer(rhs))
            }
        }
    };
}

impl_exact_op!(Add, add, checked_add);
impl_exact_op!(Sub, sub, checked_sub);
impl_exact_op!(Mul, mul, checked_mul);

impl From<i64> for Fraction {
    fn from(n: i64) -> Self {
        Self::integer(n)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for Fraction {
    type Err = ButterflyError;

    /// Parse `"p/q"` or a bare integer `"n"`.
    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|e| ButterflyError::InvalidInput(format!("bad fraction '{s}': {e}")))
        };
        match s.split_once('/') {
            Some((n, d)) => Self::new(parse(n)?, parse(d)?),
            None => Ok(Self::integer(parse(s)?)),
        }
    }
}
