//! Closed real intervals.
//!
//! Numeric parameters of mathematical properties (a smoothness constant, a strong convexity
//! modulus, an eigenvalue bound, ...) are often only known to lie within some range. An
//! [`Interval`] carries such a parameter conservatively through property inference: every
//! operation returns an interval that contains every possible result of applying the operation
//! to values drawn from the operands.
//!
//! ```
//! use optalg_compute::interval::Interval;
//!
//! let mu = Interval::new(1.0, 2.0);
//! let rho = Interval::point(0.5);
//! assert_eq!(mu - rho, Interval::new(0.5, 1.5));
//! assert!((mu - rho).is_positive());
//! ```

use std::{hash::{Hash, Hasher}, ops::{Add, Mul, Neg, Sub}};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A closed interval `[lo, hi]` of real numbers.
///
/// Intervals **must never** contain `NaN` bounds. Equality and hashing compare the bit patterns of
/// the bounds, which is only meaningful because of this restriction.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    lo: f64,
    hi: f64,
}

/// Maps `-0.0` to `0.0`, so that the two zeros compare and hash equally.
fn normalize(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

impl Interval {
    /// Creates the interval spanned by the two given bounds, in any order.
    pub fn new(a: f64, b: f64) -> Self {
        debug_assert!(!a.is_nan() && !b.is_nan(), "interval bounds must not be NaN");
        Self {
            lo: normalize(a.min(b)),
            hi: normalize(a.max(b)),
        }
    }

    /// Creates the degenerate interval `[x, x]`.
    pub fn point(x: f64) -> Self {
        Self::new(x, x)
    }

    /// The lower bound.
    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// The upper bound.
    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Returns true if the interval contains a single value.
    pub fn is_point(&self) -> bool {
        self.lo == self.hi
    }

    /// Returns true if the given value lies within the interval.
    pub fn contains(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }

    /// Returns true if every value in the interval is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.lo > 0.0
    }

    /// Returns true if every value in the interval is non-negative.
    pub fn is_nonnegative(&self) -> bool {
        self.lo >= 0.0
    }

    /// Returns true if the interval is exactly `[0, 0]`.
    pub fn is_zero(&self) -> bool {
        self.lo == 0.0 && self.hi == 0.0
    }

    /// `|[a, b]|`, the set of absolute values of the interval's members.
    pub fn abs(self) -> Self {
        if self.lo >= 0.0 {
            self
        } else if self.hi <= 0.0 {
            -self
        } else {
            Self::new(0.0, (-self.lo).max(self.hi))
        }
    }

    /// `[a, b]^2`. Unlike `self * self`, this never produces a negative lower bound.
    pub fn square(self) -> Self {
        let abs = self.abs();
        Self::new(abs.lo * abs.lo, abs.hi * abs.hi)
    }

    /// Multiplies both bounds by a constant.
    pub fn scale(self, k: f64) -> Self {
        Self::new(self.lo * k, self.hi * k)
    }

    /// The interval of pointwise maxima, `{ max(x, y) | x in self, y in other }`.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.lo.max(other.lo), self.hi.max(other.hi))
    }

    /// The smallest interval containing both intervals.
    pub fn hull(self, other: Self) -> Self {
        Self::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.lo.to_bits() == other.lo.to_bits() && self.hi.to_bits() == other.hi.to_bits()
    }
}

impl Eq for Interval {}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lo.to_bits().hash(state);
        self.hi.to_bits().hash(state);
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_point() {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

impl From<f64> for Interval {
    fn from(x: f64) -> Self {
        Self::point(x)
    }
}

/// `[a, b] + [c, d] = [a + c, b + d]`
impl Add for Interval {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.lo + rhs.lo, self.hi + rhs.hi)
    }
}

/// `[a, b] - [c, d] = [a - d, b - c]`
impl Sub for Interval {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.lo - rhs.hi, self.hi - rhs.lo)
    }
}

/// `[a, b] * [c, d]` spans the extreme products of the bounds.
impl Mul for Interval {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let products = [
            self.lo * rhs.lo,
            self.lo * rhs.hi,
            self.hi * rhs.lo,
            self.hi * rhs.hi,
        ];
        let lo = products.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = products.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self::new(lo, hi)
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.hi, -self.lo)
    }
}
