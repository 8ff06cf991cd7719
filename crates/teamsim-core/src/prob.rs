//! Exact rational probability arithmetic.
//!
//! A particle's rank is the product of many per-turn likelihood factors over a
//! long game. Accumulating those factors in floating point underflows and
//! drifts, and ranks are compared and summed against sibling particles, so the
//! whole bookkeeping runs on arbitrary-precision rationals behind the [`Prob`]
//! newtype.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand::Rng;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, SubAssign};

/// Non-negative probability weight with exact rational arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Prob(BigRational);

impl Prob {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    /// Builds `num / den`. `den` must be non-zero.
    pub fn ratio(num: u64, den: u64) -> Self {
        assert!(den != 0, "probability denominator must be non-zero");
        Self(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub(crate) fn is_nonpositive(&self) -> bool {
        self.0.is_negative() || self.0.is_zero()
    }

    /// Returns this probability divided by two, the tie-break split.
    pub fn halved(&self) -> Self {
        Self(&self.0 / BigRational::from_integer(BigInt::from(2)))
    }

    /// Lossy conversion for diagnostics and summaries only.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Draws an exact rational uniformly in `[0, upper)` as `upper * r / 2^64`
    /// for a random 64-bit `r`.
    pub fn uniform_below<R: Rng + ?Sized>(upper: &Prob, rng: &mut R) -> Prob {
        let numer = BigInt::from(rng.next_u64());
        let denom = BigInt::one() << 64usize;
        Prob(&upper.0 * BigRational::new(numer, denom))
    }
}

impl Add for Prob {
    type Output = Prob;

    fn add(self, rhs: Prob) -> Prob {
        Prob(self.0 + rhs.0)
    }
}

impl AddAssign<&Prob> for Prob {
    fn add_assign(&mut self, rhs: &Prob) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Prob> for Prob {
    fn sub_assign(&mut self, rhs: &Prob) {
        self.0 -= &rhs.0;
    }
}

impl Mul for Prob {
    type Output = Prob;

    fn mul(self, rhs: Prob) -> Prob {
        Prob(self.0 * rhs.0)
    }
}

impl MulAssign<Prob> for Prob {
    fn mul_assign(&mut self, rhs: Prob) {
        self.0 *= rhs.0;
    }
}

impl MulAssign<&Prob> for Prob {
    fn mul_assign(&mut self, rhs: &Prob) {
        self.0 *= &rhs.0;
    }
}

impl Div for Prob {
    type Output = Prob;

    fn div(self, rhs: Prob) -> Prob {
        Prob(self.0 / rhs.0)
    }
}

impl fmt::Display for Prob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Draws an index proportional to the given weights, subtracting each weight
/// from a uniform draw until the remainder is non-positive. Returns `None`
/// when the total mass is zero.
pub fn weighted_index<'a, R, I>(weights: I, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a Prob>,
{
    let weights: Vec<&Prob> = weights.into_iter().collect();
    let mut total = Prob::zero();
    for weight in &weights {
        total += weight;
    }
    if total.is_zero() {
        return None;
    }

    let mut remainder = Prob::uniform_below(&total, rng);
    let mut last_positive = None;
    for (index, weight) in weights.iter().enumerate() {
        if weight.is_zero() {
            continue;
        }
        last_positive = Some(index);
        remainder -= weight;
        if remainder.is_nonpositive() {
            return Some(index);
        }
    }

    // Exact arithmetic guarantees the draw lands inside the mass, so the scan
    // can only fall through onto the final positive weight.
    last_positive
}
