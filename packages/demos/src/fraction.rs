//! Arbitrary-precision fractions used as demo payloads

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use thiserror::Error;

/// Errors raised by fraction construction and arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FractionError {
    /// A fraction with a zero denominator was requested, or a division by a
    /// zero fraction was attempted
    #[error("denominator must not be zero")]
    ZeroDenominator,
}

/// Exact rational number over arbitrary-precision integers.
///
/// Equality is structural: compare reduced forms when reduction matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigFraction {
    numer: BigInt,
    denom: BigInt,
}

impl BigFraction {
    /// Reduced fraction `numer/denom`.
    ///
    /// # Errors
    ///
    /// Fails when `denom` is zero.
    pub fn new(
        numer: impl Into<BigInt>,
        denom: impl Into<BigInt>,
    ) -> Result<Self, FractionError> {
        Self::new_unreduced(numer, denom).map(|fraction| fraction.reduce())
    }

    /// Fraction kept exactly as given, without reduction.
    ///
    /// # Errors
    ///
    /// Fails when `denom` is zero.
    pub fn new_unreduced(
        numer: impl Into<BigInt>,
        denom: impl Into<BigInt>,
    ) -> Result<Self, FractionError> {
        let denom = denom.into();
        if denom.is_zero() {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self {
            numer: numer.into(),
            denom,
        })
    }

    /// The zero fraction
    #[must_use]
    pub fn zero() -> Self {
        Self {
            numer: BigInt::zero(),
            denom: BigInt::one(),
        }
    }

    /// Whether this fraction equals zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.numer.is_zero()
    }

    /// Reduce by the gcd, normalizing any sign into the numerator
    #[must_use]
    pub fn reduce(&self) -> Self {
        let gcd = self.numer.gcd(&self.denom);
        let mut numer = &self.numer / &gcd;
        let mut denom = &self.denom / &gcd;
        if denom.is_negative() {
            numer = -numer;
            denom = -denom;
        }
        Self { numer, denom }
    }

    /// Reduced product of two fractions
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            numer: &self.numer * &other.numer,
            denom: &self.denom * &other.denom,
        }
        .reduce()
    }

    /// Reduced quotient of two fractions.
    ///
    /// # Errors
    ///
    /// Fails when `other` is zero: its reciprocal would carry a zero
    /// denominator.
    pub fn divide(&self, other: &Self) -> Result<Self, FractionError> {
        if other.is_zero() {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self {
            numer: &self.numer * &other.denom,
            denom: &self.denom * &other.numer,
        }
        .reduce())
    }

    /// Mixed-number rendering of the reduced fraction: `7/4` becomes
    /// `1 3/4`, whole numbers drop the fractional part entirely
    #[must_use]
    pub fn to_mixed_string(&self) -> String {
        let reduced = self.reduce();
        if reduced.denom.is_one() {
            return reduced.numer.to_string();
        }
        let whole = &reduced.numer / &reduced.denom;
        if whole.is_zero() {
            return format!("{}/{}", reduced.numer, reduced.denom);
        }
        let remainder = (&reduced.numer % &reduced.denom).abs();
        format!("{whole} {remainder}/{}", reduced.denom)
    }
}

impl fmt::Display for BigFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}
