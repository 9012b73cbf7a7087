//! Monetary amount pinned to two decimal places (cents).
//!
//! ACH amounts travel as unsigned minor units. In memory they are kept as a
//! `rust_decimal::Decimal` with scale 2 so callers can write `"123.45"` and
//! sum batches without floating-point drift.

use crate::error::FieldError;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A dollar amount with exactly two decimal places.
///
/// Negative values can be represented so that the encoder is able to
/// reject them with a proper [`FieldError::NegativeAmount`].
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use nacha_codec::Amount;
///
/// let amount = Amount::from_str("123.45").unwrap();
/// assert_eq!(amount.cents(), 12345);
/// assert_eq!(amount.to_string(), "123.45");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Number of decimal places carried.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Creates an `Amount` from a `Decimal`.
    ///
    /// Values carrying sub-cent precision are rejected rather than rounded.
    pub fn new(value: Decimal) -> std::result::Result<Self, FieldError> {
        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(FieldError::InvalidAmount(value.to_string()));
        }
        Ok(Amount::rescaled(normalized))
    }

    fn rescaled(mut value: Decimal) -> Self {
        value.rescale(Self::SCALE);
        Amount(value)
    }

    /// Creates an `Amount` from minor units, e.g. `12345` for `123.45`.
    pub fn from_cents(cents: i64) -> Self {
        Amount(Decimal::new(cents, Self::SCALE))
    }

    /// Returns the value in minor units.
    pub fn cents(&self) -> i128 {
        self.0.mantissa()
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl FromStr for Amount {
    type Err = FieldError;

    /// Parses a decimal string. More than two significant decimal places is
    /// rejected rather than rounded.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|_| FieldError::InvalidAmount(trimmed.to_string()))?;
        Amount::new(decimal).map_err(|_| FieldError::InvalidAmount(trimmed.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::rescaled(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}
