//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A unit price in the store currency.
///
/// Serialized as a bare decimal. Deserialization accepts JSON numbers and
/// numeric strings, since the API is not consistent about which it sends,
/// and rejects negative amounts.
///
/// Arithmetic saturates at [`Decimal::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Parse a price from user input such as `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` for non-numeric input and
    /// `PriceError::Negative` for negative amounts.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PriceError::Invalid(s.to_string()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(Decimal::ZERO, |total, p| {
            total.checked_add(p.0).unwrap_or(Decimal::MAX)
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(1250).times(2), Price::from_cents(99).times(3)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::parse("27.97").unwrap());
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::parse("5").unwrap().to_string(), "$5.00");
        assert_eq!(Price::from_cents(1999).to_string(), "$19.99");
    }

    #[test]
    fn test_rejects_negative_and_garbage() {
        assert!(matches!(Price::parse("-1"), Err(PriceError::Negative(_))));
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-3.50").is_err());
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
        assert_eq!(serde_json::from_str::<Price>("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Price::new(Decimal::MAX).unwrap();
        assert_eq!(huge.times(3).amount(), Decimal::MAX);

        let total: Price = [huge, Price::from_cents(100)].into_iter().sum();
        assert_eq!(total.amount(), Decimal::MAX);
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let a: Price = serde_json::from_str("19.99").unwrap();
        let b: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(a, b);
    }
}
