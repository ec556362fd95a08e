//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty or whitespace.
    #[error("price is required")]
    Missing,
    /// The input is not a decimal number.
    #[error("\"{0}\" is not a number")]
    NotNumeric(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount is below the required minimum.
    #[error("price must be at least {0}")]
    BelowMinimum(Decimal),
}

/// A non-negative amount in the store currency, kept at two decimal places.
///
/// ```
/// use shopwright_core::Price;
///
/// let price = Price::parse("19.999").unwrap();
/// assert_eq!(price.to_string(), "20.00");
///
/// assert!(Price::parse("abc").is_err());
/// assert!(Price::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// Parse a price from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not numeric, or negative.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Missing);
        }
        let amount = Decimal::from_str(trimmed)
            .map_err(|_| PriceError::NotNumeric(trimmed.to_owned()))?;
        Self::new(amount)
    }

    /// Parse a price that must be at least `min`.
    ///
    /// The bound is checked against the amount as entered, before rounding,
    /// so `0.995` is below a minimum of 1.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::BelowMinimum`] if the entered amount is below
    /// `min`, or any error from [`Price::parse`].
    pub fn parse_at_least(input: &str, min: Decimal) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Missing);
        }
        let amount = Decimal::from_str(trimmed)
            .map_err(|_| PriceError::NotNumeric(trimmed.to_owned()))?;
        if amount < min {
            return Err(PriceError::BelowMinimum(min));
        }
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
