//! Rupee amounts using decimal arithmetic.
//!
//! The REST API sends prices and totals as JSON numbers in Sri Lankan rupees
//! (`LKR`). They are held as [`Decimal`] so cart totals never pick up binary
//! floating point drift.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Money`] amount from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
}

/// An amount of money in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Currency code shown next to every amount.
    pub const CURRENCY: &'static str = "LKR";

    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole-rupee amount.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// Parse an amount typed into an admin form (e.g. `"1250"` or `"1250.50"`).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Invalid`] for non-numeric input and
    /// [`MoneyError::Negative`] for amounts below zero.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim().replace(',', "");
        let amount: Decimal = trimmed
            .parse()
            .map_err(|_| MoneyError::Invalid(input.trim().to_string()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Amount formatted with thousands separators and two decimals, without
    /// the currency code (e.g. `1,250.00`).
    #[must_use]
    pub fn grouped(&self) -> String {
        let rounded = self.0.round_dp(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = format!("{:.2}", rounded.abs());
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (idx, ch) in whole.chars().enumerate() {
            if idx > 0 && (whole.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if negative {
            format!("-{grouped}.{fraction}")
        } else {
            format!("{grouped}.{fraction}")
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Self::CURRENCY, self.grouped())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

// The API speaks plain JSON numbers, so amounts go over the wire as f64 and
// are brought back into decimal space immediately.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(value) => Decimal::try_from(value)
                .map(|d| Self(d.round_dp(2)))
                .map_err(serde::de::Error::custom),
            Wire::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_rupees(1_250).to_string(), "LKR 1,250.00");
        assert_eq!(Money::from_rupees(1_234_567).to_string(), "LKR 1,234,567.00");
        assert_eq!(Money::from_rupees(950).to_string(), "LKR 950.00");
        assert_eq!(Money::ZERO.to_string(), "LKR 0.00");
    }

    #[test]
    fn test_parse_form_input() {
        assert_eq!(Money::parse(" 1,250.50 ").unwrap().grouped(), "1,250.50");
        assert_eq!(Money::parse("abc"), Err(MoneyError::Invalid("abc".to_string())));
        assert_eq!(Money::parse("-5"), Err(MoneyError::Negative));
    }

    #[test]
    fn test_json_numbers_round_trip_without_drift() {
        let money: Money = serde_json::from_str("450.1").unwrap();
        assert_eq!(money.amount(), Decimal::new(45010, 2));
        assert_eq!(serde_json::to_string(&money).unwrap(), "450.1");
    }

    #[test]
    fn test_multiplication_and_sum() {
        let lines = [Money::from_rupees(450) * 2, Money::parse("99.50").unwrap() * 3];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total.grouped(), "1,198.50");
    }
}
