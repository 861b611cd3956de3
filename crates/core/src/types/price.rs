//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are held as [`Decimal`] in dollars with two decimal places.
//! Arithmetic that can produce fractional cents (percentage discounts) rounds
//! half away from zero back to cents.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places stored for every amount.
const CENT_SCALE: u32 = 2;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below the minimum of one cent.
    #[error("price must be at least 0.01")]
    TooSmall,
    /// The amount exceeds the storable maximum.
    #[error("price must be at most {max}")]
    TooLarge {
        /// Maximum allowed amount.
        max: Decimal,
    },
    /// The amount has more than two decimal places.
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
    /// The input could not be parsed as a decimal number.
    #[error("price is not a valid number: {0}")]
    Invalid(String),
}

/// A monetary amount in the restaurant's currency.
///
/// Menu prices are validated through [`Price::new`]; computed amounts (line
/// totals, discounts, order totals) are produced by the arithmetic helpers and
/// may be zero.
///
/// ## Examples
///
/// ```
/// use dineease_core::Price;
///
/// let burger = Price::parse("5.00").unwrap();
/// assert_eq!(burger.times(2).to_string(), "$10.00");
/// assert_eq!(Price::parse("20.00").unwrap().percentage(10).to_string(), "$2.00");
/// assert!(Price::parse("0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount (`NUMERIC(10, 2)`).
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Create a menu price, validating it is a positive cent amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is below 0.01, above [`Price::MAX`], or
    /// has more than two decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::new(1, CENT_SCALE) {
            return Err(PriceError::TooSmall);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge { max: Self::MAX.0 });
        }
        if amount.normalize().scale() > CENT_SCALE {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self::from_decimal(amount))
    }

    /// Parse a menu price from user input such as `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the input is not a number, or any
    /// error from [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s
            .trim()
            .parse()
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// Create an amount from whole cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, CENT_SCALE))
    }

    /// Wrap a computed amount without validation, rounding to cents.
    ///
    /// Used for values read back from storage and for intermediate totals.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(CENT_SCALE);
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Line price: this unit price multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// `percent`% of this amount, rounded to cents.
    #[must_use]
    pub fn percentage(self, percent: u8) -> Self {
        Self::from_decimal(self.0 * Decimal::from(percent) / Decimal::ONE_HUNDRED)
    }

    /// Subtract `other`, clamping the result at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // NUMERIC(10, 2) columns are already cent-scaled
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!(Price::parse("5.00").unwrap(), Price::from_cents(500));
        assert_eq!(Price::parse(" 0.01 ").unwrap(), Price::from_cents(1));
        assert_eq!(Price::parse("12.5").unwrap(), Price::from_cents(1250));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert_eq!(Price::parse("0"), Err(PriceError::TooSmall));
        assert_eq!(Price::parse("-3.00"), Err(PriceError::TooSmall));
    }

    #[test]
    fn test_parse_rejects_sub_cent_precision() {
        assert_eq!(Price::parse("1.005"), Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_parse_rejects_too_large() {
        assert!(matches!(
            Price::parse("100000000.00"),
            Err(PriceError::TooLarge { .. })
        ));
        assert!(Price::parse("99999999.99").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::from_cents(500).times(2), Price::from_cents(1000).times(1)];
        let total: Price = lines.iter().sum();
        assert_eq!(total, Price::from_cents(2000));
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        assert_eq!(Price::from_cents(2000).percentage(10), Price::from_cents(200));
        // 15% of 0.99 = 0.1485 -> 0.15
        assert_eq!(Price::from_cents(99).percentage(15), Price::from_cents(15));
        // 10% of 0.05 = 0.005 -> 0.01 (half away from zero)
        assert_eq!(Price::from_cents(5).percentage(10), Price::from_cents(1));
    }

    #[test]
    fn test_saturating_sub_clamps_at_zero() {
        let a = Price::from_cents(300);
        assert_eq!(a.saturating_sub(Price::from_cents(100)), Price::from_cents(200));
        assert_eq!(a.saturating_sub(Price::from_cents(500)), Price::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(1800).to_string(), "$18.00");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_serde_uses_string_amount() {
        let json = serde_json::to_string(&Price::from_cents(1999)).unwrap();
        assert_eq!(json, "\"19.99\"");
        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Price::from_cents(1999));
    }
}
