//! Product price using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(18, 2)`, so values are rounded to cents on
//! construction and must stay strictly positive after rounding.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Zero or negative amount.
    #[error("price must be greater than 0")]
    NotPositive,
    /// Amount exceeds what the database column can hold.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A strictly positive price with two decimal places.
///
/// Serializes as a JSON number (the browser client does arithmetic on it) and
/// re-validates on deserialization.
///
/// ```
/// use catalog_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(129_999, 2)).unwrap();
/// assert_eq!(price.to_string(), "1299.99");
///
/// assert!(Price::new(Decimal::ZERO).is_err());
/// assert!(Price::new(Decimal::new(1, 3)).is_err()); // 0.001 rounds to 0.00
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Number of decimal places kept.
    pub const SCALE: u32 = 2;

    /// Construct a price, rounding half-away-from-zero to cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotPositive` if the rounded amount is zero or
    /// negative, `PriceError::TooLarge` if it does not fit `NUMERIC(18, 2)`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let rounded =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);

        if rounded <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }

        let max = Self::max();
        if rounded >= max {
            return Err(PriceError::TooLarge { max });
        }

        Ok(Self(rounded))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// 10^16, the exclusive bound of `NUMERIC(18, 2)`.
    fn max() -> Decimal {
        Decimal::from(10_000_000_000_000_000_i64)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

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
        Ok(Self::new(amount)?)
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
    fn test_rounds_to_cents() {
        let price = Price::new(Decimal::new(19_995, 3)).unwrap();
        assert_eq!(price.amount(), Decimal::new(2000, 2));
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Price::new(Decimal::ZERO), Err(PriceError::NotPositive));
        assert_eq!(Price::new(Decimal::new(-1, 0)), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_rejects_amount_that_rounds_to_zero() {
        assert_eq!(Price::new(Decimal::new(4, 3)), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_rejects_overflowing_amount() {
        let huge = Decimal::from(10_000_000_000_000_000_i64);
        assert!(matches!(Price::new(huge), Err(PriceError::TooLarge { .. })));
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::new(Decimal::new(89_999, 2)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "899.99");
    }

    #[test]
    fn test_deserializes_from_number() {
        let price: Price = serde_json::from_str("199.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(19_999, 2));
    }

    #[test]
    fn test_deserialize_rejects_non_positive() {
        assert!(serde_json::from_str::<Price>("0").is_err());
        assert!(serde_json::from_str::<Price>("-5.5").is_err());
    }
}
