//! Money amounts for the storefront, using decimal arithmetic.
//!
//! Store prices are denominated in yuan (CNY) with two decimal places. The
//! in-game economy uses whole coins (`i64`) and never goes through this type.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A non-negative storefront price in yuan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero yuan.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rounded to cents (midpoint away from zero).
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Create a price from an integer number of cents (fen).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The decimal amount in yuan.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if the price is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: i32) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }

    /// Subtract, clamping at zero.
    #[must_use]
    pub fn saturating_sub(&self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Format for display, e.g. `¥12.50`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("¥{:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
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
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(1250).display(), "¥12.50");
        assert_eq!(Price::ZERO.to_string(), "¥0.00");
    }

    #[test]
    fn test_new_rounds_to_cents() {
        assert_eq!(Price::new(Decimal::new(10005, 3)), Price::from_cents(1001));
        assert_eq!(Price::new(Decimal::new(10004, 3)), Price::from_cents(1000));
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::from_cents(1999).times(2), Price::from_cents(501).times(1)];
        let total: Price = lines.into_iter().sum();
        assert_eq!(total, Price::from_cents(4499));
    }

    #[test]
    fn test_saturating_sub() {
        let a = Price::from_cents(1000);
        assert_eq!(a.saturating_sub(Price::from_cents(300)), Price::from_cents(700));
        assert_eq!(a.saturating_sub(Price::from_cents(3000)), Price::ZERO);
    }
}
