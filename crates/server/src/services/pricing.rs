//! Coupon and discount math for storefront orders.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use aizome_core::{CouponKind, Price};

use crate::models::Coupon;

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("coupon {0} is not active")]
    Inactive(String),

    #[error("coupon {0} has expired")]
    Expired(String),

    #[error("coupon {code} requires a minimum spend of {min_spend}")]
    BelowMinimum { code: String, min_spend: Price },

    #[error("coupon {0} is misconfigured")]
    InvalidValue(String),
}

/// Totals for a subtotal with an optional coupon applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

impl Quote {
    /// Totals without a coupon.
    #[must_use]
    pub const fn plain(subtotal: Price) -> Self {
        Self {
            subtotal,
            discount: Price::ZERO,
            total: subtotal,
            coupon_code: None,
        }
    }
}

/// Apply `coupon` to `subtotal` as of `now`.
///
/// # Errors
///
/// Returns `PricingError` if the coupon is inactive, expired, below its
/// minimum spend, or has a value outside its kind's range.
pub fn quote(coupon: &Coupon, subtotal: Price, now: DateTime<Utc>) -> Result<Quote, PricingError> {
    if !coupon.active {
        return Err(PricingError::Inactive(coupon.code.clone()));
    }
    if let Some(expires_at) = coupon.expires_at
        && expires_at <= now
    {
        return Err(PricingError::Expired(coupon.code.clone()));
    }
    if subtotal < coupon.min_spend {
        return Err(PricingError::BelowMinimum {
            code: coupon.code.clone(),
            min_spend: coupon.min_spend,
        });
    }

    let discount = match coupon.kind {
        CouponKind::Percent => {
            let pct = coupon.value.amount();
            if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(PricingError::InvalidValue(coupon.code.clone()));
            }
            Price::new(subtotal.amount() * pct / Decimal::ONE_HUNDRED)
        }
        CouponKind::Fixed => {
            if !coupon.value.is_positive() {
                return Err(PricingError::InvalidValue(coupon.code.clone()));
            }
            coupon.value.min(subtotal)
        }
    };

    Ok(Quote {
        subtotal,
        discount,
        total: subtotal.saturating_sub(discount),
        coupon_code: Some(coupon.code.clone()),
    })
}

/// Percentage saved relative to `original`, when there is a real markdown.
#[must_use]
pub fn percent_off(original: Price, price: Price) -> Option<u32> {
    if !price.is_positive() || original <= price {
        return None;
    }
    let saved = (Decimal::ONE - price.amount() / original.amount()) * Decimal::ONE_HUNDRED;
    let rounded = saved.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_u32().filter(|n| *n > 0)
}

/// Display label such as `"25% off"`.
#[must_use]
pub fn percent_off_label(original: Price, price: Price) -> Option<String> {
    percent_off(original, price).map(|n| format!("{n}% off"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(kind: CouponKind, value_cents: i64, min_spend_cents: i64) -> Coupon {
        Coupon {
            code: "INDIGO".to_string(),
            kind,
            value: Price::from_cents(value_cents),
            min_spend: Price::from_cents(min_spend_cents),
            active: true,
            expires_at: None,
        }
    }

    #[test]
    fn test_percent_coupon_rounds_half_away() {
        // 10% of 33.35 = 3.335 -> 3.34
        let q = quote(&coupon(CouponKind::Percent, 1000, 0), Price::from_cents(3335), Utc::now()).unwrap();
        assert_eq!(q.discount, Price::from_cents(334));
        assert_eq!(q.total, Price::from_cents(3001));
        assert_eq!(q.coupon_code.as_deref(), Some("INDIGO"));
    }

    #[test]
    fn test_fixed_coupon_caps_at_subtotal() {
        let q = quote(&coupon(CouponKind::Fixed, 5000, 0), Price::from_cents(3000), Utc::now()).unwrap();
        assert_eq!(q.discount, Price::from_cents(3000));
        assert_eq!(q.total, Price::ZERO);
    }

    #[test]
    fn test_min_spend_inactive_and_expired() {
        let now = Utc::now();
        let c = coupon(CouponKind::Fixed, 500, 10000);
        assert!(matches!(
            quote(&c, Price::from_cents(9999), now),
            Err(PricingError::BelowMinimum { .. })
        ));
        assert!(quote(&c, Price::from_cents(10000), now).is_ok());

        let mut inactive = coupon(CouponKind::Fixed, 500, 0);
        inactive.active = false;
        assert_eq!(
            quote(&inactive, Price::from_cents(100), now),
            Err(PricingError::Inactive("INDIGO".into()))
        );

        let mut expired = coupon(CouponKind::Fixed, 500, 0);
        expired.expires_at = Some(now - Duration::minutes(1));
        assert_eq!(
            quote(&expired, Price::from_cents(100), now),
            Err(PricingError::Expired("INDIGO".into()))
        );
    }

    #[test]
    fn test_percent_over_hundred_is_invalid() {
        let c = coupon(CouponKind::Percent, 15000, 0);
        assert!(matches!(
            quote(&c, Price::from_cents(100), Utc::now()),
            Err(PricingError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_percent_off() {
        assert_eq!(percent_off(Price::from_cents(10000), Price::from_cents(7500)), Some(25));
        assert_eq!(percent_off(Price::from_cents(3000), Price::from_cents(2000)), Some(33));
        assert_eq!(percent_off(Price::from_cents(1000), Price::from_cents(1000)), None);
        assert_eq!(percent_off(Price::from_cents(1000), Price::ZERO), None);
        assert_eq!(
            percent_off_label(Price::from_cents(10000), Price::from_cents(7500)).as_deref(),
            Some("25% off")
        );
    }
}
