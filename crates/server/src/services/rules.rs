//! Business and authorization rules shared by the route handlers.
//!
//! Every bound or ownership check that more than one endpoint cares about
//! lives here so the handlers only decide *when* to check, not *how*.

use thiserror::Error;

use aizome_core::{ListingStatus, OrderStatus, UserId};

pub const LISTING_PRICE_MIN: i64 = 1;
pub const LISTING_PRICE_MAX: i64 = 100_000;
pub const CART_QUANTITY_MIN: i32 = 1;
pub const CART_QUANTITY_MAX: i32 = 99;
pub const COMMENT_MAX_CHARS: usize = 1000;
pub const DISPLAY_NAME_MAX_CHARS: usize = 40;
pub const BIO_MAX_CHARS: usize = 280;
pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 24;
pub const TITLE_MAX_CHARS: usize = 80;

/// A violated business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("you do not have access to this resource")]
    NotOwner,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("username may only contain lowercase letters, digits and underscores")]
    UsernameCharset,

    #[error("cannot move from {from} to {to}")]
    IllegalTransition { from: String, to: String },
}

/// Fail with 403 unless `caller` owns the resource.
///
/// # Errors
///
/// Returns `RuleError::NotOwner` on mismatch.
pub fn ensure_owner(owner: UserId, caller: UserId) -> Result<(), RuleError> {
    if owner == caller {
        Ok(())
    } else {
        Err(RuleError::NotOwner)
    }
}

/// # Errors
///
/// Returns `RuleError::OutOfRange` unless `1 <= price <= 100_000`.
pub fn listing_price(price: i64) -> Result<i64, RuleError> {
    if price < LISTING_PRICE_MIN || price > LISTING_PRICE_MAX {
        return Err(RuleError::OutOfRange {
            field: "price",
            min: LISTING_PRICE_MIN,
            max: LISTING_PRICE_MAX,
        });
    }
    Ok(price)
}

/// # Errors
///
/// Returns `RuleError::OutOfRange` unless `1 <= quantity <= 99`.
pub fn cart_quantity(quantity: i32) -> Result<i32, RuleError> {
    if quantity < CART_QUANTITY_MIN || quantity > CART_QUANTITY_MAX {
        return Err(RuleError::OutOfRange {
            field: "quantity",
            min: i64::from(CART_QUANTITY_MIN),
            max: i64::from(CART_QUANTITY_MAX),
        });
    }
    Ok(quantity)
}

/// # Errors
///
/// Returns `RuleError::OutOfRange` unless `0 <= progress <= 100`.
pub fn course_progress(progress: i32) -> Result<i32, RuleError> {
    if progress < 0 || progress > 100 {
        return Err(RuleError::OutOfRange {
            field: "progress",
            min: 0,
            max: 100,
        });
    }
    Ok(progress)
}

/// Trimmed comment body of 1..=1000 characters.
///
/// # Errors
///
/// Returns `RuleError::Length` otherwise.
pub fn comment_body(body: &str) -> Result<String, RuleError> {
    bounded_text("body", body, 1, COMMENT_MAX_CHARS)
}

/// Trimmed title of 1..=80 characters.
///
/// # Errors
///
/// Returns `RuleError::Length` otherwise.
pub fn title(value: &str) -> Result<String, RuleError> {
    bounded_text("title", value, 1, TITLE_MAX_CHARS)
}

/// # Errors
///
/// Returns `RuleError::Length` if longer than 40 characters.
pub fn display_name(value: &str) -> Result<String, RuleError> {
    bounded_text("display_name", value, 0, DISPLAY_NAME_MAX_CHARS)
}

/// # Errors
///
/// Returns `RuleError::Length` if longer than 280 characters.
pub fn bio(value: &str) -> Result<String, RuleError> {
    bounded_text("bio", value, 0, BIO_MAX_CHARS)
}

/// Lower-cased username of 3..=24 characters from `[a-z0-9_]`.
///
/// # Errors
///
/// Returns `RuleError::Length` or `RuleError::UsernameCharset`.
pub fn username(value: &str) -> Result<String, RuleError> {
    let name = bounded_text("username", value, USERNAME_MIN_CHARS, USERNAME_MAX_CHARS)?
        .to_ascii_lowercase();
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(RuleError::UsernameCharset);
    }
    Ok(name)
}

/// Derive a default username from an email local part and a user id.
#[must_use]
pub fn default_username(email: Option<&str>, user: UserId) -> String {
    let local: String = email
        .and_then(|e| e.split('@').next())
        .unwrap_or_default()
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_').then_some(c)
        })
        .take(15)
        .collect();
    let tag: String = user.as_uuid().simple().to_string().chars().take(8).collect();
    if local.is_empty() {
        format!("dyer_{tag}")
    } else {
        format!("{local}_{tag}")
    }
}

/// # Errors
///
/// Returns `RuleError::IllegalTransition` unless the order may move to `next`.
pub fn order_transition(current: OrderStatus, next: OrderStatus) -> Result<(), RuleError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(RuleError::IllegalTransition {
            from: current.to_string(),
            to: next.to_string(),
        })
    }
}

/// # Errors
///
/// Returns `RuleError::IllegalTransition` unless the listing may move to `next`.
pub fn listing_transition(current: ListingStatus, next: ListingStatus) -> Result<(), RuleError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(RuleError::IllegalTransition {
            from: current.to_string(),
            to: next.to_string(),
        })
    }
}

/// Trimmed text of `min..=max` characters.
///
/// # Errors
///
/// Returns `RuleError::Length` otherwise.
pub fn bounded_text(field: &'static str, value: &str, min: usize, max: usize) -> Result<String, RuleError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(RuleError::Length { field, min, max });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_owner() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert!(ensure_owner(a, a).is_ok());
        assert_eq!(ensure_owner(a, b), Err(RuleError::NotOwner));
    }

    #[test]
    fn test_listing_price_bounds() {
        assert!(listing_price(0).is_err());
        assert!(listing_price(-5).is_err());
        assert_eq!(listing_price(1), Ok(1));
        assert_eq!(listing_price(100_000), Ok(100_000));
        assert!(listing_price(100_001).is_err());
    }

    #[test]
    fn test_cart_quantity_and_progress() {
        assert!(cart_quantity(0).is_err());
        assert!(cart_quantity(100).is_err());
        assert_eq!(cart_quantity(99), Ok(99));
        assert!(course_progress(-1).is_err());
        assert!(course_progress(101).is_err());
        assert_eq!(course_progress(100), Ok(100));
    }

    #[test]
    fn test_text_lengths_count_chars() {
        assert!(comment_body("   ").is_err());
        assert_eq!(comment_body("  藍染め  ").unwrap(), "藍染め");
        assert!(comment_body(&"x".repeat(1001)).is_err());
        assert!(display_name(&"藍".repeat(40)).is_ok());
        assert!(display_name(&"藍".repeat(41)).is_err());
        assert!(bio("").is_ok());
        assert!(bio(&"b".repeat(281)).is_err());
    }

    #[test]
    fn test_username() {
        assert_eq!(username("Indigo_Fan1").unwrap(), "indigo_fan1");
        assert!(matches!(username("ab"), Err(RuleError::Length { .. })));
        assert_eq!(username("no spaces"), Err(RuleError::UsernameCharset));
        assert_eq!(username("dash-name"), Err(RuleError::UsernameCharset));
    }

    #[test]
    fn test_default_username_is_valid() {
        let user = UserId::generate();
        let name = default_username(Some("Mei.Tanaka+shop@example.com"), user);
        assert!(name.starts_with("meitanakashop_"));
        assert!(username(&name).is_ok());

        let fallback = default_username(None, user);
        assert!(fallback.starts_with("dyer_"));
        assert!(username(&fallback).is_ok());
    }

    #[test]
    fn test_transitions() {
        assert!(order_transition(OrderStatus::Pending, OrderStatus::Paid).is_ok());
        let err = order_transition(OrderStatus::Completed, OrderStatus::Cancelled).unwrap_err();
        assert_eq!(err.to_string(), "cannot move from completed to cancelled");
        assert!(listing_transition(ListingStatus::Active, ListingStatus::Sold).is_ok());
        assert!(listing_transition(ListingStatus::Sold, ListingStatus::Withdrawn).is_err());
    }
}
