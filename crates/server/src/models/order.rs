//! Orders, order lines and coupons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use aizome_core::{CouponKind, OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use crate::services::rules::{self, RuleError};

/// A `coupons` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
    pub value: Price,
    pub min_spend: Price,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Delivery address captured with the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl ShippingAddress {
    /// Trim and bound every field.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::Length` for an empty or oversized field.
    pub fn normalized(&self) -> Result<Self, RuleError> {
        Ok(Self {
            recipient: rules::bounded_text("recipient", &self.recipient, 1, 40)?,
            phone: rules::bounded_text("phone", &self.phone, 5, 20)?,
            address: rules::bounded_text("address", &self.address, 1, 200)?,
            postal_code: self
                .postal_code
                .as_deref()
                .map(|p| rules::bounded_text("postal_code", p, 1, 12))
                .transpose()?,
        })
    }
}

/// An `orders` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_no: String,
    pub status: OrderStatus,
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
    pub coupon_code: Option<String>,
    pub shipping_address: Json<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An `order_items` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: i32,
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_address_normalized() {
        let raw = ShippingAddress {
            recipient: "  Mei Tanaka ".into(),
            phone: "13800000000".into(),
            address: "1 Indigo Lane".into(),
            postal_code: Some(" 100000 ".into()),
        };
        let clean = raw.normalized().unwrap();
        assert_eq!(clean.recipient, "Mei Tanaka");
        assert_eq!(clean.postal_code.as_deref(), Some("100000"));

        let missing = ShippingAddress {
            recipient: String::new(),
            ..raw
        };
        assert!(missing.normalized().is_err());
    }
}
