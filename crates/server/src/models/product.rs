//! Storefront products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aizome_core::{Price, ProductId, ProductStatus};

use crate::services::pricing;

/// A `products` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub image_url: Option<String>,
    pub stock: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product can be put in a cart or order.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active && self.stock > 0
    }
}

/// A product with its display fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub price_display: String,
    pub discount_label: Option<String>,
    pub favorited: Option<bool>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let discount_label = product
            .original_price
            .and_then(|original| pricing::percent_off_label(original, product.price));
        Self {
            price_display: product.price.display(),
            discount_label,
            favorited: None,
            product,
        }
    }
}
