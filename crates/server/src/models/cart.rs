//! Shopping cart lines.

use serde::Serialize;

use aizome_core::{CartItemId, Price, ProductId, ProductStatus};

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub stock: i32,
    pub status: ProductStatus,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Line can still be checked out.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active && self.stock >= self.quantity
    }
}

/// One line of the cart response.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Price,
    pub available: bool,
}

/// The caller's cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal: Price,
    pub subtotal_display: String,
}

impl CartView {
    #[must_use]
    pub fn new(lines: Vec<CartLine>) -> Self {
        let subtotal: Price = lines
            .iter()
            .filter(|l| l.is_available())
            .map(CartLine::line_total)
            .sum();
        let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let items = lines
            .into_iter()
            .map(|line| CartLineView {
                line_total: line.line_total(),
                available: line.is_available(),
                line,
            })
            .collect();
        Self {
            items,
            item_count,
            subtotal,
            subtotal_display: subtotal.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, quantity: i32, stock: i32, status: ProductStatus) -> CartLine {
        CartLine {
            id: CartItemId::generate(),
            product_id: ProductId::generate(),
            quantity,
            name: "Indigo furoshiki".into(),
            price: Price::from_cents(price_cents),
            image_url: None,
            stock,
            status,
        }
    }

    #[test]
    fn test_subtotal_skips_unavailable_lines() {
        let view = CartView::new(vec![
            line(1250, 2, 10, ProductStatus::Active),
            line(999, 1, 0, ProductStatus::Active),
            line(500, 1, 5, ProductStatus::Inactive),
        ]);
        assert_eq!(view.subtotal, Price::from_cents(2500));
        assert_eq!(view.item_count, 4);
        assert_eq!(view.subtotal_display, "¥25.00");
        assert!(view.items[0].available);
        assert!(!view.items[1].available);
        assert!(!view.items[2].available);
    }
}
