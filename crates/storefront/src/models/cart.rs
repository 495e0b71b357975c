//! Cart lines as shown to the shopper.

use rust_decimal::Decimal;
use serde::Serialize;

use patra_core::pricing::LineSnapshot;
use patra_core::{ProductId, ProductStatus};

/// A cart row joined with the product's current price and stock.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock_quantity: i32,
    pub status: ProductStatus,
    pub quantity: i32,
}

impl CartLine {
    #[must_use]
    pub fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            unit_price: self.price,
            quantity: self.quantity,
        }
    }
}

/// The whole cart with running totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: i64,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartLine>) -> Self {
        let snapshots: Vec<LineSnapshot> = items.iter().map(CartLine::snapshot).collect();
        let subtotal = patra_core::pricing::subtotal(&snapshots);
        let item_count = items.iter().map(|l| i64::from(l.quantity)).sum();
        Self {
            items,
            subtotal,
            item_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(price: &str, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(),
            product_name: "Copper Jug".to_owned(),
            price: Decimal::from_str(price).unwrap(),
            image: None,
            stock_quantity: 10,
            status: ProductStatus::Active,
            quantity,
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let view = CartView::new(vec![line("450", 2), line("99.50", 1)]);
        assert_eq!(view.subtotal, Decimal::from_str("999.50").unwrap());
        assert_eq!(view.item_count, 3);
    }

    #[test]
    fn test_empty_cart() {
        let view = CartView::new(Vec::new());
        assert_eq!(view.subtotal, Decimal::ZERO);
        assert_eq!(view.item_count, 0);
    }
}
