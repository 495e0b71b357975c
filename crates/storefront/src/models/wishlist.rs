//! Wishlist lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use patra_core::{ProductId, ProductStatus};

/// A wishlist row joined with a product summary.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub image: Option<String>,
    pub stock_quantity: i32,
    pub status: ProductStatus,
    pub added_at: DateTime<Utc>,
}
