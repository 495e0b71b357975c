//! Dashboard aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use patra_core::{OrderId, OrderStatus, PaymentStatus, ProductId, ProductStatus};

/// Store-wide counters and the latest activity.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_orders: i64,
    pub total_products: i64,
    /// Sum of `total_amount` over orders with a completed payment.
    pub total_revenue: Decimal,
    pub pending_orders: i64,
    pub recent_orders: Vec<RecentOrder>,
    pub recent_products: Vec<RecentProduct>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentOrder {
    pub id: OrderId,
    pub order_number: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}
