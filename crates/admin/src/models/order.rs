//! Orders and refunds as the back-office sees them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use patra_core::{
    CouponId, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    RefundId, RefundStatus, ShippingAddress, UserId,
};

/// A row of `shop.orders`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: Json<ShippingAddress>,
    pub subtotal_amount: Decimal,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub coupon_id: Option<CouponId>,
    pub notes: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order list row with the customer's contact.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminOrder {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the order list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

/// A row of `shop.order_item`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
}

/// A row of `shop.refund`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub status: RefundStatus,
    pub razorpay_refund_id: Option<String>,
    pub processed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
