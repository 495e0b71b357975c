//! Orders, order lines and the coupon row read at checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;

use patra_core::pricing::CouponRule;
use patra_core::{
    CouponId, CouponType, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, ShippingAddress, UserId,
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

/// Order history row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A row of `shop.order_item`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
}

/// The coupon columns checkout needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CouponRow {
    pub id: CouponId,
    pub code: String,
    pub coupon_type: CouponType,
    pub value: Decimal,
    pub minimum_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CouponRow {
    #[must_use]
    pub fn rule(&self) -> CouponRule {
        CouponRule {
            coupon_type: self.coupon_type,
            value: self.value,
            minimum_order_amount: self.minimum_order_amount,
            usage_limit: self.usage_limit,
            used_count: self.used_count,
            expires_at: self.expires_at,
            is_active: self.is_active,
        }
    }
}
