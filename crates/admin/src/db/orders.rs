//! Order repository for the back-office.
//!
//! Reads go through [`OrderRepository`]. Status changes run inside a
//! transaction, so those are free functions over a `PgConnection`.

use sqlx::{PgConnection, PgPool};

use patra_core::{CouponId, OrderId, OrderStatus, PaymentStatus};

use super::RepositoryError;
use crate::models::{AdminOrder, Order, OrderItem, OrderListQuery};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, payment_status, payment_method, \
                             shipping_address, subtotal_amount, discount_amount, shipping_amount, \
                             tax_amount, total_amount, coupon_id, notes, razorpay_order_id, \
                             razorpay_payment_id, created_at, updated_at";

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders with customer and line count, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &OrderListQuery) -> Result<Vec<AdminOrder>, RepositoryError> {
        let orders = sqlx::query_as::<_, AdminOrder>(
            r"
            SELECT o.id, o.order_number, o.user_id, p.email AS customer_email,
                   p.full_name AS customer_name, o.status, o.payment_status, o.payment_method,
                   o.total_amount,
                   (SELECT COUNT(*) FROM shop.order_item oi WHERE oi.order_id = o.id) AS item_count,
                   o.created_at
            FROM shop.orders o
            JOIN shop.profile p ON p.id = o.user_id
            WHERE ($1::shop.order_status IS NULL OR o.status = $1)
            ORDER BY o.created_at DESC
            ",
        )
        .bind(query.status)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, product_name, quantity, price, total_price
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }
}

/// Load an order and lock its row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(order)
}

/// Set the fulfilment status and, optionally, the payment status.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
    payment_status: Option<PaymentStatus>,
) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        UPDATE shop.orders
        SET status = $2, payment_status = COALESCE($3, payment_status), updated_at = now()
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status)
    .bind(payment_status)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Put an order's quantities back on the shelf.
///
/// Lines whose product was deleted are skipped.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn restock(conn: &mut PgConnection, order_id: OrderId) -> Result<u64, RepositoryError> {
    // Lock in id order, the same order checkout uses.
    sqlx::query(
        r"
        SELECT p.id
        FROM shop.product p
        WHERE p.id IN (SELECT product_id FROM shop.order_item WHERE order_id = $1)
        ORDER BY p.id
        FOR UPDATE
        ",
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query(
        r"
        UPDATE shop.product p
        SET stock_quantity = p.stock_quantity + oi.quantity, updated_at = now()
        FROM shop.order_item oi
        WHERE oi.order_id = $1 AND oi.product_id = p.id
        ",
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Give back the coupon use an order consumed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn release_coupon(
    conn: &mut PgConnection,
    coupon_id: CouponId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.coupon
        SET used_count = GREATEST(used_count - 1, 0), updated_at = now()
        WHERE id = $1
        ",
    )
    .bind(coupon_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
