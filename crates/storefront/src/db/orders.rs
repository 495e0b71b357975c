//! Order repository.
//!
//! Checkout writes run inside one transaction owned by the checkout
//! service, so the write helpers take a connection rather than the pool.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use patra_core::pricing::{LineSnapshot, OrderTotals};
use patra_core::{
    CouponId, OrderId, OrderStatus, PaymentMethod, ProductId, ShippingAddress, UserId,
};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Order, OrderItem, OrderSummary};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, payment_status, payment_method, \
                             shipping_address, subtotal_amount, discount_amount, shipping_amount, \
                             tax_amount, total_amount, coupon_id, notes, razorpay_order_id, \
                             razorpay_payment_id, created_at, updated_at";

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: &'a ShippingAddress,
    pub totals: OrderTotals,
    pub coupon_id: Option<CouponId>,
    pub notes: Option<&'a str>,
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.order_number, o.status, o.payment_status, o.total_amount,
                   (SELECT COUNT(*) FROM shop.order_item oi WHERE oi.order_id = o.id) AS item_count,
                   o.created_at
            FROM shop.orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// One order, only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_for_user(&mut conn, user_id, id, false).await
    }

    /// Lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        items(&mut conn, order_id).await
    }

    /// Record the gateway's order id on a pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is no longer pending.
    pub async fn set_gateway_order_id(
        &self,
        id: OrderId,
        gateway_order_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.orders
            SET razorpay_order_id = $2, updated_at = now()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id)
        .bind(gateway_order_id)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "gateway order id already used"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flag a pending payment as failed. Confirmed orders are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_payment_failed(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.orders
            SET payment_status = 'failed', updated_at = now()
            WHERE id = $1 AND user_id = $2 AND status = 'pending' AND payment_status = 'pending'
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// Fetch an order owned by `user_id`, optionally locking it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
    id: OrderId,
    lock: bool,
) -> Result<Option<Order>, RepositoryError> {
    let lock_clause = if lock { "FOR UPDATE" } else { "" };
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1 AND user_id = $2 {lock_clause}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(order)
}

/// Lines of an order, in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(
        r"
        SELECT id, order_id, product_id, product_name, quantity, price, total_price
        FROM shop.order_item
        WHERE order_id = $1
        ORDER BY created_at, id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Insert the order row.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on an order-number collision.
pub async fn insert(conn: &mut PgConnection, order: &NewOrder<'_>) -> Result<Order, RepositoryError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO shop.orders
            (order_number, user_id, status, payment_status, payment_method, shipping_address,
             subtotal_amount, discount_amount, shipping_amount, tax_amount, total_amount,
             coupon_id, notes)
        VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order.order_number)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(Json(order.shipping_address))
    .bind(order.totals.subtotal)
    .bind(order.totals.discount)
    .bind(order.totals.shipping)
    .bind(order.totals.tax)
    .bind(order.totals.total)
    .bind(order.coupon_id)
    .bind(order.notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| conflict_on_unique(e, "order number collision"))
}

/// Insert one order line with its price snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    line: &LineSnapshot,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_item (order_id, product_id, product_name, quantity, price, total_price)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(&line.product_name)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.line_total())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Take `quantity` units out of stock. Returns `false` if stock is short.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.product
        SET stock_quantity = stock_quantity - $2, updated_at = now()
        WHERE id = $1 AND stock_quantity >= $2
        ",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Confirm a paid order exactly once.
///
/// Only a `pending` order whose stored gateway order id matches and whose
/// payment has not completed is updated; a failed attempt may be retried.
/// Returns the updated order, or `None` if nothing changed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn confirm_payment(
    conn: &mut PgConnection,
    id: OrderId,
    gateway_order_id: &str,
    gateway_payment_id: &str,
) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r"
        UPDATE shop.orders
        SET status = 'confirmed',
            payment_status = 'completed',
            razorpay_payment_id = $3,
            updated_at = now()
        WHERE id = $1
          AND razorpay_order_id = $2
          AND status = 'pending'
          AND payment_status IN ('pending', 'failed')
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(gateway_order_id)
    .bind(gateway_payment_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(order)
}

/// Cancel an order whose gateway handoff never happened.
///
/// Returns `false` if the order had already moved on.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn cancel_unpaid(conn: &mut PgConnection, id: OrderId) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.orders
        SET status = 'cancelled', payment_status = 'failed', updated_at = now()
        WHERE id = $1 AND status = 'pending' AND razorpay_order_id IS NULL
        ",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// A shopper's Razorpay orders still waiting for payment, locked.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_unpaid_gateway_orders(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<Order>, RepositoryError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        r"
        SELECT {ORDER_COLUMNS}
        FROM shop.orders
        WHERE user_id = $1
          AND status = 'pending'
          AND payment_method = 'razorpay'
          AND payment_status IN ('pending', 'failed')
        ORDER BY id
        FOR UPDATE
        "
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(orders)
}

/// Cancel a pending order that was never paid, whether or not the widget
/// was opened. Returns `false` if the order had already moved on.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn cancel_abandoned(conn: &mut PgConnection, id: OrderId) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.orders
        SET status = 'cancelled', payment_status = 'failed', updated_at = now()
        WHERE id = $1 AND status = 'pending' AND payment_status IN ('pending', 'failed')
        ",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Lock every product row referenced by `order_ids`, in product id order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_order_products(
    conn: &mut PgConnection,
    order_ids: &[OrderId],
) -> Result<(), RepositoryError> {
    let ids: Vec<Uuid> = order_ids.iter().map(OrderId::as_uuid).collect();
    sqlx::query(
        r"
        SELECT p.id
        FROM shop.product p
        WHERE p.id IN (SELECT product_id FROM shop.order_item WHERE order_id = ANY($1))
        ORDER BY p.id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Put an order's quantities back into stock.
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
