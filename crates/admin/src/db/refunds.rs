//! Refund rows.
//!
//! A refund is inserted as `pending` while the order row is locked, then
//! settled once the gateway has answered.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use patra_core::{OrderId, RefundId, UserId};

use super::RepositoryError;
use crate::models::Refund;

const REFUND_COLUMNS: &str =
    "id, order_id, amount, reason, status, razorpay_refund_id, processed_by, created_at";

/// Sum of refunds that have not failed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn committed_total(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Decimal, RepositoryError> {
    let total: Decimal = sqlx::query_scalar(
        r"
        SELECT COALESCE(SUM(amount), 0)
        FROM shop.refund
        WHERE order_id = $1 AND status <> 'failed'
        ",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}

/// Insert a pending refund.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    order_id: OrderId,
    amount: Decimal,
    reason: Option<&str>,
    processed_by: UserId,
) -> Result<Refund, RepositoryError> {
    let refund = sqlx::query_as::<_, Refund>(&format!(
        r"
        INSERT INTO shop.refund (order_id, amount, reason, processed_by)
        VALUES ($1, $2, $3, $4)
        RETURNING {REFUND_COLUMNS}
        "
    ))
    .bind(order_id)
    .bind(amount)
    .bind(reason)
    .bind(processed_by)
    .fetch_one(&mut *conn)
    .await?;
    Ok(refund)
}

/// Record the gateway's refund id and mark the refund processed.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the refund doesn't exist.
pub async fn mark_processed(
    conn: &mut PgConnection,
    id: RefundId,
    razorpay_refund_id: &str,
) -> Result<Refund, RepositoryError> {
    sqlx::query_as::<_, Refund>(&format!(
        r"
        UPDATE shop.refund
        SET status = 'processed', razorpay_refund_id = $2, updated_at = now()
        WHERE id = $1
        RETURNING {REFUND_COLUMNS}
        "
    ))
    .bind(id)
    .bind(razorpay_refund_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Mark a refund the gateway rejected.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_failed(pool: &PgPool, id: RefundId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.refund SET status = 'failed', updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Refunds of an order, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_order(
    pool: &PgPool,
    order_id: OrderId,
) -> Result<Vec<Refund>, RepositoryError> {
    let refunds = sqlx::query_as::<_, Refund>(&format!(
        "SELECT {REFUND_COLUMNS} FROM shop.refund WHERE order_id = $1 ORDER BY created_at"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(refunds)
}
