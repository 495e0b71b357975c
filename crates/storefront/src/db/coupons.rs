//! Coupon lookups and usage counting.

use sqlx::PgConnection;

use patra_core::CouponId;

use super::RepositoryError;
use crate::models::CouponRow;

/// Find a coupon by code (case-insensitive). With `lock`, the row is held
/// `FOR UPDATE` until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_code(
    conn: &mut PgConnection,
    code: &str,
    lock: bool,
) -> Result<Option<CouponRow>, RepositoryError> {
    let lock_clause = if lock { "FOR UPDATE" } else { "" };
    let coupon = sqlx::query_as::<_, CouponRow>(&format!(
        r"
        SELECT id, code, coupon_type, value, minimum_order_amount, usage_limit,
               used_count, expires_at, is_active
        FROM shop.coupon
        WHERE code = upper($1)
        {lock_clause}
        "
    ))
    .bind(code.trim())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(coupon)
}

/// Count one use. Returns `false` if the usage limit was already reached.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn record_use(conn: &mut PgConnection, id: CouponId) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.coupon
        SET used_count = used_count + 1, updated_at = now()
        WHERE id = $1 AND (usage_limit IS NULL OR used_count < usage_limit)
        ",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Give back one use, e.g. when the order that consumed it is cancelled.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn release_use(conn: &mut PgConnection, id: CouponId) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.coupon
        SET used_count = GREATEST(used_count - 1, 0), updated_at = now()
        WHERE id = $1
        ",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
