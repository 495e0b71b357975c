//! Dashboard aggregates.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{DashboardStats, RecentOrder, RecentProduct};

/// How many recent orders and products the dashboard shows.
pub const RECENT_LIMIT: i64 = 5;

/// Counters, revenue and the latest orders and products.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn stats(pool: &PgPool) -> Result<DashboardStats, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct Counters {
        total_users: i64,
        total_orders: i64,
        total_products: i64,
        total_revenue: Decimal,
        pending_orders: i64,
    }

    let counters = sqlx::query_as::<_, Counters>(
        r"
        SELECT
            (SELECT COUNT(*) FROM shop.profile) AS total_users,
            (SELECT COUNT(*) FROM shop.orders) AS total_orders,
            (SELECT COUNT(*) FROM shop.product) AS total_products,
            (SELECT COALESCE(SUM(total_amount), 0) FROM shop.orders
             WHERE payment_status = 'completed') AS total_revenue,
            (SELECT COUNT(*) FROM shop.orders WHERE status = 'pending') AS pending_orders
        ",
    )
    .fetch_one(pool)
    .await?;

    let recent_orders = sqlx::query_as::<_, RecentOrder>(
        r"
        SELECT o.id, o.order_number, p.email AS customer_email, o.status, o.payment_status,
               o.total_amount, o.created_at
        FROM shop.orders o
        JOIN shop.profile p ON p.id = o.user_id
        ORDER BY o.created_at DESC
        LIMIT $1
        ",
    )
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    let recent_products = sqlx::query_as::<_, RecentProduct>(
        r"
        SELECT id, name, price, stock_quantity, status, created_at
        FROM shop.product
        ORDER BY created_at DESC
        LIMIT $1
        ",
    )
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        total_users: counters.total_users,
        total_orders: counters.total_orders,
        total_products: counters.total_products,
        total_revenue: counters.total_revenue,
        pending_orders: counters.pending_orders,
        recent_orders,
        recent_products,
    })
}
