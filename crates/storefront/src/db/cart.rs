//! Cart repository.
//!
//! Reads go through [`CartRepository`]. The stock-checked writes are free
//! functions over a connection so the cart service and wishlist move can run
//! them inside their own transactions.

use sqlx::{PgConnection, PgPool};

use patra_core::{ProductId, ProductStatus, UserId};

use super::RepositoryError;
use crate::models::CartLine;

/// Stock and visibility of a product, read under a row lock.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ProductStock {
    pub stock_quantity: i32,
    pub status: ProductStatus,
}

/// Repository for cart reads and simple deletes.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Cart lines with current product data, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        list_lines(&mut conn, user_id, false).await
    }

    /// Total quantity across all lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::bigint FROM shop.cart_item WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Remove one line. Returns whether a line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        delete_line(&mut conn, user_id, product_id).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear(&mut conn, user_id).await
    }
}

/// Cart lines joined with products, oldest first.
///
/// With `lock`, the cart's product rows are first locked `FOR UPDATE` in
/// product id order, so stock cannot change until the transaction ends and
/// two checkouts over the same products queue instead of deadlocking.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_lines(
    conn: &mut PgConnection,
    user_id: UserId,
    lock: bool,
) -> Result<Vec<CartLine>, RepositoryError> {
    if lock {
        sqlx::query(
            r"
            SELECT p.id
            FROM shop.product p
            WHERE p.id IN (SELECT product_id FROM shop.cart_item WHERE user_id = $1)
            ORDER BY p.id
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    let lines = sqlx::query_as::<_, CartLine>(
        r"
        SELECT ci.product_id, p.name AS product_name, p.price, p.images[1] AS image,
               p.stock_quantity, p.status, ci.quantity
        FROM shop.cart_item ci
        JOIN shop.product p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at, ci.id
        ",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

/// Lock a product row and read its stock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_product_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Option<ProductStock>, RepositoryError> {
    let stock = sqlx::query_as::<_, ProductStock>(
        "SELECT stock_quantity, status FROM shop.product WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(stock)
}

/// Current quantity of a product in the cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn quantity_of(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
) -> Result<Option<i32>, RepositoryError> {
    let quantity = sqlx::query_scalar(
        "SELECT quantity FROM shop.cart_item WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(quantity)
}

/// Set a line's quantity, inserting the line if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.cart_item (user_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = now()
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete one line. Returns whether a line existed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_line(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every line for a user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear(conn: &mut PgConnection, user_id: UserId) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM shop.cart_item WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
