//! Wishlist repository.

use sqlx::{PgConnection, PgPool};

use patra_core::{ProductId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::WishlistLine;

/// Repository for wishlist rows.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Wishlist lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, WishlistLine>(
            r"
            SELECT w.product_id, p.name, p.price, p.compare_price, p.images[1] AS image,
                   p.stock_quantity, p.status, w.created_at AS added_at
            FROM shop.wishlist_item w
            JOIN shop.product p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if it is already in the wishlist.
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.wishlist_item (user_id, product_id)
            VALUES ($1, $2)
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            conflict_on_unique(e, "Product is already in wishlist")
        })?;
        Ok(())
    }

    /// Remove a product. Returns whether it was present.
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
        remove(&mut conn, user_id, product_id).await
    }
}

/// Remove a product inside a caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn remove(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
) -> Result<bool, RepositoryError> {
    let result =
        sqlx::query("DELETE FROM shop.wishlist_item WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected() > 0)
}
