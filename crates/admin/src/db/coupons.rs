//! Coupon repository.

use sqlx::PgPool;

use patra_core::CouponId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Coupon, CouponInput};

const COUPON_COLUMNS: &str = "id, code, coupon_type, value, minimum_order_amount, usage_limit, \
                              used_count, expires_at, is_active, created_at";

const CODE_TAKEN: &str = "A coupon with this code already exists";

/// Repository for coupon management.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every coupon, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupon ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(coupons)
    }

    /// Create a coupon. The code must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            r"
            INSERT INTO shop.coupon
                (code, coupon_type, value, minimum_order_amount, usage_limit, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(&input.code)
        .bind(input.coupon_type)
        .bind(input.value)
        .bind(input.minimum_order_amount)
        .bind(input.usage_limit)
        .bind(input.expires_at)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, CODE_TAKEN))
    }

    /// Replace a coupon's fields. The usage counter is left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist and
    /// `RepositoryError::Conflict` if the new code is taken.
    pub async fn update(
        &self,
        id: CouponId,
        input: &CouponInput,
    ) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            r"
            UPDATE shop.coupon
            SET code = $2, coupon_type = $3, value = $4, minimum_order_amount = $5,
                usage_limit = $6, expires_at = $7, is_active = $8, updated_at = now()
            WHERE id = $1
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.code)
        .bind(input.coupon_type)
        .bind(input.value)
        .bind(input.minimum_order_amount)
        .bind(input.usage_limit)
        .bind(input.expires_at)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, CODE_TAKEN))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a coupon. Orders that used it keep their discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.coupon WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
