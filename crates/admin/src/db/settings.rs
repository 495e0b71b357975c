//! Store settings repository.

use sqlx::PgPool;

use patra_core::UserId;

use super::RepositoryError;
use crate::models::Setting;

/// Repository for `shop.site_setting`.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every setting, by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<Setting>, RepositoryError> {
        let settings = sqlx::query_as::<_, Setting>(
            "SELECT key, value, updated_by, updated_at FROM shop.site_setting ORDER BY key",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(settings)
    }

    /// Insert or replace one setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        updated_by: UserId,
    ) -> Result<Setting, RepositoryError> {
        let setting = sqlx::query_as::<_, Setting>(
            r"
            INSERT INTO shop.site_setting (key, value, updated_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_by = EXCLUDED.updated_by, updated_at = now()
            RETURNING key, value, updated_by, updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(self.pool)
        .await?;
        Ok(setting)
    }
}
