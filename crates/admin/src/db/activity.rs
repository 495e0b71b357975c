//! Activity log repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{ActivityEntry, NewActivity};

/// How many entries the activity feed returns.
pub const FEED_LIMIT: i64 = 100;

/// Repository for the back-office audit trail.
pub struct ActivityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, entry: &NewActivity) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.activity_log (actor_id, action, entity_type, entity_id, details)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// The most recent entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r"
            SELECT a.id, a.actor_id, p.email AS actor_email, a.action, a.entity_type,
                   a.entity_id, a.details, a.created_at
            FROM shop.activity_log a
            LEFT JOIN shop.profile p ON p.id = a.actor_id
            ORDER BY a.created_at DESC
            LIMIT $1
            ",
        )
        .bind(FEED_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }
}
