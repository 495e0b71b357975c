//! Profile repository: back-office sign-in and customer management.

use sqlx::PgPool;

use patra_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::{CustomerSummary, Profile};

const PROFILE_COLUMNS: &str = "id, email, full_name, phone, role, created_at, updated_at";

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM shop.profile WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(profile)
    }

    /// Get a profile together with its password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Profile, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            profile: Profile,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, Row>(
            r"
            SELECT p.id, p.email, p.full_name, p.phone, p.role, p.created_at, p.updated_at,
                   up.password_hash
            FROM shop.profile p
            JOIN shop.user_password up ON up.user_id = p.id
            WHERE p.email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.profile, r.password_hash)))
    }

    /// Every profile with its order count and completed spend, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_customers(&self) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let customers = sqlx::query_as::<_, CustomerSummary>(
            r"
            SELECT p.id, p.email, p.full_name, p.phone, p.role, p.created_at, p.updated_at,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total_amount) FILTER (WHERE o.payment_status = 'completed'), 0)
                       AS total_spent
            FROM shop.profile p
            LEFT JOIN shop.orders o ON o.user_id = p.id
            GROUP BY p.id
            ORDER BY p.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(customers)
    }

    /// Change a profile's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<Profile, RepositoryError> {
        sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE shop.profile SET role = $2, updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
