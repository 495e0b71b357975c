//! One-time code storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use patra_core::OtpId;

use super::RepositoryError;

/// Code type for phone sign-in.
pub const OTP_TYPE_PHONE: &str = "phone";

/// Repository for `shop.otp_verification`.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    /// Create a new OTP repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        identifier: &str,
        code: &str,
        otp_type: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO shop.otp_verification (identifier, code, otp_type, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(identifier)
        .bind(code)
        .bind(otp_type)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Redeem the newest unexpired, unverified matching code.
    ///
    /// Selecting and marking happen in one statement with the row locked,
    /// so two concurrent verifications cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn redeem(
        &self,
        identifier: &str,
        code: &str,
        otp_type: &str,
    ) -> Result<Option<OtpId>, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            UPDATE shop.otp_verification
            SET verified = true
            WHERE id = (
                SELECT id FROM shop.otp_verification
                WHERE identifier = $1
                  AND code = $2
                  AND otp_type = $3
                  AND NOT verified
                  AND expires_at > now()
                ORDER BY created_at DESC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id
            ",
        )
        .bind(identifier)
        .bind(code)
        .bind(otp_type)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }
}
