//! Database operations for the back-office.
//!
//! # Schema: `shop`
//!
//! Shared with the storefront, whose crate owns the migrations. The
//! back-office writes the catalog, coupons, settings and order status, and
//! owns two tables of its own:
//!
//! - `refund` - money returned against an order
//! - `activity_log` - who changed what
//!
//! Sessions live in `tower_sessions.admin_session`, apart from shopper
//! sessions.
//!
//! # Migrations
//!
//! ```bash
//! cargo run -p patra-cli -- migrate
//! ```

pub mod activity;
pub mod catalog;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod profiles;
pub mod refunds;
pub mod settings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use activity::ActivityRepository;
pub use catalog::CatalogRepository;
pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use profiles::ProfileRepository;
pub use settings::SettingsRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique sku).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a foreign-key violation to `Conflict`, everything else to `Database`.
pub(crate) fn conflict_on_reference(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
