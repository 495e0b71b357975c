//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! Shared with the admin binary. The storefront reads the catalog and owns
//! the shopper-facing tables:
//!
//! - `profile`, `user_password` - identities and password hashes
//! - `category`, `product` - catalog (read-only here)
//! - `cart_item`, `wishlist_item` - one row per (user, product)
//! - `address` - saved delivery addresses
//! - `orders`, `order_item` - placed orders with price snapshots
//! - `coupon` - read and usage-counted at checkout
//! - `otp_verification` - phone sign-in codes
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p patra-cli -- migrate
//! ```

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod otp;
pub mod profiles;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

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

    /// Constraint violation (e.g., unique email).
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
