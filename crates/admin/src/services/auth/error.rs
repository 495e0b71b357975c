//! Back-office authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during back-office authentication.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Unknown email, no password, or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Correct credentials, but the profile is not an admin.
    #[error("Admin access required")]
    NotAdmin,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
