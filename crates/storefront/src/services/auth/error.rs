//! Failures from sign-up, sign-in and password handling.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] patra_core::EmailError),

    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] patra_core::PhoneError),

    /// Unknown email and wrong password share this variant so the response
    /// never reveals which accounts exist.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("profile not found")]
    UserNotFound,

    #[error("An account with this email or phone already exists")]
    UserAlreadyExists,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Argon2 failed to hash or the stored hash is unreadable.
    #[error("password hashing error")]
    PasswordHash,
}
