//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Existing shopper account becomes an admin
//! patra-cli admin promote -e owner@example.com
//!
//! # New admin account; the password is read from stdin
//! patra-cli admin create -e owner@example.com -n "Store Owner"
//!
//! # Non-interactive
//! ADMIN_PASSWORD=... patra-cli admin create -e owner@example.com -n "Store Owner" --password-env ADMIN_PASSWORD
//! ```

use std::io::BufRead;

use thiserror::Error;

use patra_core::{Email, UserId, UserRole};
use patra_storefront::services::auth::hash_password;

/// Shortest accepted admin password.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Password environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Hashing failed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// Reading the password from stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// No account with that email.
    #[error("No account found with email: {0}")]
    UserNotFound(String),

    /// Account already exists.
    #[error("An account already exists with email: {0} (use 'admin promote')")]
    UserExists(String),
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no profile has that email.
pub async fn promote(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = super::connect().await?;

    let id: Option<UserId> = sqlx::query_scalar(
        "UPDATE shop.profile SET role = $2, updated_at = now() WHERE email = $1 RETURNING id",
    )
    .bind(email.as_str())
    .bind(UserRole::Admin)
    .fetch_optional(&pool)
    .await
    .map_err(AdminError::from)?;

    let id = id.ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;
    tracing::info!(user_id = %id, %email, "Account promoted to admin");
    Ok(())
}

/// Create a new admin account with a password.
///
/// # Errors
///
/// Returns `AdminError::UserExists` if the email is taken, or an error if
/// the password is missing or too short.
pub async fn create(
    email: &str,
    name: &str,
    password_env: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let name = name.trim();

    let password = match password_env {
        Some(var) => std::env::var(var).map_err(|_| AdminError::MissingEnvVar(var.to_owned()))?,
        None => prompt_password()?,
    };
    check_password(&password)?;
    let password_hash = hash_password(&password).map_err(|_| AdminError::PasswordHash)?;

    let pool = super::connect().await?;
    let mut tx = pool.begin().await.map_err(AdminError::from)?;

    let id: Option<UserId> = sqlx::query_scalar(
        r"
        INSERT INTO shop.profile (email, full_name, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind((!name.is_empty()).then_some(name))
    .bind(UserRole::Admin)
    .fetch_optional(&mut *tx)
    .await
    .map_err(AdminError::from)?;
    let id = id.ok_or_else(|| AdminError::UserExists(email.to_string()))?;

    sqlx::query("INSERT INTO shop.user_password (user_id, password_hash) VALUES ($1, $2)")
        .bind(id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .map_err(AdminError::from)?;

    tx.commit().await.map_err(AdminError::from)?;

    tracing::info!(user_id = %id, %email, "Admin account created");
    Ok(())
}

fn check_password(password: &str) -> Result<(), AdminError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }
    Ok(())
}

fn prompt_password() -> Result<String, AdminError> {
    #[allow(clippy::print_stderr)]
    {
        eprint!("Password: ");
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length() {
        assert!(matches!(
            check_password("short"),
            Err(AdminError::WeakPassword)
        ));
        assert!(check_password("kansa-thali").is_ok());
    }
}
