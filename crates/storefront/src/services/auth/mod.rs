//! Customer accounts: sign-up, password sign-in and profile lookup.
//!
//! Email and password accounts hashed with Argon2id. Phone sign-in lives in
//! [`super::otp`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use patra_core::{Email, Phone, UserId};

use crate::db::RepositoryError;
use crate::db::profiles::ProfileRepository;
use crate::models::Profile;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form, already deserialized.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Account operations over the `shop.profile` and `shop.user_password` tables.
pub struct AuthService<'a> {
    profiles: ProfileRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
        }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::InvalidPhone` for bad input.
    /// Returns `AuthError::WeakPassword` for passwords under eight characters.
    /// Returns `AuthError::UserAlreadyExists` if the email or phone is taken.
    pub async fn register(&self, form: Registration<'_>) -> Result<Profile, AuthError> {
        let email = Email::parse(form.email)?;
        let phone = form
            .phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Phone::parse)
            .transpose()?;
        let full_name = form.full_name.map(str::trim).filter(|n| !n.is_empty());

        validate_password(form.password)?;
        let password_hash = hash_password(form.password)?;

        self.profiles
            .create_with_password(&email, full_name, phone.as_ref(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check an email and password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, a
    /// phone-only account or a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        // A malformed email is reported the same as an unknown one.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (profile, password_hash) = self
            .profiles
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(profile)
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the profile doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<Profile, AuthError> {
        self.profiles
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Argon2id PHC string with a fresh salt. Also used by `patra-cli admin create`.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("kansa-thali-42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("kansa-thali-42", &hash).is_ok());
        assert!(matches!(
            verify_password("kansa-thali-43", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same-password").unwrap(), hash_password("same-password").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("whatever1", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("exactly8").is_ok());
    }

    #[test]
    fn test_credentials_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}
