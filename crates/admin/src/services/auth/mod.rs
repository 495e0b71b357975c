//! Back-office authentication service.
//!
//! Admins sign in with the same email and password as shoppers; the
//! `admin` role is what lets them in. Roles are re-checked on every request
//! by [`AdminAuthService::current_admin`].

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use sqlx::PgPool;

use patra_core::{Email, UserId, UserRole};

use crate::db::ProfileRepository;
use crate::models::Profile;

/// Back-office authentication service.
pub struct AdminAuthService<'a> {
    profiles: ProfileRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new back-office authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool),
        }
    }

    /// Check an email and password and require the admin role.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` if the email or password
    /// is wrong and `AdminAuthError::NotAdmin` if the profile is a customer.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (profile, password_hash) = self
            .profiles
            .get_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        require_admin(&profile)?;

        Ok(profile)
    }

    /// Reload a signed-in admin, failing if the role was revoked.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::NotAdmin` if the profile is gone or no longer
    /// an admin.
    pub async fn current_admin(&self, id: UserId) -> Result<Profile, AdminAuthError> {
        let profile = self
            .profiles
            .get_by_id(id)
            .await?
            .ok_or(AdminAuthError::NotAdmin)?;
        require_admin(&profile)?;
        Ok(profile)
    }
}

fn require_admin(profile: &Profile) -> Result<(), AdminAuthError> {
    if profile.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AdminAuthError::NotAdmin)
    }
}

/// Verify a password against a stored Argon2 hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
    use chrono::Utc;

    fn profile(role: UserRole) -> Profile {
        Profile {
            id: UserId::new(),
            email: Email::parse("owner@shivpuriyapatra.in").unwrap(),
            full_name: Some("Store Owner".to_owned()),
            phone: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_verify_password() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"peetal-diya-7", &salt)
            .unwrap()
            .to_string();

        assert!(verify_password("peetal-diya-7", &hash).is_ok());
        assert!(matches!(
            verify_password("peetal-diya-8", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_customers_are_not_admins() {
        assert!(require_admin(&profile(UserRole::Admin)).is_ok());
        assert!(matches!(
            require_admin(&profile(UserRole::Customer)),
            Err(AdminAuthError::NotAdmin)
        ));
    }
}
