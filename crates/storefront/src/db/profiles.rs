//! Profile repository.
//!
//! Profiles are the login identity. Password hashes live in a separate table
//! so profile rows can be returned to clients freely.

use sqlx::PgPool;
use uuid::Uuid;

use patra_core::{Email, Phone, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Profile;

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

    /// Get a profile by phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_phone(&self, phone: &Phone) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM shop.profile WHERE phone = $1"
        ))
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;
        Ok(profile)
    }

    /// Get a profile together with its password hash.
    ///
    /// Returns `None` when the email is unknown or the profile has no password
    /// (phone sign-ups).
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

    /// Create a profile with a password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        full_name: Option<&str>,
        phone: Option<&Phone>,
        password_hash: &str,
    ) -> Result<Profile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let profile = sqlx::query_as::<_, Profile>(&format!(
            r"
            INSERT INTO shop.profile (email, full_name, phone)
            VALUES ($1, $2, $3)
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(email)
        .bind(full_name)
        .bind(phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email or phone already registered"))?;

        sqlx::query(
            r"
            INSERT INTO shop.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(profile.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(profile)
    }

    /// Find or create the profile for a verified phone number.
    ///
    /// New profiles get a [`placeholder_email`] until the shopper supplies a
    /// real one. A placeholder profile whose phone was cleared gets the number
    /// back instead of a second account. If the placeholder belongs to a
    /// profile that has since moved to another number, the new profile's
    /// placeholder carries a random suffix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another profile claimed the phone
    /// concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_for_phone(&self, phone: &Phone) -> Result<Profile, RepositoryError> {
        let mut email = placeholder_email(phone);
        let mut tx = self.pool.begin().await?;

        let reclaimed = sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE shop.profile
            SET phone = $2, updated_at = now()
            WHERE email = $1 AND phone IS NULL
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(&email)
        .bind(phone)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "phone already registered"))?;

        if let Some(profile) = reclaimed {
            tx.commit().await?;
            tracing::info!(user_id = %profile.id, "Re-attached phone to placeholder profile");
            return Ok(profile);
        }

        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.profile WHERE email = $1)")
                .bind(&email)
                .fetch_one(&mut *tx)
                .await?;
        if email_taken {
            email = format!("temp_{}_{}@temp.com", phone.digits(), Uuid::new_v4().simple());
        }

        let profile = sqlx::query_as::<_, Profile>(&format!(
            r"
            INSERT INTO shop.profile (email, full_name, phone, role)
            VALUES ($1, $2, $3, 'customer')
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(&email)
        .bind(format!("User {phone}"))
        .bind(phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "phone already registered"))?;

        tx.commit().await?;
        Ok(profile)
    }

    /// Partial update of name and phone. `Keep` leaves a column alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Conflict` if the phone belongs to someone else.
    pub async fn update_contact(
        &self,
        id: UserId,
        full_name: FieldChange<&str>,
        phone: FieldChange<&Phone>,
    ) -> Result<Profile, RepositoryError> {
        sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE shop.profile
            SET full_name = CASE WHEN $2 THEN $3 ELSE full_name END,
                phone = CASE WHEN $4 THEN $5 ELSE phone END,
                updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(full_name.is_change())
        .bind(full_name.new_value())
        .bind(phone.is_change())
        .bind(phone.new_value())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "phone already registered"))?
        .ok_or(RepositoryError::NotFound)
    }
}

/// What a partial update does to one nullable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChange<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldChange<T> {
    /// Convert a `Set` value, keeping `Keep` and `Clear` as they are.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns for the `Set` value.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<FieldChange<U>, E> {
        Ok(match self {
            Self::Keep => FieldChange::Keep,
            Self::Clear => FieldChange::Clear,
            Self::Set(value) => FieldChange::Set(f(value)?),
        })
    }

    #[must_use]
    pub const fn as_ref(&self) -> FieldChange<&T> {
        match self {
            Self::Keep => FieldChange::Keep,
            Self::Clear => FieldChange::Clear,
            Self::Set(value) => FieldChange::Set(value),
        }
    }
}

impl<T: Copy> FieldChange<T> {
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Keep)
    }

    /// The column's new value; `None` for both `Keep` and `Clear`.
    #[must_use]
    pub fn new_value(&self) -> Option<T> {
        match self {
            Self::Set(value) => Some(*value),
            Self::Keep | Self::Clear => None,
        }
    }
}

/// `temp_<digits>@temp.com`, the email given to phone-only profiles.
#[must_use]
pub fn placeholder_email(phone: &Phone) -> String {
    format!("temp_{}@temp.com", phone.digits())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_email_ignores_plus_and_separators() {
        let a = Phone::parse("+91 98765-43210").unwrap();
        let b = Phone::parse("919876543210").unwrap();
        assert_eq!(placeholder_email(&a), "temp_919876543210@temp.com");
        assert_eq!(placeholder_email(&a), placeholder_email(&b));
        assert!(Email::parse(&placeholder_email(&a)).is_ok());
    }

    #[test]
    fn test_field_change() {
        assert!(!FieldChange::<&str>::Keep.is_change());
        assert_eq!(FieldChange::<&str>::Keep.new_value(), None);
        assert!(FieldChange::<&str>::Clear.is_change());
        assert_eq!(FieldChange::<&str>::Clear.new_value(), None);
        assert_eq!(FieldChange::Set("Asha").new_value(), Some("Asha"));
    }

    #[test]
    fn test_field_change_try_map() {
        let parsed = FieldChange::Set("+91 98765 43210").try_map(Phone::parse).unwrap();
        assert_eq!(parsed, FieldChange::Set(Phone::parse("919876543210").unwrap()));
        assert_eq!(
            FieldChange::<&str>::Clear.try_map(Phone::parse),
            Ok(FieldChange::Clear)
        );
        assert!(FieldChange::Set("not a phone").try_map(Phone::parse).is_err());
    }
}
