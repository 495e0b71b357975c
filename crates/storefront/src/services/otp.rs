//! Phone sign-in with one-time codes.

use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;

use patra_core::{Phone, PhoneError};

use super::sms::{SmsError, SmsSender, otp_message};
use crate::config::OtpConfig;
use crate::db::RepositoryError;
use crate::db::otp::{OTP_TYPE_PHONE, OtpRepository};
use crate::db::profiles::ProfileRepository;
use crate::models::Profile;

/// Errors from sending or verifying a code.
#[derive(Debug, Error)]
pub enum OtpError {
    /// No phone number in the request.
    #[error("Phone number is required")]
    PhoneRequired,

    /// Phone or code missing on verify.
    #[error("Phone number and OTP are required")]
    MissingFields,

    /// Phone number failed to parse.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// No live code matched.
    #[error("Invalid or expired OTP")]
    InvalidCode,

    /// SMS delivery failed.
    #[error("failed to send OTP: {0}")]
    Delivery(#[from] SmsError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of issuing a code.
#[derive(Debug)]
pub struct IssuedCode {
    pub phone: Phone,
    /// The code itself, only set when the config allows echoing it.
    pub debug_code: Option<String>,
}

/// One-time code service.
pub struct OtpService<'a> {
    pool: &'a PgPool,
    sms: &'a SmsSender,
    config: &'a OtpConfig,
    store_name: &'a str,
}

impl<'a> OtpService<'a> {
    /// Create a new OTP service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        sms: &'a SmsSender,
        config: &'a OtpConfig,
        store_name: &'a str,
    ) -> Self {
        Self {
            pool,
            sms,
            config,
            store_name,
        }
    }

    /// Issue a code for `phone` and deliver it.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::PhoneRequired` for a blank phone,
    /// `OtpError::InvalidPhone` for a malformed one, and `OtpError::Delivery`
    /// if the SMS provider rejects the message.
    pub async fn send(&self, phone: Option<&str>) -> Result<IssuedCode, OtpError> {
        let raw = phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(OtpError::PhoneRequired)?;
        let phone = Phone::parse(raw)?;

        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(self.config.ttl_minutes);

        OtpRepository::new(self.pool)
            .create(phone.as_str(), &code, OTP_TYPE_PHONE, expires_at)
            .await?;

        let message = otp_message(self.store_name, &code, self.config.ttl_minutes);
        self.sms.send(&phone, &message).await?;

        tracing::info!(phone = %phone, "OTP issued");

        Ok(IssuedCode {
            phone,
            debug_code: self.config.expose_code.then_some(code),
        })
    }

    /// Redeem a code and return the profile holding the phone, re-attaching
    /// or creating one through [`ProfileRepository::create_for_phone`] when no
    /// profile holds it.
    ///
    /// # Errors
    ///
    /// Returns `OtpError::MissingFields` if either value is blank and
    /// `OtpError::InvalidCode` if no unexpired, unused code matches.
    pub async fn verify(&self, phone: Option<&str>, code: Option<&str>) -> Result<Profile, OtpError> {
        let (Some(raw_phone), Some(code)) = (
            phone.map(str::trim).filter(|p| !p.is_empty()),
            code.map(str::trim).filter(|c| !c.is_empty()),
        ) else {
            return Err(OtpError::MissingFields);
        };
        let phone = Phone::parse(raw_phone)?;

        OtpRepository::new(self.pool)
            .redeem(phone.as_str(), code, OTP_TYPE_PHONE)
            .await?
            .ok_or(OtpError::InvalidCode)?;

        let profiles = ProfileRepository::new(self.pool);
        if let Some(profile) = profiles.get_by_phone(&phone).await? {
            return Ok(profile);
        }

        match profiles.create_for_phone(&phone).await {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, "Attached verified phone to profile");
                Ok(profile)
            }
            // A concurrent verify created it first.
            Err(RepositoryError::Conflict(_)) => profiles
                .get_by_phone(&phone)
                .await?
                .ok_or(OtpError::Repository(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }
}

/// A uniformly random six-digit code.
#[must_use]
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999_u32).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6, "{code}");
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(OtpError::PhoneRequired.to_string(), "Phone number is required");
        assert_eq!(
            OtpError::MissingFields.to_string(),
            "Phone number and OTP are required"
        );
        assert_eq!(OtpError::InvalidCode.to_string(), "Invalid or expired OTP");
    }
}
