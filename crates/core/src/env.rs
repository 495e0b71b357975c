//! Environment variable readers shared by the server binaries.
//!
//! Secrets go through [`secret`], which rejects values that look copied
//! from a sample `.env` and values with too little variety to be random.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Shortest accepted session signing key.
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Shannon entropy floor for secrets, in bits per character.
const MIN_BITS_PER_CHAR: f64 = 3.3;

/// Fragments that only show up in placeholder values. Matched lowercase.
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

impl ConfigError {
    #[must_use]
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEnvVar(key.to_owned(), reason.into())
    }
}

/// # Errors
///
/// `MissingEnvVar` when `key` is unset.
pub fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// A blank value counts as unset.
#[must_use]
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[must_use]
pub fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_owned())
}

/// Parse `key`, or `default` when it is unset.
///
/// # Errors
///
/// `InvalidEnvVar` carrying the parser's message.
pub fn parse_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

/// Read `key`, falling back to the shared `DATABASE_URL`.
///
/// # Errors
///
/// `MissingEnvVar` naming `key` when neither is set.
pub fn database_url(key: &str) -> Result<SecretString, ConfigError> {
    optional(key)
        .or_else(|| optional("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Read a required secret and check its strength.
///
/// # Errors
///
/// `MissingEnvVar` or `InsecureSecret`.
pub fn secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    check_secret(&value, key)?;
    Ok(SecretString::from(value))
}

/// Read a session signing key: a strong secret of at least
/// [`MIN_SESSION_SECRET_LENGTH`] characters.
///
/// # Errors
///
/// `MissingEnvVar` or `InsecureSecret`.
pub fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = secret(key)?;
    let len = value.expose_secret().len();
    if len < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {len})"),
        ));
    }
    Ok(value)
}

/// Reject placeholder-looking or low-entropy secret values.
///
/// # Errors
///
/// `InsecureSecret` explaining which check failed.
pub fn check_secret(value: &str, key: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!("looks like a placeholder (contains '{fragment}')"),
        ));
    }

    let bits = bits_per_char(value);
    if bits < MIN_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!(
                "not random enough ({bits:.2} bits/char, need {MIN_BITS_PER_CHAR:.1}); generate it with `openssl rand -base64 48`"
            ),
        ));
    }
    Ok(())
}

/// Require both or neither of a pair of variables.
///
/// # Errors
///
/// `InvalidEnvVar` naming both keys when only one is set.
pub fn pair(first: &str, second: &str) -> Result<Option<(String, String)>, ConfigError> {
    match (optional(first), optional(second)) {
        (Some(a), Some(b)) => Ok(Some((a, b))),
        (None, None) => Ok(None),
        _ => Err(ConfigError::invalid(
            first,
            format!("{first} and {second} must be set together"),
        )),
    }
}

#[allow(clippy::cast_precision_loss)]
fn bits_per_char(value: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_char() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!(bits_per_char("kkkkkkkk").abs() < f64::EPSILON);
        assert!((bits_per_char("abababab") - 1.0).abs() < 1e-9);
        assert!((bits_per_char("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_check_secret_rejects_placeholders() {
        for value in ["your-razorpay-key", "CHANGEME-9f8e7d6c5b4a", "rzp_secret_Zq81"] {
            let err = check_secret(value, "RAZORPAY_KEY_SECRET").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(..)), "{value}");
        }
    }

    #[test]
    fn test_check_secret_rejects_repetitive_values() {
        let err = check_secret(&"ab".repeat(20), "STOREFRONT_SESSION_SECRET").unwrap_err();
        assert!(err.to_string().contains("not random enough"));
    }

    #[test]
    fn test_check_secret_accepts_random_value() {
        assert!(check_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "K").is_ok());
    }

    #[test]
    fn test_config_error_messages_name_the_variable() {
        let err = ConfigError::invalid("ADMIN_PORT", "invalid digit found in string");
        assert_eq!(
            err.to_string(),
            "Invalid environment variable ADMIN_PORT: invalid digit found in string"
        );
    }
}
