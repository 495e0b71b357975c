//! Phone number type used by OTP sign-in and delivery contacts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Nothing left after stripping separators.
    #[error("phone number cannot be empty")]
    Empty,
    /// A character other than a digit, separator or leading `+`.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// Too few or too many digits.
    #[error("phone number must have between {min} and {max} digits")]
    InvalidLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// A normalized phone number.
///
/// Spaces, dashes, dots and parentheses are stripped and a single leading `+`
/// is accepted. The stored form is digits only, so `+91 98765 43210` and
/// `919876543210` are the same number. There must be 10 to 15 digits (E.164
/// allows at most 15).
///
/// ```
/// use patra_core::Phone;
///
/// let phone = Phone::parse("+91 98765-43210").unwrap();
/// assert_eq!(phone.as_str(), "919876543210");
/// assert_eq!(phone, Phone::parse("919876543210").unwrap());
/// assert_eq!(phone.e164(), "+919876543210");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Fewest digits accepted (a bare Indian mobile number).
    pub const MIN_DIGITS: usize = 10;
    /// Most digits accepted.
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is blank, contains letters, or has
    /// the wrong number of digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// The stored form: digits only.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Only the digits. Same as [`Phone::as_str`]; kept for call sites that
    /// build identifiers from the number.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The number in `+<country><number>` form for SMS gateways. A bare
    /// ten-digit number is taken to be Indian.
    #[must_use]
    pub fn e164(&self) -> String {
        if self.0.len() == Self::MIN_DIGITS {
            format!("+91{}", self.0)
        } else {
            format!("+{}", self.0)
        }
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Phone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Phone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Phone {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let phone = Phone::parse("(987) 654-3210").unwrap();
        assert_eq!(phone.as_str(), "9876543210");
    }

    #[test]
    fn test_leading_plus_is_not_stored() {
        let with_plus = Phone::parse(" +91 98765 43210 ").unwrap();
        let without = Phone::parse("919876543210").unwrap();
        assert_eq!(with_plus.as_str(), "919876543210");
        assert_eq!(with_plus, without);
        assert_eq!(with_plus.digits(), "919876543210");
    }

    #[test]
    fn test_e164() {
        assert_eq!(Phone::parse("98765 43210").unwrap().e164(), "+919876543210");
        assert_eq!(Phone::parse("+44 20 7946 0958").unwrap().e164(), "+442079460958");
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(Phone::parse("  "), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("+"), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_rejects_letters() {
        assert_eq!(
            Phone::parse("98765abc10"),
            Err(PhoneError::InvalidCharacter('a'))
        );
    }

    #[test]
    fn test_parse_rejects_plus_in_middle() {
        assert_eq!(
            Phone::parse("91+9876543210"),
            Err(PhoneError::InvalidCharacter('+'))
        );
    }

    #[test]
    fn test_parse_length_bounds() {
        assert!(Phone::parse("987654321").is_err());
        assert!(Phone::parse("9876543210").is_ok());
        assert!(Phone::parse("123456789012345").is_ok());
        assert!(Phone::parse("1234567890123456").is_err());
    }
}
