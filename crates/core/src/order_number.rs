//! Human-readable order numbers.
//!
//! Format: `ORD` + Unix milliseconds + two random digits, e.g.
//! `ORD171234567890142`. The suffix separates orders placed in the same
//! millisecond; the database's unique constraint catches the rest.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Prefix shared by every order number.
pub const PREFIX: &str = "ORD";

/// Generate an order number for an order placed at `now`.
#[must_use]
pub fn generate(now: DateTime<Utc>) -> String {
    let suffix: u8 = rand::rng().random_range(0..100);
    with_suffix(now, suffix)
}

/// Deterministic form of [`generate`].
#[must_use]
pub fn with_suffix(now: DateTime<Utc>, suffix: u8) -> String {
    format!("{PREFIX}{}{:02}", now.timestamp_millis(), suffix % 100)
}

/// Whether `s` looks like an order number.
#[must_use]
pub fn is_order_number(s: &str) -> bool {
    s.strip_prefix(PREFIX)
        .is_some_and(|rest| rest.len() >= 3 && rest.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_with_suffix_format() {
        let at = Utc.timestamp_millis_opt(1_712_345_678_901).unwrap();
        assert_eq!(with_suffix(at, 7), "ORD171234567890107");
    }

    #[test]
    fn test_generate_is_well_formed() {
        let number = generate(Utc::now());
        assert!(is_order_number(&number), "{number}");
    }

    #[test]
    fn test_rejects_other_strings() {
        assert!(!is_order_number("ORD"));
        assert!(!is_order_number("INV123456"));
        assert!(!is_order_number("ORD12a4"));
    }
}
