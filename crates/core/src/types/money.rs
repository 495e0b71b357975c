//! Rupee amounts.
//!
//! Amounts are plain [`Decimal`] values in rupees with two decimal places.
//! The payment gateway wants integer paise, so conversion lives here.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Errors converting between rupees and paise.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    #[error("amount is too large: {0}")]
    Overflow(Decimal),
}

/// Round to two decimal places, half away from zero.
#[must_use]
pub fn round_rupees(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a rupee amount to paise.
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for amounts below zero and
/// [`MoneyError::Overflow`] if the result does not fit an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }
    (round_rupees(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(MoneyError::Overflow(amount))
}

/// Convert paise back to rupees.
#[must_use]
pub fn from_minor_units(paise: i64) -> Decimal {
    Decimal::new(paise, 2)
}

/// Render an amount the way Indian shoppers read it: `₹1,23,456.50`.
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    let rounded = round_rupees(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    // Last three digits form one group, everything before it groups by two.
    let grouped = if whole.len() > 3 {
        let (head, tail) = whole.split_at(whole.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (left, right) = rest.split_at(rest.len() - 2);
            parts.push(right);
            rest = left;
        }
        parts.push(rest);
        parts.reverse();
        format!("{},{tail}", parts.join(","))
    } else {
        whole.to_owned()
    };

    format!("{}₹{grouped}.{fraction}", if negative { "-" } else { "" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(d("1499.00")).unwrap(), 149_900);
        assert_eq!(to_minor_units(d("0.5")).unwrap(), 50);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_to_minor_units_rounds_half_up() {
        assert_eq!(to_minor_units(d("10.005")).unwrap(), 1001);
        assert_eq!(to_minor_units(d("10.004")).unwrap(), 1000);
    }

    #[test]
    fn test_to_minor_units_rejects_negative() {
        assert!(matches!(
            to_minor_units(d("-1")),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(from_minor_units(149_950), d("1499.50"));
    }

    #[test]
    fn test_format_inr_small() {
        assert_eq!(format_inr(d("0")), "₹0.00");
        assert_eq!(format_inr(d("999.5")), "₹999.50");
    }

    #[test]
    fn test_format_inr_groups_lakhs() {
        assert_eq!(format_inr(d("1234.5")), "₹1,234.50");
        assert_eq!(format_inr(d("123456")), "₹1,23,456.00");
        assert_eq!(format_inr(d("12345678.9")), "₹1,23,45,678.90");
    }

    #[test]
    fn test_format_inr_negative() {
        assert_eq!(format_inr(d("-1500")), "-₹1,500.00");
    }
}
