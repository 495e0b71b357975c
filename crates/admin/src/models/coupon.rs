//! Coupon management types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use patra_core::{CouponId, CouponType};

/// Longest accepted coupon code.
const MAX_CODE_LENGTH: usize = 32;

/// A row of `shop.coupon`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub coupon_type: CouponType,
    pub value: Decimal,
    pub minimum_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Coupon list row with a display-ready usage counter.
#[derive(Debug, Clone, Serialize)]
pub struct CouponView {
    #[serde(flatten)]
    pub coupon: Coupon,
    /// `used/limit`, or `used/∞` without a limit.
    pub usage: String,
}

impl From<Coupon> for CouponView {
    fn from(coupon: Coupon) -> Self {
        let usage = coupon.usage_limit.map_or_else(
            || format!("{}/∞", coupon.used_count),
            |limit| format!("{}/{limit}", coupon.used_count),
        );
        Self { coupon, usage }
    }
}

/// Body for creating or replacing a coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponInput {
    pub code: String,
    pub coupon_type: CouponType,
    pub value: Decimal,
    pub minimum_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponInputError {
    #[error("Coupon code is required")]
    CodeRequired,
    #[error("Coupon code may only contain letters, digits, '-' and '_' (max {MAX_CODE_LENGTH})")]
    InvalidCode,
    #[error("Value must be positive")]
    ValueNotPositive,
    #[error("Percentage cannot exceed 100")]
    PercentageTooLarge,
    #[error("Usage limit must be positive")]
    UsageLimitNotPositive,
    #[error("Minimum order amount cannot be negative")]
    NegativeMinimum,
}

impl CouponInput {
    /// Uppercase the code and check every rule.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn normalize(mut self) -> Result<Self, CouponInputError> {
        self.code = self.code.trim().to_uppercase();
        if self.code.is_empty() {
            return Err(CouponInputError::CodeRequired);
        }
        if self.code.len() > MAX_CODE_LENGTH
            || !self
                .code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CouponInputError::InvalidCode);
        }
        if self.value <= Decimal::ZERO {
            return Err(CouponInputError::ValueNotPositive);
        }
        if self.coupon_type == CouponType::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Err(CouponInputError::PercentageTooLarge);
        }
        if self.usage_limit.is_some_and(|limit| limit <= 0) {
            return Err(CouponInputError::UsageLimitNotPositive);
        }
        if self.minimum_order_amount.is_some_and(|m| m < Decimal::ZERO) {
            return Err(CouponInputError::NegativeMinimum);
        }
        Ok(self)
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(coupon_type: CouponType, value: i64) -> CouponInput {
        CouponInput {
            code: " diwali-10 ".to_owned(),
            coupon_type,
            value: Decimal::from(value),
            minimum_order_amount: None,
            usage_limit: Some(50),
            expires_at: None,
            is_active: true,
        }
    }

    fn coupon(used_count: i32, usage_limit: Option<i32>) -> Coupon {
        Coupon {
            id: CouponId::new(),
            code: "WELCOME".to_owned(),
            coupon_type: CouponType::FixedAmount,
            value: Decimal::from(100),
            minimum_order_amount: None,
            usage_limit,
            used_count,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_code_is_uppercased() {
        let c = input(CouponType::Percentage, 10).normalize().unwrap();
        assert_eq!(c.code, "DIWALI-10");
    }

    #[test]
    fn test_percentage_cap() {
        assert_eq!(
            input(CouponType::Percentage, 101).normalize().unwrap_err(),
            CouponInputError::PercentageTooLarge
        );
        assert!(input(CouponType::Percentage, 100).normalize().is_ok());
        assert!(input(CouponType::FixedAmount, 500).normalize().is_ok());
    }

    #[test]
    fn test_value_must_be_positive() {
        assert_eq!(
            input(CouponType::FixedAmount, 0).normalize().unwrap_err(),
            CouponInputError::ValueNotPositive
        );
    }

    #[test]
    fn test_code_charset() {
        let mut c = input(CouponType::FixedAmount, 50);
        c.code = "SAVE 50".to_owned();
        assert_eq!(c.normalize().unwrap_err(), CouponInputError::InvalidCode);

        let mut c = input(CouponType::FixedAmount, 50);
        c.code = "  ".to_owned();
        assert_eq!(c.normalize().unwrap_err(), CouponInputError::CodeRequired);
    }

    #[test]
    fn test_usage_label() {
        assert_eq!(CouponView::from(coupon(3, Some(10))).usage, "3/10");
        assert_eq!(CouponView::from(coupon(7, None)).usage, "7/∞");
    }

    #[test]
    fn test_view_serializes_flat() {
        let json = serde_json::to_value(CouponView::from(coupon(1, None))).unwrap();
        assert_eq!(json["code"], "WELCOME");
        assert_eq!(json["usage"], "1/∞");
    }
}
