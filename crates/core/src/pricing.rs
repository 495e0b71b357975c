//! Checkout arithmetic.
//!
//! Everything here is pure so the storefront can price a cart, the checkout
//! transaction can re-price it, and tests can check the order invariants
//! without a database:
//!
//! - `subtotal == Σ line_total`
//! - `total == subtotal - discount` (shipping and tax are always zero)
//! - `0 <= discount <= subtotal`

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CouponType, ProductId, round_rupees};

/// One cart line frozen at the moment of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl LineSnapshot {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of all line totals.
#[must_use]
pub fn subtotal(lines: &[LineSnapshot]) -> Decimal {
    lines.iter().map(LineSnapshot::line_total).sum()
}

/// The parts of a coupon that decide whether and how much it discounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRule {
    pub coupon_type: CouponType,
    pub value: Decimal,
    pub minimum_order_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Why a coupon cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    Exhausted,
    #[error("order must be at least {minimum} to use this coupon")]
    BelowMinimum { minimum: Decimal },
}

/// Discount a coupon gives on `subtotal` at time `now`.
///
/// Percentage discounts round to paise. The result never exceeds the
/// subtotal.
///
/// # Errors
///
/// Returns a [`CouponRejection`] if the coupon is inactive, expired, used
/// up, or the subtotal is under its minimum.
pub fn coupon_discount(
    rule: &CouponRule,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, CouponRejection> {
    if !rule.is_active {
        return Err(CouponRejection::Inactive);
    }
    if rule.expires_at.is_some_and(|at| at <= now) {
        return Err(CouponRejection::Expired);
    }
    if rule
        .usage_limit
        .is_some_and(|limit| rule.used_count >= limit)
    {
        return Err(CouponRejection::Exhausted);
    }
    if let Some(minimum) = rule.minimum_order_amount
        && subtotal < minimum
    {
        return Err(CouponRejection::BelowMinimum { minimum });
    }

    let raw = match rule.coupon_type {
        CouponType::Percentage => round_rupees(subtotal * rule.value / Decimal::ONE_HUNDRED),
        CouponType::FixedAmount => rule.value,
    };
    Ok(raw.clamp(Decimal::ZERO, subtotal))
}

/// Money columns written to an order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Price `lines` with an already-validated `discount`.
    ///
    /// The discount is clamped into `0..=subtotal`.
    #[must_use]
    pub fn compute(lines: &[LineSnapshot], discount: Decimal) -> Self {
        let subtotal = subtotal(lines);
        let discount = discount.clamp(Decimal::ZERO, subtotal);
        Self {
            subtotal,
            discount,
            shipping: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: subtotal - discount,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(price: &str, quantity: i32) -> LineSnapshot {
        LineSnapshot {
            product_id: ProductId::new(),
            product_name: "Brass Lota".to_owned(),
            unit_price: d(price),
            quantity,
        }
    }

    fn rule(coupon_type: CouponType, value: &str) -> CouponRule {
        CouponRule {
            coupon_type,
            value: d(value),
            minimum_order_amount: None,
            usage_limit: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line("249.50", 3).line_total(), d("748.50"));
    }

    #[test]
    fn test_subtotal_sums_lines() {
        let lines = [line("100", 2), line("49.99", 1), line("0.01", 10)];
        assert_eq!(subtotal(&lines), d("250.09"));
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_totals_without_coupon() {
        let lines = [line("1200", 1), line("350", 2)];
        let totals = OrderTotals::compute(&lines, Decimal::ZERO);
        assert_eq!(totals.subtotal, d("1900"));
        assert_eq!(totals.total, d("1900"));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
    }

    #[test]
    fn test_totals_balance_with_discount() {
        let lines = [line("999", 1), line("1", 1)];
        let totals = OrderTotals::compute(&lines, d("150"));
        assert_eq!(totals.total + totals.discount, subtotal(&lines));
    }

    #[test]
    fn test_totals_clamp_oversized_discount() {
        let totals = OrderTotals::compute(&[line("100", 1)], d("500"));
        assert_eq!(totals.discount, d("100"));
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_percentage_coupon_rounds_to_paise() {
        let r = rule(CouponType::Percentage, "15");
        assert_eq!(coupon_discount(&r, d("333.33"), Utc::now()).unwrap(), d("50.00"));
    }

    #[test]
    fn test_fixed_coupon_capped_at_subtotal() {
        let r = rule(CouponType::FixedAmount, "500");
        assert_eq!(coupon_discount(&r, d("300"), Utc::now()).unwrap(), d("300"));
        assert_eq!(coupon_discount(&r, d("800"), Utc::now()).unwrap(), d("500"));
    }

    #[test]
    fn test_inactive_coupon() {
        let mut r = rule(CouponType::Percentage, "10");
        r.is_active = false;
        assert_eq!(
            coupon_discount(&r, d("100"), Utc::now()),
            Err(CouponRejection::Inactive)
        );
    }

    #[test]
    fn test_expired_coupon() {
        let now = Utc::now();
        let mut r = rule(CouponType::Percentage, "10");
        r.expires_at = Some(now);
        assert_eq!(
            coupon_discount(&r, d("100"), now),
            Err(CouponRejection::Expired)
        );
        r.expires_at = Some(now + Duration::hours(1));
        assert!(coupon_discount(&r, d("100"), now).is_ok());
    }

    #[test]
    fn test_exhausted_coupon() {
        let mut r = rule(CouponType::FixedAmount, "50");
        r.usage_limit = Some(3);
        r.used_count = 3;
        assert_eq!(
            coupon_discount(&r, d("100"), Utc::now()),
            Err(CouponRejection::Exhausted)
        );
        r.used_count = 2;
        assert!(coupon_discount(&r, d("100"), Utc::now()).is_ok());
    }

    #[test]
    fn test_minimum_order_amount() {
        let mut r = rule(CouponType::FixedAmount, "50");
        r.minimum_order_amount = Some(d("500"));
        assert_eq!(
            coupon_discount(&r, d("499.99"), Utc::now()),
            Err(CouponRejection::BelowMinimum { minimum: d("500") })
        );
        assert_eq!(coupon_discount(&r, d("500"), Utc::now()).unwrap(), d("50"));
    }
}
