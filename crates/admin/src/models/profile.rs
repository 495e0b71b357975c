//! Profiles as the back-office sees them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use patra_core::{Email, UserId, UserRole};

/// A row of `shop.profile`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer list row with order aggregates.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: Profile,
    pub order_count: i64,
    /// Sum of completed payments.
    pub total_spent: Decimal,
}
