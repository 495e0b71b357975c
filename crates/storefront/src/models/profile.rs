//! Shopper profile.

use chrono::{DateTime, Utc};
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
