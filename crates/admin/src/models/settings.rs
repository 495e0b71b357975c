//! Store settings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use patra_core::UserId;

/// Keys the storefront and back-office read.
pub const KNOWN_SETTING_KEYS: &[&str] = &["store_name", "store_email", "store_phone"];

/// A row of `shop.site_setting`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}
