//! Session-related types for back-office authentication.

use serde::{Deserialize, Serialize};

use patra_core::{Email, UserId};

use super::Profile;

/// Session-stored admin identity.
///
/// Only the id is trusted; the role is re-read from the database on every
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Profile ID.
    pub id: UserId,
    /// Email at login time.
    pub email: Email,
    /// Display name at login time.
    pub name: Option<String>,
}

impl From<&Profile> for CurrentAdmin {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.full_name.clone(),
        }
    }
}

/// Session keys for back-office authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
