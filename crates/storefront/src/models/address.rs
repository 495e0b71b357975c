//! Saved delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use patra_core::{AddressError, AddressId, ShippingAddress, UserId};

/// A row of `shop.address`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Freeze this address for an order.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the stored row no longer validates.
    pub fn snapshot(&self) -> Result<ShippingAddress, AddressError> {
        ShippingAddress::from_parts(
            &self.full_name,
            &self.phone,
            &self.address_line1,
            self.address_line2.as_deref(),
            &self.city,
            &self.state,
            &self.pincode,
        )
    }
}

/// Address fields submitted by the shopper.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Validate and build the order snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] for blank required fields or a bad pincode.
    pub fn snapshot(&self) -> Result<ShippingAddress, AddressError> {
        ShippingAddress::from_parts(
            &self.full_name,
            &self.phone,
            &self.address_line1,
            self.address_line2.as_deref(),
            &self.city,
            &self.state,
            &self.pincode,
        )
    }
}
