//! Shipping address snapshot stored on each order.

use serde::{Deserialize, Serialize};

/// Validation failures for address input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("pincode must be 6 digits")]
    InvalidPincode,
}

/// The delivery address frozen onto an order at checkout.
///
/// Saved addresses can later be edited or deleted; the order keeps this copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    /// Address lines joined with `", "`.
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Build a snapshot from the individual address fields.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if a required field is blank or the pincode
    /// is not six digits.
    pub fn from_parts(
        full_name: &str,
        phone: &str,
        line1: &str,
        line2: Option<&str>,
        city: &str,
        state: &str,
        pincode: &str,
    ) -> Result<Self, AddressError> {
        let required = [
            ("full_name", full_name),
            ("phone", phone),
            ("address_line1", line1),
            ("city", city),
            ("state", state),
            ("pincode", pincode),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }
        validate_pincode(pincode)?;

        let address = match line2.map(str::trim).filter(|l| !l.is_empty()) {
            Some(line2) => format!("{}, {line2}", line1.trim()),
            None => line1.trim().to_owned(),
        };

        Ok(Self {
            full_name: full_name.trim().to_owned(),
            address,
            city: city.trim().to_owned(),
            state: state.trim().to_owned(),
            pincode: pincode.trim().to_owned(),
            phone: phone.trim().to_owned(),
        })
    }
}

/// Indian postal codes are exactly six digits.
///
/// # Errors
///
/// Returns [`AddressError::InvalidPincode`] otherwise.
pub fn validate_pincode(pincode: &str) -> Result<(), AddressError> {
    let pincode = pincode.trim();
    if pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AddressError::InvalidPincode)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_second_line() {
        let addr = ShippingAddress::from_parts(
            "Meera Shah",
            "9876543210",
            "12 MG Road",
            Some("Near Clock Tower"),
            "Jaipur",
            "Rajasthan",
            "302001",
        )
        .unwrap();
        assert_eq!(addr.address, "12 MG Road, Near Clock Tower");
    }

    #[test]
    fn test_blank_second_line_is_dropped() {
        let addr = ShippingAddress::from_parts(
            "Meera Shah",
            "9876543210",
            "12 MG Road",
            Some("   "),
            "Jaipur",
            "Rajasthan",
            "302001",
        )
        .unwrap();
        assert_eq!(addr.address, "12 MG Road");
    }

    #[test]
    fn test_missing_city() {
        let err = ShippingAddress::from_parts(
            "Meera Shah",
            "9876543210",
            "12 MG Road",
            None,
            "",
            "Rajasthan",
            "302001",
        )
        .unwrap_err();
        assert_eq!(err, AddressError::MissingField("city"));
    }

    #[test]
    fn test_pincode_rules() {
        assert!(validate_pincode("302001").is_ok());
        assert!(validate_pincode(" 302001 ").is_ok());
        assert_eq!(validate_pincode("30200"), Err(AddressError::InvalidPincode));
        assert_eq!(validate_pincode("30200A"), Err(AddressError::InvalidPincode));
    }

    #[test]
    fn test_json_shape() {
        let addr = ShippingAddress::from_parts(
            "A", "9876543210", "L1", None, "C", "S", "110001",
        )
        .unwrap();
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["full_name"], "A");
        assert_eq!(json["address"], "L1");
        assert_eq!(json["pincode"], "110001");
    }
}
