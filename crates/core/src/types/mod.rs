//! Core types for Patra.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use address::{AddressError, ShippingAddress, validate_pincode};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MoneyError, format_inr, from_minor_units, round_rupees, to_minor_units};
pub use phone::{Phone, PhoneError};
pub use status::*;
