//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email and password accounts
//! - `otp` - Phone sign-in with one-time codes
//! - `sms` - Delivery of those codes
//! - `cart` - Stock-checked cart writes
//! - `checkout` - Order placement and payment confirmation
//! - `razorpay` - Payment gateway client

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod otp;
pub mod razorpay;
pub mod sms;
