//! Business logic services for the back-office.
//!
//! # Services
//!
//! - `auth` - Email and password sign-in restricted to admins
//! - `orders` - Status changes and refunds
//! - `razorpay` - Razorpay refunds client
//! - `storage` - Object storage for product images

pub mod auth;
pub mod orders;
pub mod razorpay;
pub mod storage;

pub use auth::{AdminAuthError, AdminAuthService};
pub use orders::{OrderAdminError, OrderAdminService, RefundOutcome};
pub use razorpay::{RazorpayError, RazorpayRefunds};
pub use storage::{ImageUpload, ObjectStorage, StorageError};
