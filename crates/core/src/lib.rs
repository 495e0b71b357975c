//! Patra Core - shared domain types.
//!
//! Used by every Patra component:
//! - `storefront` - customer-facing API (catalog, cart, checkout)
//! - `admin` - back-office API for the merchant
//! - `cli` - migrations, catalog seeding and admin accounts
//!
//! # Architecture
//!
//! The core crate holds types and pure arithmetic. Apart from reading
//! environment variables in [`env`] it performs no I/O and knows nothing about
//! HTTP; database support is limited to `sqlx` type mappings behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`env`] - Environment variable readers and secret checks
//! - [`types`] - Type-safe IDs, email, phone, money, addresses and status enums
//! - [`pricing`] - Order line snapshots, coupon rules and order totals
//! - [`order_number`] - Human-readable order numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod env;
pub mod order_number;
pub mod pricing;
pub mod types;

pub use types::*;
