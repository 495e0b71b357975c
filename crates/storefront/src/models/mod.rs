//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and `Serialize`; they are returned to
//! shoppers as JSON more or less as stored.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod profile;
pub mod session;
pub mod wishlist;

pub use address::{Address, AddressInput};
pub use cart::{CartLine, CartView};
pub use catalog::{Category, Product, ProductFilter, ProductSort};
pub use order::{CouponRow, Order, OrderItem, OrderSummary};
pub use profile::Profile;
pub use session::{CurrentUser, keys as session_keys};
pub use wishlist::WishlistLine;
