//! Domain models for the back-office.
//!
//! Row types derive `sqlx::FromRow` and `Serialize`. Input types derive
//! `Deserialize` and carry their own validation, so handlers only ever pass
//! checked values to the repositories.

pub mod activity;
pub mod catalog;
pub mod coupon;
pub mod dashboard;
pub mod order;
pub mod profile;
pub mod session;
pub mod settings;

pub use activity::{ActivityEntry, NewActivity};
pub use catalog::{
    Category, CategoryInput, CategoryInputError, Product, ProductInput, ProductInputError,
    ProductListQuery,
};
pub use coupon::{Coupon, CouponInput, CouponInputError, CouponView};
pub use dashboard::{DashboardStats, RecentOrder, RecentProduct};
pub use order::{AdminOrder, Order, OrderItem, OrderListQuery, Refund};
pub use profile::{CustomerSummary, Profile};
pub use session::{CurrentAdmin, keys as session_keys};
pub use settings::{KNOWN_SETTING_KEYS, Setting};
