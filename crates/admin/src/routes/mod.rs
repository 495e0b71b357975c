//! HTTP route handlers for the back-office.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/login
//! POST   /api/auth/logout
//! GET    /api/auth/me
//!
//! # Dashboard
//! GET    /api/dashboard
//!
//! # Catalog
//! GET    /api/products                 ?search&status
//! POST   /api/products
//! GET    /api/products/{id}
//! PUT    /api/products/{id}
//! DELETE /api/products/{id}
//! POST   /api/products/{id}/images     multipart
//! DELETE /api/products/{id}/images     ?url=
//! GET    /api/categories
//! POST   /api/categories
//! GET    /api/categories/{id}
//! PUT    /api/categories/{id}
//! DELETE /api/categories/{id}
//!
//! # Orders
//! GET    /api/orders                   ?status
//! GET    /api/orders/{id}
//! PUT    /api/orders/{id}/status
//! POST   /api/orders/{id}/refunds
//!
//! # Customers, coupons, settings
//! GET    /api/customers
//! PUT    /api/customers/{id}/role
//! GET    /api/coupons
//! POST   /api/coupons
//! PUT    /api/coupons/{id}
//! DELETE /api/coupons/{id}
//! GET    /api/settings
//! PUT    /api/settings/{key}
//!
//! # Audit
//! GET    /api/activity
//! ```
//!
//! Everything except login requires an admin session.

pub mod activity;
pub mod auth;
pub mod categories;
pub mod coupons;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Create all `/api` routes for the back-office.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(orders::router())
        .merge(customers::router())
        .merge(coupons::router())
        .merge(settings::router())
        .merge(activity::router());

    Router::new().nest("/api", api)
}
