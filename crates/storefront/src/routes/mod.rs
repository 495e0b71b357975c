//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (strict rate limit)
//! POST   /api/auth/register
//! POST   /api/auth/login
//! POST   /api/auth/logout
//! GET    /api/auth/me
//! POST   /api/otp/send
//! POST   /api/otp/verify
//!
//! # Catalog
//! GET    /api/categories
//! GET    /api/products                 ?search&category&min_price&max_price&sort&page&per_page
//! GET    /api/products/featured
//! GET    /api/products/{id}
//!
//! # Cart (requires auth)
//! GET    /api/cart
//! GET    /api/cart/count
//! POST   /api/cart
//! DELETE /api/cart
//! PUT    /api/cart/{product_id}
//! DELETE /api/cart/{product_id}
//!
//! # Wishlist (requires auth)
//! GET    /api/wishlist
//! POST   /api/wishlist
//! DELETE /api/wishlist/{product_id}
//! POST   /api/wishlist/{product_id}/move-to-cart
//!
//! # Account (requires auth)
//! GET    /api/account/profile
//! PUT    /api/account/profile
//! GET    /api/account/addresses
//! POST   /api/account/addresses
//! PUT    /api/account/addresses/{id}
//! DELETE /api/account/addresses/{id}
//! POST   /api/account/addresses/{id}/default
//!
//! # Checkout and orders (requires auth)
//! GET    /api/checkout/summary?coupon=CODE
//! POST   /api/checkout
//! POST   /api/checkout/payment
//! GET    /api/orders
//! GET    /api/orders/{id}
//! POST   /api/orders/{id}/payment
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod otp;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Sign-in routes, behind the strict limiter.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/otp/send", post(otp::send))
        .route("/otp/verify", post(otp::verify))
        .layer(auth_rate_limiter())
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(products::categories))
        .route("/products", get(products::index))
        .route("/products/featured", get(products::featured))
        .route("/products/{id}", get(products::show))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/{product_id}", put(cart::update).delete(cart::remove))
}

fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index).post(wishlist::add))
        .route("/{product_id}", axum::routing::delete(wishlist::remove))
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).put(account::update_profile),
        )
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/default", post(account::set_default_address))
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .route("/summary", get(checkout::summary))
        .route("/payment", post(checkout::confirm_payment))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/payment", post(checkout::resume_payment))
}

/// Create all `/api` routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/account", account_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .layer(api_rate_limiter())
        .merge(auth_routes());

    Router::new().nest("/api", api)
}
