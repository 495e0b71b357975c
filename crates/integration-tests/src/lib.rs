//! Integration tests for Patra.
//!
//! These run against live servers and a migrated database, so every test
//! is `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations to a running database
//! cargo run -p patra-cli -- migrate
//!
//! # Start both servers with OTP_EXPOSE_CODE=true, then
//! cargo test -p patra-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - defaults to `http://localhost:3000`
//! - `ADMIN_BASE_URL` - defaults to `http://localhost:3001`
//! - `TEST_DATABASE_URL` or `DATABASE_URL` - the database both servers use
//! - `RAZORPAY_KEY_SECRET` - only for the payment callback tests

#![allow(clippy::missing_panics_doc)]

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Password used for every account the tests register.
pub const TEST_PASSWORD: &str = "kansa-thali-42";

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// HTTP client that keeps session cookies between requests.
///
/// Each client claims its own `x-forwarded-for` address, so the per-IP
/// sign-in limiter does not throttle a whole test run.
#[must_use]
pub fn client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&test_client_ip()).expect("IP is a valid header value"),
    );
    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A random address in 10.0.0.0/8.
fn test_client_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("10.{a}.{b}.{c}")
}

/// Connect to the database the servers are using.
pub async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database")
}

/// An email nobody else has used.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@patra.test", Uuid::new_v4().simple())
}

/// A ten-digit mobile number nobody else has used.
#[must_use]
pub fn unique_phone() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("9{n:09}")
}

/// Request a code for `phone` and verify it; the client ends up signed in.
///
/// Needs the storefront running with `OTP_EXPOSE_CODE=true`. Returns the
/// verify response.
pub async fn otp_sign_in(client: &Client, phone: &str) -> reqwest::Response {
    let base_url = storefront_base_url();
    let sent: Value = client
        .post(format!("{base_url}/api/otp/send"))
        .json(&json!({ "phone": phone }))
        .send()
        .await
        .expect("Failed to send OTP")
        .json()
        .await
        .expect("Failed to parse send response");
    let code = sent["debug_otp"]
        .as_str()
        .expect("debug_otp is returned when OTP_EXPOSE_CODE=true")
        .to_owned();

    client
        .post(format!("{base_url}/api/otp/verify"))
        .json(&json!({ "phone": phone, "otp": code }))
        .send()
        .await
        .expect("Failed to verify OTP")
}

/// Register a shopper on the storefront; the client ends up signed in.
///
/// Returns the new profile.
pub async fn register_customer(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/api/auth/register", storefront_base_url()))
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "full_name": "Test Shopper",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert!(resp.status().is_success(), "register: {}", resp.status());

    let body: Value = resp.json().await.expect("Failed to parse register body");
    body["user"].clone()
}

/// Register an account, grant it the admin role and sign in to the admin.
///
/// Returns the signed-in admin client.
pub async fn admin_client(pool: &PgPool) -> Client {
    let email = unique_email();
    register_customer(&client(), &email).await;

    sqlx::query("UPDATE shop.profile SET role = 'admin' WHERE email = $1")
        .bind(&email)
        .execute(pool)
        .await
        .expect("Failed to promote test admin");

    let admin = client();
    let resp = admin
        .post(format!("{}/api/auth/login", admin_base_url()))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to sign in to admin");
    assert!(resp.status().is_success(), "admin login: {}", resp.status());
    admin
}

/// A category created directly in the database.
pub async fn seed_category(pool: &PgPool) -> Uuid {
    sqlx::query_scalar("INSERT INTO shop.category (name) VALUES ($1) RETURNING id")
        .bind(format!("Test Category {}", Uuid::new_v4().simple()))
        .fetch_one(pool)
        .await
        .expect("Failed to insert category")
}

/// An active product created directly in the database.
pub async fn seed_product(pool: &PgPool, category_id: Uuid, price: Decimal, stock: i32) -> Uuid {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.product (name, price, stock_quantity, category_id, sku)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(format!("Test Lota {}", Uuid::new_v4().simple()))
    .bind(price)
    .bind(stock)
    .bind(category_id)
    .bind(format!("TEST-{}", Uuid::new_v4().simple()))
    .fetch_one(pool)
    .await
    .expect("Failed to insert product")
}

/// A product's current stock.
pub async fn stock(pool: &PgPool, product_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM shop.product WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read stock")
}

/// An active percentage coupon created directly in the database.
///
/// Returns its id and code.
pub async fn seed_percentage_coupon(
    pool: &PgPool,
    percent: i64,
    usage_limit: Option<i32>,
) -> (Uuid, String) {
    let code = format!("TEST{}", Uuid::new_v4().simple()).to_uppercase();
    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.coupon (code, coupon_type, value, usage_limit)
        VALUES ($1, 'percentage', $2, $3)
        RETURNING id
        ",
    )
    .bind(&code)
    .bind(Decimal::from(percent))
    .bind(usage_limit)
    .fetch_one(pool)
    .await
    .expect("Failed to insert coupon");
    (id, code)
}

/// How many orders have used a coupon.
pub async fn coupon_used_count(pool: &PgPool, coupon_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT used_count FROM shop.coupon WHERE id = $1")
        .bind(coupon_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read coupon")
}

/// Check out the signed-in shopper's cart to the test address.
pub async fn checkout(client: &Client, coupon_code: Option<&str>) -> reqwest::Response {
    client
        .post(format!("{}/api/checkout", storefront_base_url()))
        .json(&json!({ "address": test_address(), "coupon_code": coupon_code }))
        .send()
        .await
        .expect("Failed to place order")
}

/// Add `quantity` of a product to the signed-in shopper's cart.
pub async fn add_to_cart(client: &Client, product_id: Uuid, quantity: i32) -> reqwest::Response {
    client
        .post(format!("{}/api/cart", storefront_base_url()))
        .json(&json!({ "product_id": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart")
}

/// A shipping address accepted by checkout.
#[must_use]
pub fn test_address() -> Value {
    json!({
        "full_name": "Test Shopper",
        "phone": "9876543210",
        "address_line1": "12 Thatheri Bazar",
        "city": "Varanasi",
        "state": "Uttar Pradesh",
        "pincode": "221001",
    })
}

/// Parse a decimal the API serialized as a string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("Decimal should be serialized as a string")
        .parse()
        .expect("Invalid decimal")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_phone_is_ten_digits() {
        let phone = unique_phone();
        assert_eq!(phone.len(), 10);
        assert!(phone.starts_with('9'));
        assert!(phone.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_client_ip_is_private() {
        let ip: std::net::Ipv4Addr = test_client_ip().parse().unwrap();
        assert!(ip.is_private());
    }

    #[test]
    fn test_decimal_parses_string() {
        assert_eq!(decimal(&json!("450.50")), Decimal::new(45050, 2));
    }
}
