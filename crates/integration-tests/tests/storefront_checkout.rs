//! Integration tests for cart, checkout and payment confirmation.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`patra-cli migrate`)
//! - The storefront running against it
//! - `RAZORPAY_KEY_SECRET` matching the storefront's, for the payment tests
//!
//! Run with: cargo test -p patra-integration-tests -- --ignored

use hmac::{Hmac, Mac};
use patra_integration_tests::{
    add_to_cart, checkout, client, coupon_used_count, decimal, pool, register_customer,
    seed_category, seed_percentage_coupon, seed_product, stock, storefront_base_url,
    test_address, unique_email,
};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;

fn sign_payment(secret: &str, gateway_order_id: &str, payment_id: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{gateway_order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A pending Razorpay order for `email`, written straight to the database.
async fn pending_gateway_order(pool: &PgPool, email: &str) -> (Uuid, String) {
    let gateway_order_id = format!("order_test_{}", Uuid::new_v4().simple());
    let id: Uuid = sqlx::query_scalar(
        r"
        INSERT INTO shop.orders
            (order_number, user_id, payment_method, shipping_address,
             subtotal_amount, total_amount, razorpay_order_id)
        SELECT $1, id, 'razorpay'::shop.payment_method, $2, 500, 500, $3
        FROM shop.profile WHERE email = $4
        RETURNING id
        ",
    )
    .bind(format!("TEST-{}", Uuid::new_v4().simple()))
    .bind(json!({
        "full_name": "Test Shopper",
        "address": "12 Thatheri Bazar",
        "city": "Varanasi",
        "state": "Uttar Pradesh",
        "pincode": "221001",
        "phone": "+919876543210",
    }))
    .bind(&gateway_order_id)
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("Failed to insert order");
    (id, gateway_order_id)
}

/// Put `quantity` of `product_id` on a pending order, as checkout would.
async fn hold_on_order(pool: &PgPool, order_id: Uuid, product_id: Uuid, quantity: i32) {
    sqlx::query(
        r"
        INSERT INTO shop.order_item (order_id, product_id, product_name, quantity, price, total_price)
        SELECT $1, id, name, $3, price, price * $3 FROM shop.product WHERE id = $2
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await
    .expect("Failed to insert order item");
}

async fn order_state(pool: &PgPool, order_id: Uuid) -> (String, String) {
    sqlx::query_as("SELECT status::text, payment_status::text FROM shop.orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read order")
}

async fn cart_count(client: &Client) -> i64 {
    let body: Value = client
        .get(format!("{}/api/cart/count", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get cart count")
        .json()
        .await
        .expect("Failed to parse cart count");
    body["count"].as_i64().expect("count is a number")
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_rejects_quantity_above_stock() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let product = seed_product(&pool, category, Decimal::new(450, 0), 3).await;

    let shopper = client();
    register_customer(&shopper, &unique_email()).await;

    let resp = add_to_cart(&shopper, product, 5).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Only 3 items available");

    let resp = add_to_cart(&shopper, product, 3).await;
    assert!(resp.status().is_success());
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cart_requires_sign_in() {
    let resp = client()
        .get(format!("{}/api/cart", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_copies_every_cart_line() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let prices = [Decimal::new(45000, 2), Decimal::new(120_000, 2), Decimal::new(89950, 2)];
    let mut products = Vec::new();
    for price in prices {
        products.push(seed_product(&pool, category, price, 10).await);
    }

    let shopper = client();
    register_customer(&shopper, &unique_email()).await;
    for (i, product) in products.iter().enumerate() {
        let quantity = i32::try_from(i).expect("small index") + 1;
        assert!(add_to_cart(&shopper, *product, quantity).await.status().is_success());
    }

    let resp = shopper
        .post(format!("{}/api/checkout", storefront_base_url()))
        .json(&json!({ "address": test_address() }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.expect("Failed to parse order");

    let items = placed["items"].as_array().expect("items array");
    assert_eq!(items.len(), products.len());

    let lines: Decimal = items.iter().map(|item| decimal(&item["total_price"])).sum();
    let order = &placed["order"];
    assert_eq!(lines, decimal(&order["subtotal_amount"]));
    assert_eq!(
        decimal(&order["total_amount"]),
        lines - decimal(&order["discount_amount"])
            + decimal(&order["shipping_amount"])
            + decimal(&order["tax_amount"])
    );

    // Stock is held by the order.
    let stock: i32 = sqlx::query_scalar("SELECT stock_quantity FROM shop.product WHERE id = $1")
        .bind(products.first().expect("three products"))
        .fetch_one(&pool)
        .await
        .expect("Failed to read stock");
    assert_eq!(stock, 9);
}

#[tokio::test]
#[ignore = "Requires running storefront in manual payment mode"]
async fn test_manual_checkout_clears_cart() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let product = seed_product(&pool, category, Decimal::new(650, 0), 5).await;

    let shopper = client();
    register_customer(&shopper, &unique_email()).await;
    assert!(add_to_cart(&shopper, product, 2).await.status().is_success());
    assert_eq!(cart_count(&shopper).await, 2);

    let resp = checkout(&shopper, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(placed["order"]["status"], "confirmed");
    assert_eq!(placed["order"]["payment_method"], "manual");
    assert!(placed["payment"].is_null());

    assert_eq!(cart_count(&shopper).await, 0);
    assert_eq!(stock(&pool, product).await, 3);
}

#[tokio::test]
#[ignore = "Requires running storefront in manual payment mode"]
async fn test_coupon_discount_and_usage_limit() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let product = seed_product(&pool, category, Decimal::new(1000, 0), 10).await;
    let (coupon_id, code) = seed_percentage_coupon(&pool, 10, Some(1)).await;

    let first = client();
    register_customer(&first, &unique_email()).await;
    assert!(add_to_cart(&first, product, 1).await.status().is_success());

    let resp = checkout(&first, Some(&code)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.expect("Failed to parse order");
    let order = &placed["order"];
    assert_eq!(decimal(&order["subtotal_amount"]), Decimal::new(1000, 0));
    assert_eq!(decimal(&order["discount_amount"]), Decimal::new(100, 0));
    assert_eq!(decimal(&order["total_amount"]), Decimal::new(900, 0));
    assert_eq!(order["coupon_id"], coupon_id.to_string());
    assert_eq!(coupon_used_count(&pool, coupon_id).await, 1);

    // The single use is spent.
    let second = client();
    register_customer(&second, &unique_email()).await;
    assert!(add_to_cart(&second, product, 1).await.status().is_success());

    let resp = checkout(&second, Some(&code)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "coupon usage limit reached");

    assert_eq!(coupon_used_count(&pool, coupon_id).await, 1);
    assert_eq!(stock(&pool, product).await, 9);
    assert_eq!(cart_count(&second).await, 1);
}

#[tokio::test]
#[ignore = "Requires running storefront in manual payment mode"]
async fn test_concurrent_checkouts_with_crossed_carts() {
    const ROUNDS: i32 = 5;

    let pool = pool().await;
    let category = seed_category(&pool).await;
    let p1 = seed_product(&pool, category, Decimal::new(300, 0), 2 * ROUNDS).await;
    let p2 = seed_product(&pool, category, Decimal::new(500, 0), 2 * ROUNDS).await;

    let a = client();
    let b = client();
    register_customer(&a, &unique_email()).await;
    register_customer(&b, &unique_email()).await;

    for _ in 0..ROUNDS {
        // Same products, opposite cart order.
        assert!(add_to_cart(&a, p1, 1).await.status().is_success());
        assert!(add_to_cart(&a, p2, 1).await.status().is_success());
        assert!(add_to_cart(&b, p2, 1).await.status().is_success());
        assert!(add_to_cart(&b, p1, 1).await.status().is_success());

        let (ra, rb) = tokio::join!(checkout(&a, None), checkout(&b, None));
        assert_eq!(ra.status(), StatusCode::CREATED);
        assert_eq!(rb.status(), StatusCode::CREATED);
    }

    assert_eq!(stock(&pool, p1).await, 0);
    assert_eq!(stock(&pool, p2).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_with_empty_cart() {
    let shopper = client();
    register_customer(&shopper, &unique_email()).await;

    let resp = shopper
        .post(format!("{}/api/checkout", storefront_base_url()))
        .json(&json!({ "address": test_address() }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Cart is empty");
}

// ============================================================================
// Payment callback
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront in razorpay mode and RAZORPAY_KEY_SECRET"]
async fn test_payment_confirmed_exactly_once() {
    let secret = std::env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET must be set");
    let pool = pool().await;
    let email = unique_email();
    let shopper = client();
    register_customer(&shopper, &email).await;

    let (order_id, gateway_order_id) = pending_gateway_order(&pool, &email).await;
    let payment_id = format!("pay_test_{}", Uuid::new_v4().simple());
    let callback = json!({
        "order_id": order_id,
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": sign_payment(&secret, &gateway_order_id, &payment_id),
    });

    let mut confirmations = Vec::new();
    for _ in 0..2 {
        let resp = shopper
            .post(format!("{}/api/checkout/payment", storefront_base_url()))
            .json(&callback)
            .send()
            .await
            .expect("Failed to confirm payment");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("Failed to parse outcome");
        assert_eq!(body["order"]["status"], "confirmed");
        assert_eq!(body["order"]["payment_status"], "completed");
        confirmations.push(body["already_confirmed"].as_bool().expect("bool flag"));
    }
    assert_eq!(confirmations, vec![false, true]);
}

#[tokio::test]
#[ignore = "Requires running storefront in razorpay mode and RAZORPAY_KEY_SECRET"]
async fn test_payment_with_bad_signature_fails() {
    let pool = pool().await;
    let email = unique_email();
    let shopper = client();
    register_customer(&shopper, &email).await;

    let (order_id, gateway_order_id) = pending_gateway_order(&pool, &email).await;
    let resp = shopper
        .post(format!("{}/api/checkout/payment", storefront_base_url()))
        .json(&json!({
            "order_id": order_id,
            "razorpay_order_id": gateway_order_id,
            "razorpay_payment_id": "pay_forged",
            "razorpay_signature": "00",
        }))
        .send()
        .await
        .expect("Failed to confirm payment");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let payment_status: String =
        sqlx::query_scalar("SELECT payment_status::text FROM shop.orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read order");
    assert_eq!(payment_status, "failed");
}

// ============================================================================
// Unpaid gateway orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront in razorpay mode"]
async fn test_resume_payment_reuses_gateway_order() {
    let pool = pool().await;
    let email = unique_email();
    let shopper = client();
    register_customer(&shopper, &email).await;

    let (order_id, gateway_order_id) = pending_gateway_order(&pool, &email).await;
    let url = format!("{}/api/orders/{order_id}/payment", storefront_base_url());

    let resp = shopper.post(&url).send().await.expect("Failed to resume payment");
    assert_eq!(resp.status(), StatusCode::OK);
    let payment: Value = resp.json().await.expect("Failed to parse payment");
    assert_eq!(payment["gateway_order_id"], gateway_order_id.as_str());
    assert_eq!(payment["amount"], 50_000);
    assert_eq!(payment["currency"], "INR");

    // Someone else's order is invisible.
    let stranger = client();
    register_customer(&stranger, &unique_email()).await;
    let resp = stranger.post(&url).send().await.expect("Failed to resume payment");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    sqlx::query("UPDATE shop.orders SET status = 'cancelled' WHERE id = $1")
        .bind(order_id)
        .execute(&pool)
        .await
        .expect("Failed to cancel order");
    let resp = shopper.post(&url).send().await.expect("Failed to resume payment");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront in razorpay mode"]
async fn test_new_checkout_releases_unpaid_order() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    // Two of three units are held by the unpaid order below.
    let product = seed_product(&pool, category, Decimal::new(250, 0), 1).await;
    let (coupon_id, code) = seed_percentage_coupon(&pool, 100, None).await;

    let email = unique_email();
    let shopper = client();
    register_customer(&shopper, &email).await;

    let (stale_id, _) = pending_gateway_order(&pool, &email).await;
    hold_on_order(&pool, stale_id, product, 2).await;
    sqlx::query("UPDATE shop.orders SET coupon_id = $2 WHERE id = $1")
        .bind(stale_id)
        .bind(coupon_id)
        .execute(&pool)
        .await
        .expect("Failed to attach coupon");
    sqlx::query("UPDATE shop.coupon SET used_count = 1 WHERE id = $1")
        .bind(coupon_id)
        .execute(&pool)
        .await
        .expect("Failed to count coupon use");

    assert!(add_to_cart(&shopper, product, 1).await.status().is_success());

    // Fully discounted, so no gateway order is created.
    let resp = checkout(&shopper, Some(&code)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(placed["order"]["status"], "confirmed");

    let (status, payment_status) = order_state(&pool, stale_id).await;
    assert_eq!(status, "cancelled");
    assert_eq!(payment_status, "failed");
    assert_eq!(stock(&pool, product).await, 2);
    assert_eq!(coupon_used_count(&pool, coupon_id).await, 1);
}
