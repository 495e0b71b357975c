//! Integration tests for back-office order handling.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`patra-cli migrate`)
//! - The storefront in manual payment mode and the admin server, both
//!   running against it
//!
//! Run with: cargo test -p patra-integration-tests -- --ignored

use patra_integration_tests::{
    add_to_cart, admin_base_url, admin_client, checkout, client, coupon_used_count, decimal,
    pool, register_customer, seed_category, seed_percentage_coupon, seed_product, stock,
    unique_email,
};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

/// A confirmed manual order for `quantity` units of `product`.
async fn place_manual_order(product: Uuid, quantity: i32, coupon_code: Option<&str>) -> Value {
    let shopper = client();
    register_customer(&shopper, &unique_email()).await;
    assert!(add_to_cart(&shopper, product, quantity).await.status().is_success());

    let resp = checkout(&shopper, coupon_code).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let placed: Value = resp.json().await.expect("Failed to parse order");
    placed["order"].clone()
}

async fn refund(admin: &Client, order_id: &str, amount: &str) -> reqwest::Response {
    admin
        .post(format!("{}/api/orders/{order_id}/refunds", admin_base_url()))
        .json(&json!({ "amount": amount, "reason": "Dented on arrival" }))
        .send()
        .await
        .expect("Failed to refund")
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_cancel_restocks_and_releases_coupon() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let product = seed_product(&pool, category, Decimal::new(800, 0), 5).await;
    let (coupon_id, code) = seed_percentage_coupon(&pool, 10, None).await;

    let order = place_manual_order(product, 2, Some(&code)).await;
    let order_id = order["id"].as_str().expect("order id");
    assert_eq!(stock(&pool, product).await, 3);
    assert_eq!(coupon_used_count(&pool, coupon_id).await, 1);

    let admin = admin_client(&pool).await;
    let url = format!("{}/api/orders/{order_id}/status", admin_base_url());

    let resp = admin
        .put(&url)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to cancel order");
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.expect("Failed to parse order");
    assert_eq!(cancelled["status"], "cancelled");

    assert_eq!(stock(&pool, product).await, 5);
    assert_eq!(coupon_used_count(&pool, coupon_id).await, 0);

    // Cancelled is terminal, so nothing is restocked twice.
    let resp = admin
        .put(&url)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .expect("Failed to cancel order");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stock(&pool, product).await, 5);
}

// ============================================================================
// Refunds
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_refunds_stay_within_order_total() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let product = seed_product(&pool, category, Decimal::new(1200, 0), 3).await;

    let order = place_manual_order(product, 1, None).await;
    let order_id = order["id"].as_str().expect("order id");
    assert_eq!(decimal(&order["total_amount"]), Decimal::new(1200, 0));

    let admin = admin_client(&pool).await;

    let resp = refund(&admin, order_id, "1500").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("refundable balance")),
        "unexpected error: {body}"
    );

    let resp = refund(&admin, order_id, "200").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let partial: Value = resp.json().await.expect("Failed to parse refund");
    assert_eq!(partial["order"]["status"], "confirmed");

    let resp = refund(&admin, order_id, "1000.01").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = refund(&admin, order_id, "1000").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let full: Value = resp.json().await.expect("Failed to parse refund");
    assert_eq!(full["order"]["status"], "refunded");
    assert_eq!(full["order"]["payment_status"], "refunded");
    assert_eq!(decimal(&full["refund"]["amount"]), Decimal::new(1000, 0));

    // Nothing left to refund.
    let resp = refund(&admin, order_id, "1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
