//! Integration tests for the admin API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`patra-cli migrate`)
//! - The storefront and admin servers running against it
//!
//! Run with: cargo test -p patra-integration-tests -- --ignored

use patra_integration_tests::{
    TEST_PASSWORD, admin_base_url, admin_client, client, pool, register_customer, seed_category,
    seed_product, unique_email,
};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_admin_requires_session() {
    let resp = client()
        .get(format!("{}/api/dashboard", admin_base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_customer_cannot_sign_in_to_admin() {
    let email = unique_email();
    register_customer(&client(), &email).await;

    let resp = client()
        .post(format!("{}/api/auth/login", admin_base_url()))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_demoted_admin_loses_access() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let base_url = admin_base_url();

    let me: Value = admin
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get me")
        .json()
        .await
        .expect("Failed to parse me");
    let id = me["user"]["id"].as_str().expect("admin id").to_owned();

    sqlx::query("UPDATE shop.profile SET role = 'customer' WHERE id = $1::uuid")
        .bind(&id)
        .execute(&pool)
        .await
        .expect("Failed to demote");

    let resp = admin
        .get(format!("{base_url}/api/dashboard"))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Catalog management
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_category_with_products_cannot_be_deleted() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let category = seed_category(&pool).await;
    seed_product(&pool, category, Decimal::new(650, 0), 2).await;

    let resp = admin
        .delete(format!("{}/api/categories/{category}", admin_base_url()))
        .send()
        .await
        .expect("Failed to delete category");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let still_there: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.category WHERE id = $1)")
            .bind(category)
            .fetch_one(&pool)
            .await
            .expect("Failed to check category");
    assert!(still_there);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_category_create_and_delete() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let base_url = admin_base_url();

    let resp = admin
        .post(format!("{base_url}/api/categories"))
        .json(&json!({ "name": format!("Kansa {}", unique_email()) }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category: Value = resp.json().await.expect("Failed to parse category");
    let id = category["id"].as_str().expect("category id");

    let resp = admin
        .delete(format!("{base_url}/api/categories/{id}"))
        .send()
        .await
        .expect("Failed to delete category");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin
        .get(format!("{base_url}/api/categories/{id}"))
        .send()
        .await
        .expect("Failed to get category");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and database"]
async fn test_mutations_are_logged() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let base_url = admin_base_url();

    let resp = admin
        .post(format!("{base_url}/api/categories"))
        .json(&json!({ "name": format!("Tamba {}", unique_email()) }))
        .send()
        .await
        .expect("Failed to create category");
    let category: Value = resp.json().await.expect("Failed to parse category");

    let activity: Value = admin
        .get(format!("{base_url}/api/activity"))
        .send()
        .await
        .expect("Failed to get activity")
        .json()
        .await
        .expect("Failed to parse activity");
    let logged = activity
        .as_array()
        .expect("activity array")
        .iter()
        .any(|entry| entry["entity_id"] == category["id"] && entry["action"] == "create");
    assert!(logged);
}
