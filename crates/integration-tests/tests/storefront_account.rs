//! Integration tests for sign-in, phone OTP and the wishlist.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`patra-cli migrate`)
//! - The storefront running with `OTP_EXPOSE_CODE=true`
//!
//! Run with: cargo test -p patra-integration-tests -- --ignored

use patra_integration_tests::{
    TEST_PASSWORD, client, otp_sign_in, pool, register_customer, seed_category, seed_product,
    storefront_base_url, unique_email, unique_phone,
};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

// ============================================================================
// Email and password
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_register_then_login() {
    let email = unique_email();
    register_customer(&client(), &email).await;

    let shopper = client();
    let resp = shopper
        .post(format!("{}/api/auth/login", storefront_base_url()))
        .json(&json!({ "email": email.to_uppercase(), "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let me: Value = shopper
        .get(format!("{}/api/auth/me", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get me")
        .json()
        .await
        .expect("Failed to parse me");
    assert_eq!(me["user"]["email"], email);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_duplicate_registration_conflicts() {
    let email = unique_email();
    register_customer(&client(), &email).await;

    let resp = client()
        .post(format!("{}/api/auth/register", storefront_base_url()))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_wrong_password_is_unauthorized() {
    let email = unique_email();
    register_customer(&client(), &email).await;

    let resp = client()
        .post(format!("{}/api/auth/login", storefront_base_url()))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Invalid email or password");
}

// ============================================================================
// Phone OTP
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront with OTP_EXPOSE_CODE=true"]
async fn test_otp_signs_in_once() {
    let shopper = client();
    let phone = unique_phone();
    let base_url = storefront_base_url();

    let sent: Value = shopper
        .post(format!("{base_url}/api/otp/send"))
        .json(&json!({ "phone": phone }))
        .send()
        .await
        .expect("Failed to send OTP")
        .json()
        .await
        .expect("Failed to parse send response");
    assert_eq!(sent["success"], true);
    let code = sent["debug_otp"]
        .as_str()
        .expect("debug_otp is returned when OTP_EXPOSE_CODE=true")
        .to_owned();
    assert_eq!(code.len(), 6);

    let resp = shopper
        .post(format!("{base_url}/api/otp/verify"))
        .json(&json!({ "phone": phone, "otp": code }))
        .send()
        .await
        .expect("Failed to verify OTP");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse verify response");
    assert_eq!(body["user"]["role"], "customer");

    let resp = shopper
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get me");
    assert_eq!(resp.status(), StatusCode::OK);

    // A code only works once.
    let resp = client()
        .post(format!("{base_url}/api/otp/verify"))
        .json(&json!({ "phone": phone, "otp": code }))
        .send()
        .await
        .expect("Failed to verify OTP");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
#[ignore = "Requires running storefront with OTP_EXPOSE_CODE=true"]
async fn test_otp_sign_in_after_phone_cleared() {
    let phone = unique_phone();
    let shopper = client();

    let resp = otp_sign_in(&shopper, &phone).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first: Value = resp.json().await.expect("Failed to parse verify response");
    let user_id = first["user"]["id"].clone();

    let resp = shopper
        .put(format!("{}/api/account/profile", storefront_base_url()))
        .json(&json!({ "phone": "" }))
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::OK);
    let profile: Value = resp.json().await.expect("Failed to parse profile");
    assert!(profile["phone"].is_null());
    assert_eq!(profile["full_name"], first["user"]["full_name"]);

    // The placeholder account is reclaimed rather than duplicated.
    let resp = otp_sign_in(&client(), &phone).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let again: Value = resp.json().await.expect("Failed to parse verify response");
    assert_eq!(again["user"]["id"], user_id);
    assert_eq!(again["user"]["phone"], phone.as_str());
}

#[tokio::test]
#[ignore = "Requires running storefront with OTP_EXPOSE_CODE=true"]
async fn test_otp_phone_formats_share_one_account() {
    let phone = unique_phone();

    let resp = otp_sign_in(&client(), &format!("+91 {phone}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let with_plus: Value = resp.json().await.expect("Failed to parse verify response");

    let resp = otp_sign_in(&client(), &format!("91{phone}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bare: Value = resp.json().await.expect("Failed to parse verify response");

    assert_eq!(with_plus["user"]["id"], bare["user"]["id"]);
    assert_eq!(bare["user"]["phone"], format!("91{phone}"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_profile_update_keeps_omitted_fields() {
    let shopper = client();
    register_customer(&shopper, &unique_email()).await;
    let url = format!("{}/api/account/profile", storefront_base_url());
    let phone = unique_phone();

    let profile: Value = shopper
        .put(&url)
        .json(&json!({ "phone": phone }))
        .send()
        .await
        .expect("Failed to update profile")
        .json()
        .await
        .expect("Failed to parse profile");
    assert_eq!(profile["full_name"], "Test Shopper");
    assert_eq!(profile["phone"], phone.as_str());

    let profile: Value = shopper
        .put(&url)
        .json(&json!({ "full_name": "Asha Verma" }))
        .send()
        .await
        .expect("Failed to update profile")
        .json()
        .await
        .expect("Failed to parse profile");
    assert_eq!(profile["full_name"], "Asha Verma");
    assert_eq!(profile["phone"], phone.as_str());
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_otp_requires_phone() {
    let resp = client()
        .post(format!("{}/api/otp/send", storefront_base_url()))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send OTP");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Phone number is required");
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_wishlist_duplicate_add_conflicts() {
    let pool = pool().await;
    let category = seed_category(&pool).await;
    let product = seed_product(&pool, category, Decimal::new(799, 0), 4).await;

    let shopper = client();
    register_customer(&shopper, &unique_email()).await;
    let url = format!("{}/api/wishlist", storefront_base_url());

    let resp = shopper
        .post(&url)
        .json(&json!({ "product_id": product }))
        .send()
        .await
        .expect("Failed to add to wishlist");
    assert!(resp.status().is_success());

    let resp = shopper
        .post(&url)
        .json(&json!({ "product_id": product }))
        .send()
        .await
        .expect("Failed to add to wishlist");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let list: Value = shopper
        .get(&url)
        .send()
        .await
        .expect("Failed to get wishlist")
        .json()
        .await
        .expect("Failed to parse wishlist");
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}
