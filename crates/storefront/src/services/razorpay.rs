//! Razorpay API client.
//!
//! Creates gateway orders for the hosted checkout widget and verifies the
//! signature the widget hands back on success.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::RazorpayConfig;

/// Currency for every order.
pub const CURRENCY: &str = "INR";

/// Errors that can occur when talking to Razorpay.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Payment signature did not match.
    #[error("invalid payment signature")]
    InvalidSignature,
}

/// A gateway order as returned by `POST /orders`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
    api_base: String,
}

impl RazorpayClient {
    /// Create a new Razorpay client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig) -> Result<Self, RazorpayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// Public key id for the checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order for `amount` paise.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response is malformed.
    pub async fn create_order(
        &self,
        amount: i64,
        receipt: &str,
    ) -> Result<GatewayOrder, RazorpayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&CreateOrderRequest {
                amount,
                currency: CURRENCY,
                receipt,
            })
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RazorpayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RazorpayError::Parse(e.to_string()))
    }

    /// Check the `razorpay_signature` returned by the checkout widget.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError::InvalidSignature` on mismatch.
    pub fn verify_payment_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), RazorpayError> {
        let expected = payment_signature(
            self.key_secret.expose_secret().as_bytes(),
            gateway_order_id,
            payment_id,
        );
        if constant_time_compare(&expected, signature.trim()) {
            Ok(())
        } else {
            Err(RazorpayError::InvalidSignature)
        }
    }
}

/// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"`.
#[must_use]
pub fn payment_signature(secret: &[u8], gateway_order_id: &str, payment_id: &str) -> String {
    // HMAC accepts keys of any length
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
        return String::new();
    };
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER: &str = "order_IluGWxBm9U8zJ8";
    const PAYMENT: &str = "pay_IluGWxBm9U8zJ9";
    const SIGNATURE: &str = "8b2798bfd2e5872065dd6fad1093d49bc25c2f20a72af1e260bd0ed6f9f3c5a3";

    fn client() -> RazorpayClient {
        RazorpayClient::new(&RazorpayConfig {
            key_id: "rzp_test_key".to_owned(),
            key_secret: SecretString::from("test_secret"),
            api_base: "https://api.razorpay.com/v1/".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn test_payment_signature_known_vector() {
        assert_eq!(payment_signature(b"test_secret", ORDER, PAYMENT), SIGNATURE);
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        assert!(client().verify_payment_signature(ORDER, PAYMENT, SIGNATURE).is_ok());
    }

    #[test]
    fn test_verify_rejects_swapped_ids() {
        assert!(matches!(
            client().verify_payment_signature(PAYMENT, ORDER, SIGNATURE),
            Err(RazorpayError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_rejects_truncated_signature() {
        assert!(
            client()
                .verify_payment_signature(ORDER, PAYMENT, &SIGNATURE[..10])
                .is_err()
        );
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        assert_eq!(client().api_base, "https://api.razorpay.com/v1");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }
}
