//! Razorpay refunds.
//!
//! The back-office only ever returns money, through
//! `POST /payments/{payment_id}/refund`.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RazorpayConfig;

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
}

/// A refund as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    pub payment_id: String,
    /// Paise.
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    amount: i64,
    notes: RefundNotes<'a>,
}

#[derive(Debug, Serialize)]
struct RefundNotes<'a> {
    order_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Razorpay refunds client.
#[derive(Clone)]
pub struct RazorpayRefunds {
    client: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
    api_base: String,
}

impl RazorpayRefunds {
    /// Create a new refunds client.
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

    /// Refund `amount` paise of a captured payment.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response is malformed.
    pub async fn refund(
        &self,
        payment_id: &str,
        amount: i64,
        order_number: &str,
        reason: Option<&str>,
    ) -> Result<GatewayRefund, RazorpayError> {
        let response = self
            .client
            .post(self.refund_url(payment_id))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&RefundRequest {
                amount,
                notes: RefundNotes {
                    order_number,
                    reason,
                },
            })
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "Razorpay refund rejected");
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

    fn refund_url(&self, payment_id: &str) -> String {
        format!("{}/payments/{payment_id}/refund", self.api_base)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_refund_url() {
        let client = RazorpayRefunds::new(&RazorpayConfig {
            key_id: "rzp_test_key".to_owned(),
            key_secret: SecretString::from("rzp-secret-value"),
            api_base: "https://api.razorpay.com/v1/".to_owned(),
        })
        .unwrap();
        assert_eq!(
            client.refund_url("pay_29QQoUBi66xm2f"),
            "https://api.razorpay.com/v1/payments/pay_29QQoUBi66xm2f/refund"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(RefundRequest {
            amount: 50_000,
            notes: RefundNotes {
                order_number: "ORD171234567890107",
                reason: None,
            },
        })
        .unwrap();
        assert_eq!(body["amount"], 50_000);
        assert_eq!(body["notes"]["order_number"], "ORD171234567890107");
        assert!(body["notes"].get("reason").is_none());
    }

    #[test]
    fn test_refund_response_parses() {
        let json = r#"{"id":"rfnd_FP8QHiV938haTz","entity":"refund","amount":50000,
                       "currency":"INR","payment_id":"pay_29QQoUBi66xm2f",
                       "status":"processed","speed_processed":"normal"}"#;
        let refund: GatewayRefund = serde_json::from_str(json).unwrap();
        assert_eq!(refund.id, "rfnd_FP8QHiV938haTz");
        assert_eq!(refund.amount, 50_000);
    }
}
