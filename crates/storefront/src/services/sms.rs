//! SMS delivery for one-time codes.
//!
//! With a provider configured, messages are POSTed as a form to a
//! Twilio-compatible endpoint using basic auth. Without one, the code is
//! written to the log so development sign-ins still work.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use patra_core::Phone;

use crate::config::SmsConfig;

/// Errors that can occur when sending an SMS.
#[derive(Debug, Error)]
pub enum SmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the message.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Where one-time codes go.
#[derive(Clone)]
pub enum SmsSender {
    /// A Twilio-compatible HTTP gateway.
    Http(HttpSms),
    /// Log the message instead of sending it.
    Log,
}

/// HTTP SMS gateway client.
#[derive(Clone)]
pub struct HttpSms {
    client: reqwest::Client,
    provider_url: String,
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

impl SmsSender {
    /// Build a sender from optional configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: Option<&SmsConfig>) -> Result<Self, SmsError> {
        let Some(config) = config else {
            return Ok(Self::Log);
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self::Http(HttpSms {
            client,
            provider_url: config.provider_url.clone(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
        }))
    }

    /// Whether messages are only logged.
    #[must_use]
    pub const fn is_log_only(&self) -> bool {
        matches!(self, Self::Log)
    }

    /// Send `body` to `to`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    pub async fn send(&self, to: &Phone, body: &str) -> Result<(), SmsError> {
        match self {
            Self::Log => {
                tracing::info!(phone = %to, message = %body, "SMS delivery disabled, logging message");
                Ok(())
            }
            Self::Http(http) => http.send(to, body).await,
        }
    }
}

impl HttpSms {
    async fn send(&self, to: &Phone, body: &str) -> Result<(), SmsError> {
        let to_e164 = to.e164();
        let params = [("To", to_e164.as_str()), ("From", self.from.as_str()), ("Body", body)];

        let response = self
            .client
            .post(&self.provider_url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SmsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(phone = %to, "SMS sent");
        Ok(())
    }
}

/// The message text for a sign-in code.
#[must_use]
pub fn otp_message(store_name: &str, code: &str, ttl_minutes: i64) -> String {
    format!("{code} is your {store_name} verification code. It expires in {ttl_minutes} minutes.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_without_config_logs_only() {
        assert!(SmsSender::from_config(None).unwrap().is_log_only());
    }

    #[test]
    fn test_with_config_uses_http() {
        let config = SmsConfig {
            provider_url: "https://sms.invalid/Messages.json".to_owned(),
            account_sid: "AC1".to_owned(),
            auth_token: SecretString::from("tok"),
            from: "PATRA".to_owned(),
        };
        assert!(!SmsSender::from_config(Some(&config)).unwrap().is_log_only());
    }

    #[test]
    fn test_otp_message() {
        assert_eq!(
            otp_message("Patra", "123456", 10),
            "123456 is your Patra verification code. It expires in 10 minutes."
        );
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let phone = Phone::parse("9876543210").unwrap();
        assert!(SmsSender::Log.send(&phone, "hello").await.is_ok());
    }
}
