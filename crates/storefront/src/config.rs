//! Storefront settings, read once at startup from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) | required |
//! | `STOREFRONT_BASE_URL` | required |
//! | `STOREFRONT_SESSION_SECRET` | required, 32+ random chars; signs the session cookie |
//! | `STOREFRONT_HOST` / `STOREFRONT_PORT` | `0.0.0.0` / `3000` |
//! | `STORE_NAME` | `Shivpuriya Patra Bhandar` |
//! | `PAYMENT_MODE` | `manual` (or `razorpay`) |
//! | `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET` | required for `razorpay` |
//! | `OTP_TTL_MINUTES` | `10` |
//! | `OTP_EXPOSE_CODE` | `false`; echoes codes back, development only |
//! | `SMS_PROVIDER_URL`, `SMS_ACCOUNT_SID`, `SMS_AUTH_TOKEN`, `SMS_FROM` | unset logs codes instead of texting |
//! | `SENTRY_DSN` / `SENTRY_ENVIRONMENT` | unset |

use std::net::{IpAddr, SocketAddr};

use patra_core::PaymentMethod;
use patra_core::env::{self, ConfigError};
use secrecy::SecretString;

const DEFAULT_STORE_NAME: &str = "Shivpuriya Patra Bhandar";
const RAZORPAY_API: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub session_secret: SecretString,
    /// Merchant name shown in the payment widget.
    pub store_name: String,
    pub payment: PaymentConfig,
    pub otp: OtpConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// How shoppers pay.
#[derive(Debug, Clone)]
pub enum PaymentConfig {
    /// Orders are confirmed at once and settled offline.
    Manual,
    /// Razorpay hosted checkout.
    Razorpay(RazorpayConfig),
}

impl PaymentConfig {
    /// Method stamped on new orders.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::Manual => PaymentMethod::Manual,
            Self::Razorpay(_) => PaymentMethod::Razorpay,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        match env::or_default("PAYMENT_MODE", "manual").as_str() {
            "manual" => Ok(Self::Manual),
            "razorpay" => Ok(Self::Razorpay(RazorpayConfig {
                key_id: env::required("RAZORPAY_KEY_ID")?,
                key_secret: env::secret("RAZORPAY_KEY_SECRET")?,
                api_base: env::or_default("RAZORPAY_API_BASE", RAZORPAY_API),
            })),
            other => Err(ConfigError::invalid(
                "PAYMENT_MODE",
                format!("expected 'manual' or 'razorpay', got '{other}'"),
            )),
        }
    }
}

/// The key id is public: the checkout widget receives it too.
#[derive(Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    /// Basic-auth password for the API and HMAC key for payment signatures.
    pub key_secret: SecretString,
    pub api_base: String,
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub ttl_minutes: i64,
    /// Put the code in the send response. Never enable in production.
    pub expose_code: bool,
    pub sms: Option<SmsConfig>,
}

impl OtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_minutes: i64 = env::parse_or("OTP_TTL_MINUTES", "10")?;
        if ttl_minutes < 1 {
            return Err(ConfigError::invalid("OTP_TTL_MINUTES", "must be at least 1"));
        }

        let sms = env::optional("SMS_PROVIDER_URL")
            .map(|provider_url| -> Result<SmsConfig, ConfigError> {
                Ok(SmsConfig {
                    provider_url,
                    account_sid: env::required("SMS_ACCOUNT_SID")?,
                    auth_token: env::secret("SMS_AUTH_TOKEN")?,
                    from: env::required("SMS_FROM")?,
                })
            })
            .transpose()?;

        Ok(Self {
            ttl_minutes,
            expose_code: env::parse_or("OTP_EXPOSE_CODE", "false")?,
            sms,
        })
    }
}

/// Twilio-style messages endpoint with basic auth.
#[derive(Clone)]
pub struct SmsConfig {
    pub provider_url: String,
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender id or number.
    pub from: String,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("provider_url", &self.provider_url)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

impl StorefrontConfig {
    /// Read the environment, after loading `.env` if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing or unparsable variable, or for a
    /// secret that fails the strength checks in [`patra_core::env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: env::database_url("STOREFRONT_DATABASE_URL")?,
            host: env::parse_or("STOREFRONT_HOST", "0.0.0.0")?,
            port: env::parse_or("STOREFRONT_PORT", "3000")?,
            base_url: env::required("STOREFRONT_BASE_URL")?,
            session_secret: env::session_secret("STOREFRONT_SESSION_SECRET")?,
            store_name: env::or_default("STORE_NAME", DEFAULT_STORE_NAME),
            payment: PaymentConfig::from_env()?,
            otp: OtpConfig::from_env()?,
            sentry_dsn: env::optional("SENTRY_DSN"),
            sentry_environment: env::optional("SENTRY_ENVIRONMENT"),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn razorpay(secret: &str) -> RazorpayConfig {
        RazorpayConfig {
            key_id: "rzp_live_visible".to_owned(),
            key_secret: SecretString::from(secret.to_owned()),
            api_base: RAZORPAY_API.to_owned(),
        }
    }

    #[test]
    fn test_payment_method_follows_mode() {
        assert_eq!(PaymentConfig::Manual.method(), PaymentMethod::Manual);
        assert_eq!(
            PaymentConfig::Razorpay(razorpay("k")).method(),
            PaymentMethod::Razorpay
        );
    }

    #[test]
    fn test_debug_output_hides_credentials() {
        let rzp = format!("{:?}", razorpay("hidden_gateway_secret"));
        assert!(rzp.contains("rzp_live_visible"));
        assert!(!rzp.contains("hidden_gateway_secret"));

        let sms = format!(
            "{:?}",
            SmsConfig {
                provider_url: "https://sms.patra.test/Messages.json".to_owned(),
                account_sid: "AC123".to_owned(),
                auth_token: SecretString::from("sms_token_value"),
                from: "PATRA".to_owned(),
            }
        );
        assert!(sms.contains("AC123"));
        assert!(!sms.contains("sms_token_value"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/patra"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            session_secret: SecretString::from("s".repeat(32)),
            store_name: DEFAULT_STORE_NAME.to_owned(),
            payment: PaymentConfig::Manual,
            otp: OtpConfig {
                ttl_minutes: 10,
                expose_code: false,
                sms: None,
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }
}
