//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{PaymentConfig, StorefrontConfig};
use crate::services::razorpay::{RazorpayClient, RazorpayError};
use crate::services::sms::{SmsError, SmsSender};

/// Error building the outbound clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("razorpay client: {0}")]
    Razorpay(#[from] RazorpayError),
    #[error("sms client: {0}")]
    Sms(#[from] SmsError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    razorpay: Option<RazorpayClient>,
    sms: SmsSender,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let razorpay = match &config.payment {
            PaymentConfig::Manual => None,
            PaymentConfig::Razorpay(rzp) => Some(RazorpayClient::new(rzp)?),
        };
        let sms = SmsSender::from_config(config.otp.sms.as_ref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                razorpay,
                sms,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The Razorpay client, when online payment is enabled.
    #[must_use]
    pub fn razorpay(&self) -> Option<&RazorpayClient> {
        self.inner.razorpay.as_ref()
    }

    /// Where one-time codes are delivered.
    #[must_use]
    pub fn sms(&self) -> &SmsSender {
        &self.inner.sms
    }
}
