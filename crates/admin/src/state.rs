//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{ObjectStorage, RazorpayError, RazorpayRefunds, StorageError};

/// Error building the outbound clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
    #[error("razorpay client: {0}")]
    Razorpay(#[from] RazorpayError),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    storage: ObjectStorage,
    refunds: Option<RazorpayRefunds>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, StateError> {
        let storage = ObjectStorage::new(&config.storage)?;
        let refunds = config
            .razorpay
            .as_ref()
            .map(RazorpayRefunds::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storage,
                refunds,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Product image storage.
    #[must_use]
    pub fn storage(&self) -> &ObjectStorage {
        &self.inner.storage
    }

    /// Razorpay refunds, when gateway keys are configured.
    #[must_use]
    pub fn refunds(&self) -> Option<&RazorpayRefunds> {
        self.inner.refunds.as_ref()
    }
}
