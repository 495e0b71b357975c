//! Unified error handling for the back-office.
//!
//! Every handler returns `Result<T, AppError>`; every error body is
//! `{"error": "<message>"}`. Server-side failures go to Sentry and the
//! client only sees a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::{CategoryInputError, CouponInputError, ProductInputError};
use crate::services::{AdminAuthError, OrderAdminError, RazorpayError, StorageError};

/// Application-level error type for the back-office.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Sign-in or admin check failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Order status change or refund failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderAdminError),

    /// Object storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Razorpay call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] RazorpayError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Submitted form failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Write conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL: &str = "Internal server error";

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {e}"))
    }
}

impl From<CategoryInputError> for AppError {
    fn from(e: CategoryInputError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<ProductInputError> for AppError {
    fn from(e: ProductInputError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<CouponInputError> for AppError {
    fn from(e: CouponInputError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl AppError {
    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
                AdminAuthError::NotAdmin => (StatusCode::FORBIDDEN, err.to_string()),
                AdminAuthError::Repository(inner) => repository_status(inner),
            },
            Self::Order(err) => order_status(err),
            Self::Storage(err) => match err {
                StorageError::UnsupportedType | StorageError::TooLarge | StorageError::Empty => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                StorageError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned()),
                StorageError::Http(_) | StorageError::Api { .. } => (
                    StatusCode::BAD_GATEWAY,
                    "Image storage unavailable".to_owned(),
                ),
            },
            Self::Payment(_) => (
                StatusCode::BAD_GATEWAY,
                "Payment gateway unavailable".to_owned(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) | Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned()),
        }
    }
}

fn repository_status(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned())
        }
    }
}

fn order_status(err: &OrderAdminError) -> (StatusCode, String) {
    match err {
        OrderAdminError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        OrderAdminError::InvalidTransition { .. }
        | OrderAdminError::NotRefundable
        | OrderAdminError::InvalidAmount
        | OrderAdminError::ExceedsRefundable { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderAdminError::Gateway(_) => (
            StatusCode::BAD_GATEWAY,
            "Refund was rejected by the payment gateway".to_owned(),
        ),
        OrderAdminError::Money(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned()),
        OrderAdminError::Repository(inner) => repository_status(inner),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the signed-in admin.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use patra_core::OrderStatus;
    use rust_decimal::Decimal;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::Conflict("Category still has products".to_string());
        assert_eq!(err.to_string(), "Conflict: Category still has products");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status(AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            status(AdminAuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(AdminAuthError::NotAdmin.into()), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_order_errors() {
        assert_eq!(
            status(
                OrderAdminError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(OrderAdminError::NotFound.into()), StatusCode::NOT_FOUND);

        let (_, msg) = AppError::from(OrderAdminError::ExceedsRefundable {
            available: Decimal::new(25_050, 2),
        })
        .status_and_message();
        assert_eq!(msg, "Refund exceeds the refundable balance of 250.50");
    }

    #[test]
    fn test_input_errors_are_bad_requests() {
        let err = AppError::from(ProductInputError::PriceNotPositive);
        let (code, msg) = err.status_and_message();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "Price must be positive");

        assert_eq!(
            status(CouponInputError::PercentageTooLarge.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_errors() {
        assert_eq!(status(StorageError::TooLarge.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(
                StorageError::Api {
                    status: 500,
                    message: "boom".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let (_, msg) = AppError::Internal("pool exhausted".into()).status_and_message();
        assert_eq!(msg, "Internal server error");
    }
}
