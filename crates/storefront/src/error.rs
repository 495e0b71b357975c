//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`
//! and every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::otp::OtpError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Phone code operation failed.
    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout or payment confirmation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

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

impl AppError {
    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => auth_status(err),
            Self::Otp(err) => match err {
                OtpError::Repository(inner) => repository_status(inner),
                OtpError::Delivery(_) => (StatusCode::BAD_GATEWAY, "Failed to send OTP".to_owned()),
                other => (StatusCode::BAD_REQUEST, other.to_string()),
            },
            Self::Cart(err) => match err {
                CartError::Repository(inner) => repository_status(inner),
                CartError::ProductNotFound | CartError::NotInCart => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                other => (StatusCode::BAD_REQUEST, other.to_string()),
            },
            Self::Checkout(err) => checkout_status(err),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_owned(),
            ),
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

fn auth_status(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials | AuthError::UserNotFound => {
            (StatusCode::UNAUTHORIZED, "Invalid email or password".to_owned())
        }
        AuthError::UserAlreadyExists => (StatusCode::CONFLICT, err.to_string()),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address".to_owned()),
        AuthError::InvalidPhone(_) => (StatusCode::BAD_REQUEST, "Invalid phone number".to_owned()),
        AuthError::Repository(inner) => repository_status(inner),
        AuthError::PasswordHash => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned()),
    }
}

fn checkout_status(err: &CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::Repository(inner) => repository_status(inner),
        CheckoutError::AddressNotFound | CheckoutError::OrderNotFound => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::OrderNotPayable => (StatusCode::CONFLICT, err.to_string()),
        CheckoutError::Gateway(_) => (
            StatusCode::BAD_GATEWAY,
            "Payment service unavailable, please try again".to_owned(),
        ),
        CheckoutError::Money(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_owned()),
        _ => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
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
    use patra_core::pricing::CouponRejection;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors() {
        assert_eq!(
            status(RepositoryError::Conflict("Product is already in wishlist".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status(RepositoryError::NotFound.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_service_errors() {
        assert_eq!(
            status(CartError::InsufficientStock { available: 2 }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(CheckoutError::CartEmpty.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(CheckoutError::CouponRejected(CouponRejection::Expired).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(CheckoutError::OrderNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(status(OtpError::InvalidCode.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::InvalidCredentials.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::UserAlreadyExists.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn test_messages_keep_user_wording() {
        let (_, msg) = AppError::from(CartError::InsufficientStock { available: 4 })
            .status_and_message();
        assert_eq!(msg, "Only 4 items available");

        let (_, msg) = AppError::from(OtpError::InvalidCode).status_and_message();
        assert_eq!(msg, "Invalid or expired OTP");

        let (_, msg) = AppError::Internal("pool exhausted".into()).status_and_message();
        assert_eq!(msg, "Internal server error");
    }
}
