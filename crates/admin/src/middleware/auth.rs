//! Authentication extractors for the back-office.
//!
//! The session only remembers who signed in. [`RequireAdmin`] re-reads the
//! profile on every request, so demoting an admin takes effect at once.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentAdmin, Profile, session_keys};
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Extractor that requires a signed-in admin.
///
/// Rejects with 401 when nobody is signed in and 403 when the signed-in
/// profile is no longer an admin.
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin, _): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin, pub Profile);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Please sign in".to_owned()))?;

        let profile = AdminAuthService::new(state.pool())
            .current_admin(admin.id)
            .await?;
        set_sentry_user(&admin.id, Some(admin.email.as_str()));

        Ok(Self(admin, profile))
    }
}

/// Store the admin in the session, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the admin's session.
///
/// # Errors
///
/// Returns an error if the session store cannot be reached.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
