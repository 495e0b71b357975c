//! Back-office sign-in.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Profile};
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying the signed-in admin.
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub user: Profile,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Sign in; only admins get a session.
///
/// POST /api/auth/login
#[instrument(skip(state, session, body))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AdminResponse>> {
    let profile = AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    set_current_admin(&session, &CurrentAdmin::from(&profile)).await?;
    set_sentry_user(&profile.id, Some(profile.email.as_str()));
    tracing::info!(admin_id = %profile.id, "Admin signed in");

    Ok(Json(AdminResponse { user: profile }))
}

/// POST /api/auth/logout
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
#[instrument(skip_all)]
async fn me(RequireAdmin(_, profile): RequireAdmin) -> Json<AdminResponse> {
    Json(AdminResponse { user: profile })
}
