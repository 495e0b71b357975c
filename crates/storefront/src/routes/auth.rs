//! Email and password authentication.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Profile};
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Registration body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying the signed-in profile.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Profile,
}

/// Create an account and sign it in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let profile = AuthService::new(state.pool())
        .register(Registration {
            email: &body.email,
            password: &body.password,
            full_name: body.full_name.as_deref(),
            phone: body.phone.as_deref(),
        })
        .await?;

    set_current_user(&session, &CurrentUser::from(&profile)).await?;
    set_sentry_user(&profile.id);
    tracing::info!(user_id = %profile.id, "Account registered");

    Ok((StatusCode::CREATED, Json(UserResponse { user: profile })))
}

/// Sign in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let profile = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&profile)).await?;
    set_sentry_user(&profile.id);

    Ok(Json(UserResponse { user: profile }))
}

/// Sign out.
///
/// POST /api/auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in profile, or 401.
///
/// GET /api/auth/me
#[instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<UserResponse>> {
    let user = user.ok_or_else(|| AppError::Unauthorized("Not signed in".to_owned()))?;
    let profile = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(Json(UserResponse { user: profile }))
}
