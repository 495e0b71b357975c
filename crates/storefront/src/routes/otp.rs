//! Phone sign-in: `send-otp` and `verify-otp`.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, set_sentry_user};
use crate::middleware::set_current_user;
use crate::models::{CurrentUser, Profile};
use crate::services::otp::OtpService;
use crate::state::AppState;

/// Body of `POST /api/otp/send`.
#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: Option<String>,
}

/// Response to a send.
#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_otp: Option<String>,
}

/// Body of `POST /api/otp/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: Option<String>,
    pub otp: Option<String>,
}

/// Response to a successful verify.
#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub user: Profile,
}

fn otp_service(state: &AppState) -> OtpService<'_> {
    OtpService::new(
        state.pool(),
        state.sms(),
        &state.config().otp,
        &state.config().store_name,
    )
}

/// Issue a code.
///
/// POST /api/otp/send
#[instrument(skip(state, body))]
pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>> {
    let issued = otp_service(&state).send(body.phone.as_deref()).await?;

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent successfully",
        debug_otp: issued.debug_code,
    }))
}

/// Redeem a code and sign in.
///
/// POST /api/otp/verify
#[instrument(skip(state, session, body))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>> {
    let profile = otp_service(&state)
        .verify(body.phone.as_deref(), body.otp.as_deref())
        .await?;

    set_current_user(&session, &CurrentUser::from(&profile)).await?;
    set_sentry_user(&profile.id);

    Ok(Json(VerifyOtpResponse {
        success: true,
        user: profile,
    }))
}
