//! Dashboard figures.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::db::dashboard;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::DashboardStats;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(index))
}

/// GET /api/dashboard
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<DashboardStats>> {
    Ok(Json(dashboard::stats(state.pool()).await?))
}
