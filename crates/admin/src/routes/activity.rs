//! Audit trail of back-office changes.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::db::ActivityRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{ActivityEntry, NewActivity};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/activity", get(index))
}

/// GET /api/activity
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<ActivityEntry>>> {
    Ok(Json(ActivityRepository::new(state.pool()).latest().await?))
}

/// Record a mutation. A failed write is logged; the change itself stands.
pub(crate) async fn record(state: &AppState, entry: NewActivity) {
    if let Err(e) = ActivityRepository::new(state.pool()).record(&entry).await {
        tracing::warn!(
            error = %e,
            action = entry.action,
            entity_type = entry.entity_type,
            "Failed to record activity"
        );
    }
}
