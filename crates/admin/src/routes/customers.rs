//! Customers and role changes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use patra_core::{UserId, UserRole};

use super::activity;
use crate::db::{ProfileRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CustomerSummary, NewActivity, Profile};
use crate::state::AppState;

/// Body of `PUT /api/customers/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index))
        .route("/customers/{id}/role", put(set_role))
}

/// Every profile with order count and total spent.
///
/// GET /api/customers
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<CustomerSummary>>> {
    Ok(Json(
        ProfileRepository::new(state.pool())
            .list_customers()
            .await?,
    ))
}

/// PUT /api/customers/{id}/role
#[instrument(skip(state, admin))]
async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<Profile>> {
    check_role_change(admin.id, id, body.role)?;

    let profile = ProfileRepository::new(state.pool())
        .set_role(id, body.role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Customer not found".to_owned()),
            other => other.into(),
        })?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "set_role", "profile", id)
            .with_details(json!({ "role": body.role, "email": profile.email })),
    )
    .await;
    tracing::info!(user_id = %id, role = %body.role, "Role changed");

    Ok(Json(profile))
}

/// Admins may not demote themselves.
fn check_role_change(actor: UserId, target: UserId, role: UserRole) -> Result<()> {
    if actor == target && role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cannot_demote_self() {
        let me = UserId::new();
        assert!(check_role_change(me, me, UserRole::Customer).is_err());
        assert!(check_role_change(me, me, UserRole::Admin).is_ok());
        assert!(check_role_change(me, UserId::new(), UserRole::Customer).is_ok());
    }
}
