//! Category management.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::json;
use tracing::instrument;

use patra_core::CategoryId;

use super::activity;
use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryInput, NewActivity};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(index).post(create))
        .route("/categories/{id}", get(show).put(update).delete(destroy))
}

/// GET /api/categories
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(
        CatalogRepository::new(state.pool())
            .list_categories()
            .await?,
    ))
}

/// GET /api/categories/{id}
#[instrument(skip(state, _admin))]
async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CatalogRepository::new(state.pool())
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// POST /api/categories
#[instrument(skip(state, admin, body))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Json(body): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let input = body.normalize()?;
    let category = CatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "create", "category", category.id)
            .with_details(json!({ "name": category.name })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/{id}
#[instrument(skip(state, admin, body))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let input = body.normalize()?;
    let category = CatalogRepository::new(state.pool())
        .update_category(id, &input)
        .await
        .map_err(map_not_found)?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "update", "category", id).with_details(json!({
            "name": category.name,
            "is_active": category.is_active,
        })),
    )
    .await;

    Ok(Json(category))
}

/// DELETE /api/categories/{id}
///
/// 409 while any product still belongs to the category.
#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool())
        .delete_category(id)
        .await
        .map_err(map_not_found)?;

    activity::record(&state, NewActivity::new(admin.id, "delete", "category", id)).await;
    Ok(StatusCode::NO_CONTENT)
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_owned())
}

fn map_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => not_found(),
        other => other.into(),
    }
}
