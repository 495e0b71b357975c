//! Coupon management.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde_json::json;
use tracing::instrument;

use patra_core::CouponId;

use super::activity;
use crate::db::{CouponRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CouponInput, CouponView, NewActivity};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/coupons", get(index).post(create))
        .route("/coupons/{id}", put(update).delete(destroy))
}

/// Every coupon with its usage label.
///
/// GET /api/coupons
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<CouponView>>> {
    let coupons = CouponRepository::new(state.pool()).list().await?;
    Ok(Json(coupons.into_iter().map(CouponView::from).collect()))
}

/// POST /api/coupons
#[instrument(skip(state, admin, body))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Json(body): Json<CouponInput>,
) -> Result<(StatusCode, Json<CouponView>)> {
    let input = body.normalize()?;
    let coupon = CouponRepository::new(state.pool()).create(&input).await?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "create", "coupon", coupon.id).with_details(json!({
            "code": coupon.code,
            "coupon_type": coupon.coupon_type,
            "value": coupon.value,
        })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(coupon.into())))
}

/// PUT /api/coupons/{id}
#[instrument(skip(state, admin, body))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<CouponId>,
    Json(body): Json<CouponInput>,
) -> Result<Json<CouponView>> {
    let input = body.normalize()?;
    let coupon = CouponRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(map_not_found)?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "update", "coupon", id).with_details(json!({
            "code": coupon.code,
            "is_active": coupon.is_active,
        })),
    )
    .await;

    Ok(Json(coupon.into()))
}

/// DELETE /api/coupons/{id}
#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<CouponId>,
) -> Result<StatusCode> {
    CouponRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(map_not_found)?;

    activity::record(&state, NewActivity::new(admin.id, "delete", "coupon", id)).await;
    Ok(StatusCode::NO_CONTENT)
}

fn map_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Coupon not found".to_owned()),
        other => other.into(),
    }
}
