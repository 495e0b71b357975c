//! Shopping cart.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use patra_core::ProductId;

use crate::db::cart::CartRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// Body of `PUT /api/cart/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: i64,
}

/// The cart.
///
/// GET /api/cart
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(CartService::new(state.pool()).view(user.id).await?))
}

/// Total quantity in the cart.
///
/// GET /api/cart/count
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartCount>> {
    let count = CartRepository::new(state.pool()).count(user.id).await?;
    Ok(Json(CartCount { count }))
}

/// Add a product, merging with an existing line.
///
/// POST /api/cart
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool())
        .add(user.id, body.product_id, body.quantity)
        .await?;
    Ok(Json(view))
}

/// Set a line's quantity; zero or less removes it.
///
/// PUT /api/cart/{product_id}
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool())
        .update(user.id, product_id, body.quantity)
        .await?;
    Ok(Json(view))
}

/// Remove one line.
///
/// DELETE /api/cart/{product_id}
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    CartService::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the cart.
///
/// DELETE /api/cart
#[instrument(skip(state, user))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    CartService::new(state.pool()).clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
