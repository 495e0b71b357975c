//! Wishlist.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use patra_core::ProductId;

use crate::db::wishlist::WishlistRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CartView, WishlistLine};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Body of `POST /api/wishlist`.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: ProductId,
}

/// GET /api/wishlist
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<WishlistLine>>> {
    Ok(Json(WishlistRepository::new(state.pool()).list(user.id).await?))
}

/// POST /api/wishlist
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToWishlistRequest>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .add(user.id, body.product_id)
        .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/wishlist/{product_id}
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    if WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Item not in wishlist".to_owned()))
    }
}

/// Add one to the cart and drop it from the wishlist.
///
/// POST /api/wishlist/{product_id}/move-to-cart
#[instrument(skip(state, user))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool())
        .move_from_wishlist(user.id, product_id)
        .await?;
    Ok(Json(view))
}
