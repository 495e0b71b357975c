//! Catalog: categories and products.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tracing::instrument;

use patra_core::ProductId;

use crate::db::catalog::CatalogRepository;
use crate::error::{AppError, Result};
use crate::models::{Category, Product, ProductFilter};
use crate::state::AppState;

/// Number of products on the featured shelf.
const FEATURED_LIMIT: i64 = 8;

/// One page of the shop listing.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub per_page: i64,
}

/// Active categories.
///
/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool())
        .list_categories()
        .await?;
    Ok(Json(categories))
}

/// Filtered, sorted, paginated shop listing.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<ProductPage>> {
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
        && min > max
    {
        return Err(AppError::BadRequest(
            "min_price cannot exceed max_price".to_owned(),
        ));
    }

    let (products, total) = CatalogRepository::new(state.pool())
        .list_products(&filter)
        .await?;

    Ok(Json(ProductPage {
        products,
        total,
        page: filter.page.unwrap_or(1).max(1),
        per_page: filter.limit(),
    }))
}

/// Featured products, newest first.
///
/// GET /api/products/featured
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = CatalogRepository::new(state.pool())
        .featured(FEATURED_LIMIT)
        .await?;
    Ok(Json(products))
}

/// Product detail.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    CatalogRepository::new(state.pool())
        .get_active_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}
