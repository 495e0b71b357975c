//! Product management and image uploads.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use patra_core::ProductId;

use super::activity;
use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewActivity, Product, ProductInput, ProductListQuery};
use crate::services::storage::{ImageUpload, MAX_IMAGE_BYTES, product_image_path};
use crate::state::AppState;

/// Most files accepted in one upload request.
const MAX_FILES_PER_UPLOAD: usize = 5;

/// Query of `DELETE /api/products/{id}/images`.
#[derive(Debug, Deserialize)]
pub struct RemoveImageQuery {
    pub url: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/{id}", get(show).put(update).delete(destroy))
        .route(
            "/products/{id}/images",
            axum::routing::post(upload_images)
                .delete(remove_image)
                .layer(DefaultBodyLimit::max(
                    MAX_FILES_PER_UPLOAD * MAX_IMAGE_BYTES + 64 * 1024,
                )),
        )
}

/// GET /api/products
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        CatalogRepository::new(state.pool())
            .list_products(&query)
            .await?,
    ))
}

/// GET /api/products/{id}
#[instrument(skip(state, _admin))]
async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

/// POST /api/products
#[instrument(skip(state, admin, body))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let (input, category_id) = body.normalize()?;
    let product = CatalogRepository::new(state.pool())
        .create_product(&input, category_id)
        .await?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "create", "product", product.id)
            .with_details(json!({ "name": product.name, "sku": product.sku })),
    )
    .await;
    tracing::info!(product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
#[instrument(skip(state, admin, body))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>> {
    let (input, category_id) = body.normalize()?;
    let product = CatalogRepository::new(state.pool())
        .update_product(id, &input, category_id)
        .await
        .map_err(product_not_found)?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "update", "product", id).with_details(json!({
            "name": product.name,
            "price": product.price,
            "stock_quantity": product.stock_quantity,
            "status": product.status,
        })),
    )
    .await;

    Ok(Json(product))
}

/// DELETE /api/products/{id}
///
/// Stored images go with the product.
#[instrument(skip(state, admin))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let product = CatalogRepository::new(state.pool())
        .delete_product(id)
        .await
        .map_err(product_not_found)?;

    for url in &product.images {
        delete_stored_image(&state, url).await;
    }

    activity::record(
        &state,
        NewActivity::new(admin.id, "delete", "product", id)
            .with_details(json!({ "name": product.name })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Upload one or more images and append them to the product.
///
/// Every part of the form that carries a file is treated as an image.
///
/// POST /api/products/{id}/images
#[instrument(skip(state, admin, multipart))]
async fn upload_images(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Json<Product>> {
    let catalog = CatalogRepository::new(state.pool());
    if catalog.get_product(id).await?.is_none() {
        return Err(AppError::NotFound("Product not found".to_owned()));
    }

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;

        uploads.push(ImageUpload::new(
            Some(&file_name),
            content_type.as_deref(),
            bytes.to_vec(),
        )?);
        if uploads.len() > MAX_FILES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_FILES_PER_UPLOAD} images per upload"
            )));
        }
    }
    if uploads.is_empty() {
        return Err(AppError::BadRequest("No image files uploaded".to_owned()));
    }

    let mut urls = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let path = product_image_path(upload.extension);
        let url = state
            .storage()
            .upload(&path, upload.bytes, upload.content_type)
            .await?;
        urls.push(url);
    }

    let product = catalog
        .append_images(id, &urls)
        .await
        .map_err(product_not_found)?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "upload_images", "product", id)
            .with_details(json!({ "urls": urls })),
    )
    .await;

    Ok(Json(product))
}

/// Remove one image URL from the product.
///
/// DELETE /api/products/{id}/images?url=
#[instrument(skip(state, admin))]
async fn remove_image(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<ProductId>,
    Query(query): Query<RemoveImageQuery>,
) -> Result<Json<Product>> {
    let (product, had_image) = CatalogRepository::new(state.pool())
        .remove_image(id, &query.url)
        .await
        .map_err(product_not_found)?;

    if had_image {
        delete_stored_image(&state, &query.url).await;
        activity::record(
            &state,
            NewActivity::new(admin.id, "remove_image", "product", id)
                .with_details(json!({ "url": query.url })),
        )
        .await;
    }

    Ok(Json(product))
}

/// Delete the object behind `url` if it lives in our bucket.
async fn delete_stored_image(state: &AppState, url: &str) {
    let Some(path) = state.storage().path_of(url) else {
        return;
    };
    if let Err(e) = state.storage().delete(&path).await {
        tracing::warn!(error = %e, %path, "Failed to delete stored image");
    }
}

fn product_not_found(e: crate::db::RepositoryError) -> AppError {
    match e {
        crate::db::RepositoryError::NotFound => AppError::NotFound("Product not found".to_owned()),
        other => other.into(),
    }
}
