//! Order management: list, detail, status changes and refunds.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use patra_core::{OrderId, OrderStatus};

use super::activity;
use crate::db::{OrderRepository, refunds};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{AdminOrder, NewActivity, Order, OrderItem, OrderListQuery, Refund};
use crate::services::{OrderAdminService, RefundOutcome};
use crate::state::AppState;

/// Body of `PUT /api/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Body of `POST /api/orders/{id}/refunds`.
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: Decimal,
    pub reason: Option<String>,
}

/// An order with its lines and refunds.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub refunds: Vec<Refund>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", put(update_status))
        .route("/orders/{id}/refunds", post(refund))
}

/// GET /api/orders?status=
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<AdminOrder>>> {
    Ok(Json(OrderRepository::new(state.pool()).list(&query).await?))
}

/// GET /api/orders/{id}
#[instrument(skip(state, _admin))]
async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
    let items = orders.items(id).await?;
    let refunds = refunds::list_for_order(state.pool(), id).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        refunds,
    }))
}

/// PUT /api/orders/{id}/status
#[instrument(skip(state, admin))]
async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderAdminService::new(state.pool(), state.refunds())
        .change_status(id, body.status)
        .await?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "update_status", "order", id).with_details(json!({
            "order_number": order.order_number,
            "status": order.status,
            "payment_status": order.payment_status,
        })),
    )
    .await;

    Ok(Json(order))
}

/// POST /api/orders/{id}/refunds
#[instrument(skip(state, admin, body))]
async fn refund(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<RefundRequest>,
) -> Result<(StatusCode, Json<RefundOutcome>)> {
    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let outcome = OrderAdminService::new(state.pool(), state.refunds())
        .refund(admin.id, id, body.amount, reason)
        .await?;

    activity::record(
        &state,
        NewActivity::new(admin.id, "refund", "order", id).with_details(json!({
            "order_number": outcome.order.order_number,
            "refund_id": outcome.refund.id,
            "amount": outcome.refund.amount,
            "status": outcome.refund.status,
        })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(outcome)))
}
