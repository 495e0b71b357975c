//! Checkout and the payment success callback.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use patra_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::checkout::{
    CheckoutRequest, CheckoutService, CheckoutSummary, PaymentCallback, PaymentOutcome,
    PaymentRequest, PlacedOrder,
};
use crate::state::AppState;

/// Query for the summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub coupon: Option<String>,
}

fn checkout_service(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(state.pool(), state.razorpay(), &state.config().store_name)
}

/// Price the cart.
///
/// GET /api/checkout/summary?coupon=CODE
#[instrument(skip(state, user))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CheckoutSummary>> {
    let summary = checkout_service(&state)
        .summary(user.id, query.coupon.as_deref())
        .await?;
    Ok(Json(summary))
}

/// Place an order.
///
/// POST /api/checkout
#[instrument(skip(state, user, body))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = checkout_service(&state).place_order(&user, &body).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Payment widget success callback.
///
/// POST /api/checkout/payment
#[instrument(skip(state, user, body))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<PaymentCallback>,
) -> Result<Json<PaymentOutcome>> {
    let outcome = checkout_service(&state)
        .confirm_payment(user.id, &body)
        .await?;
    Ok(Json(outcome))
}

/// Widget payload for an unpaid order, to retry a closed or failed payment.
///
/// POST /api/orders/{id}/payment
#[instrument(skip(state, user))]
pub async fn resume_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<PaymentRequest>> {
    let payment = checkout_service(&state).resume_payment(&user, id).await?;
    Ok(Json(payment))
}
