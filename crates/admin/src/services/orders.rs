//! Order fulfilment and refunds.
//!
//! Status changes follow [`OrderStatus::can_transition_to`]. Cancelling puts
//! stock back and returns the coupon use. Refunds are bounded by what has
//! not already been refunded, and go through Razorpay when the order was
//! paid there and gateway keys are configured.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use patra_core::{
    MoneyError, OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId, round_rupees,
    to_minor_units,
};

use super::razorpay::{RazorpayError, RazorpayRefunds};
use crate::db::RepositoryError;
use crate::db::{orders, refunds};
use crate::models::{Order, Refund};

/// Errors from order management.
#[derive(Debug, Error)]
pub enum OrderAdminError {
    #[error("Order not found")]
    NotFound,

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order cannot be refunded")]
    NotRefundable,

    #[error("Refund amount must be positive")]
    InvalidAmount,

    #[error("Refund exceeds the refundable balance of {available}")]
    ExceedsRefundable { available: Decimal },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] RazorpayError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderAdminError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// What a refund will do to its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundPlan {
    /// The refund empties the refundable balance.
    pub full: bool,
    /// Fulfilment status after a full refund, if it changes.
    pub next_status: Option<OrderStatus>,
}

/// Decide whether `amount` may be refunded from an order.
///
/// `committed` is the sum of earlier refunds that did not fail.
///
/// # Errors
///
/// Returns `InvalidAmount`, `NotRefundable` or `ExceedsRefundable`.
pub fn plan_refund(
    status: OrderStatus,
    payment_status: PaymentStatus,
    total: Decimal,
    committed: Decimal,
    amount: Decimal,
) -> Result<RefundPlan, OrderAdminError> {
    if amount <= Decimal::ZERO {
        return Err(OrderAdminError::InvalidAmount);
    }

    let refundable_status = status.can_transition_to(OrderStatus::Refunded)
        || (status == OrderStatus::Cancelled && payment_status == PaymentStatus::Completed);
    if payment_status == PaymentStatus::Refunded || !refundable_status {
        return Err(OrderAdminError::NotRefundable);
    }

    let available = (total - committed).max(Decimal::ZERO);
    if amount > available {
        return Err(OrderAdminError::ExceedsRefundable { available });
    }

    let full = amount == available;
    let next_status =
        (full && status.can_transition_to(OrderStatus::Refunded)).then_some(OrderStatus::Refunded);
    Ok(RefundPlan { full, next_status })
}

/// Payment status that goes with a fulfilment change, if any.
///
/// Manual orders are paid on delivery; a refunded order is refunded money.
#[must_use]
pub fn payment_status_after(
    method: PaymentMethod,
    current: PaymentStatus,
    next: OrderStatus,
) -> Option<PaymentStatus> {
    match next {
        OrderStatus::Refunded => Some(PaymentStatus::Refunded),
        OrderStatus::Delivered
            if method == PaymentMethod::Manual && current == PaymentStatus::Pending =>
        {
            Some(PaymentStatus::Completed)
        }
        _ => None,
    }
}

/// Result of a refund.
#[derive(Debug, Serialize)]
pub struct RefundOutcome {
    pub refund: Refund,
    pub order: Order,
}

/// Order management service.
pub struct OrderAdminService<'a> {
    pool: &'a PgPool,
    gateway: Option<&'a RazorpayRefunds>,
}

impl<'a> OrderAdminService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, gateway: Option<&'a RazorpayRefunds>) -> Self {
        Self { pool, gateway }
    }

    /// Move an order to `next`.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::NotFound` for an unknown order and
    /// `OrderAdminError::InvalidTransition` if the lifecycle forbids the move.
    pub async fn change_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderAdminError> {
        let mut tx = self.pool.begin().await?;

        let order = orders::lock(&mut tx, id)
            .await?
            .ok_or(OrderAdminError::NotFound)?;
        if !order.status.can_transition_to(next) {
            return Err(OrderAdminError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let payment = payment_status_after(order.payment_method, order.payment_status, next);
        let updated = orders::set_status(&mut tx, id, next, payment).await?;

        if next == OrderStatus::Cancelled {
            let restocked = orders::restock(&mut tx, id).await?;
            if let Some(coupon_id) = order.coupon_id {
                orders::release_coupon(&mut tx, coupon_id).await?;
            }
            tracing::info!(order_number = %order.order_number, restocked, "Order cancelled");
        }

        tx.commit().await?;

        tracing::info!(
            order_number = %updated.order_number,
            from = %order.status,
            to = %next,
            "Order status changed"
        );
        Ok(updated)
    }

    /// Refund part or all of an order.
    ///
    /// The refund row is written as pending before the gateway is called, so
    /// concurrent refunds cannot exceed the order total.
    ///
    /// # Errors
    ///
    /// Returns the planning errors of [`plan_refund`],
    /// `OrderAdminError::NotFound` for an unknown order, or
    /// `OrderAdminError::Gateway` if Razorpay rejects the refund (the row is
    /// then marked failed).
    pub async fn refund(
        &self,
        admin: UserId,
        id: OrderId,
        amount: Decimal,
        reason: Option<&str>,
    ) -> Result<RefundOutcome, OrderAdminError> {
        let amount = round_rupees(amount);

        let mut tx = self.pool.begin().await?;
        let order = orders::lock(&mut tx, id)
            .await?
            .ok_or(OrderAdminError::NotFound)?;
        let committed = refunds::committed_total(&mut tx, id).await?;
        let plan = plan_refund(
            order.status,
            order.payment_status,
            order.total_amount,
            committed,
            amount,
        )?;
        let paise = to_minor_units(amount)?;
        let pending = refunds::insert(&mut tx, id, amount, reason, admin).await?;
        tx.commit().await?;

        let gateway_payment = self.gateway.zip(order.razorpay_payment_id.as_deref());
        let mut tx = self.pool.begin().await?;

        let refund = match gateway_payment {
            Some((gateway, payment_id)) => {
                match gateway
                    .refund(payment_id, paise, &order.order_number, reason)
                    .await
                {
                    Ok(gateway_refund) => {
                        refunds::mark_processed(&mut tx, pending.id, &gateway_refund.id).await?
                    }
                    Err(e) => {
                        tx.rollback().await?;
                        refunds::mark_failed(self.pool, pending.id).await?;
                        return Err(e.into());
                    }
                }
            }
            None => pending,
        };

        let order = if plan.full {
            let next = plan.next_status.unwrap_or(order.status);
            orders::set_status(&mut tx, id, next, Some(PaymentStatus::Refunded)).await?
        } else {
            order
        };
        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            %amount,
            full = plan.full,
            status = %refund.status,
            "Refund recorded"
        );
        Ok(RefundOutcome { refund, order })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_partial_then_full_refund() {
        let first = plan_refund(
            OrderStatus::Delivered,
            PaymentStatus::Completed,
            d(1000),
            d(0),
            d(400),
        )
        .unwrap();
        assert!(!first.full);
        assert_eq!(first.next_status, None);

        let rest = plan_refund(
            OrderStatus::Delivered,
            PaymentStatus::Completed,
            d(1000),
            d(400),
            d(600),
        )
        .unwrap();
        assert!(rest.full);
        assert_eq!(rest.next_status, Some(OrderStatus::Refunded));
    }

    #[test]
    fn test_refund_cannot_exceed_balance() {
        let err = plan_refund(
            OrderStatus::Confirmed,
            PaymentStatus::Completed,
            d(1000),
            d(900),
            d(101),
        )
        .unwrap_err();
        assert!(matches!(err, OrderAdminError::ExceedsRefundable { available } if available == d(100)));
    }

    #[test]
    fn test_refund_amount_must_be_positive() {
        assert!(matches!(
            plan_refund(OrderStatus::Confirmed, PaymentStatus::Completed, d(10), d(0), d(0)),
            Err(OrderAdminError::InvalidAmount)
        ));
    }

    #[test]
    fn test_pending_orders_are_not_refundable() {
        assert!(matches!(
            plan_refund(OrderStatus::Pending, PaymentStatus::Pending, d(10), d(0), d(5)),
            Err(OrderAdminError::NotRefundable)
        ));
        assert!(matches!(
            plan_refund(OrderStatus::Refunded, PaymentStatus::Refunded, d(10), d(0), d(5)),
            Err(OrderAdminError::NotRefundable)
        ));
    }

    #[test]
    fn test_cancelled_paid_order_keeps_status() {
        let plan = plan_refund(
            OrderStatus::Cancelled,
            PaymentStatus::Completed,
            d(500),
            d(0),
            d(500),
        )
        .unwrap();
        assert!(plan.full);
        assert_eq!(plan.next_status, None);

        assert!(matches!(
            plan_refund(OrderStatus::Cancelled, PaymentStatus::Pending, d(500), d(0), d(500)),
            Err(OrderAdminError::NotRefundable)
        ));
    }

    #[test]
    fn test_payment_status_follows_fulfilment() {
        assert_eq!(
            payment_status_after(
                PaymentMethod::Manual,
                PaymentStatus::Pending,
                OrderStatus::Delivered
            ),
            Some(PaymentStatus::Completed)
        );
        assert_eq!(
            payment_status_after(
                PaymentMethod::Razorpay,
                PaymentStatus::Completed,
                OrderStatus::Delivered
            ),
            None
        );
        assert_eq!(
            payment_status_after(
                PaymentMethod::Razorpay,
                PaymentStatus::Completed,
                OrderStatus::Refunded
            ),
            Some(PaymentStatus::Refunded)
        );
        assert_eq!(
            payment_status_after(
                PaymentMethod::Manual,
                PaymentStatus::Pending,
                OrderStatus::Shipped
            ),
            None
        );
    }
}
