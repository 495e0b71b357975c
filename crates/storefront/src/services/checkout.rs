//! Checkout: turns a cart into an order.
//!
//! Placing an order runs in one transaction: cart and product rows are
//! locked, stock is validated and decremented, the coupon use is counted,
//! and the order with its lines is written. Nothing is left behind if any
//! step fails.
//!
//! In manual mode the order is confirmed and the cart cleared inside that
//! same transaction. With Razorpay the order stays `pending` and the cart
//! intact until the widget's success callback arrives; that callback is
//! verified by signature and confirms the order exactly once.
//!
//! A shopper who closes the widget can reopen it for the same order with
//! [`CheckoutService::resume_payment`]. Checking out again instead cancels
//! the earlier unpaid orders first, so their stock and coupon uses are not
//! held twice.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use patra_core::pricing::{self, CouponRejection, LineSnapshot, OrderTotals};
use patra_core::{
    AddressError, AddressId, CouponId, MoneyError, OrderId, OrderStatus, PaymentMethod,
    PaymentStatus, ProductStatus, ShippingAddress, UserId, order_number, to_minor_units,
};

use super::razorpay::{CURRENCY, RazorpayClient, RazorpayError};
use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::cart::{self, CartRepository};
use crate::db::coupons;
use crate::db::orders::{self, NewOrder, OrderRepository};
use crate::models::{AddressInput, CartLine, CouponRow, CurrentUser, Order, OrderItem};

/// Errors from checkout and payment confirmation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    CartEmpty,

    #[error("Shipping address is required")]
    AddressRequired,

    #[error("Address not found")]
    AddressNotFound,

    #[error("{0}")]
    InvalidAddress(#[from] AddressError),

    #[error("{product} is no longer available")]
    ItemUnavailable { product: String },

    #[error("Only {available} of {product} available")]
    InsufficientStock { product: String, available: i32 },

    #[error("Invalid coupon code")]
    CouponNotFound,

    #[error("{0}")]
    CouponRejected(#[from] CouponRejection),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Online payment is not enabled")]
    PaymentNotConfigured,

    #[error("Payment does not match this order")]
    GatewayMismatch,

    #[error("Payment verification failed")]
    InvalidSignature,

    #[error("Order can no longer be paid")]
    OrderNotPayable,

    #[error("invalid amount: {0}")]
    Money(#[from] MoneyError),

    #[error("payment gateway error: {0}")]
    Gateway(RazorpayError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl From<RazorpayError> for CheckoutError {
    fn from(e: RazorpayError) -> Self {
        match e {
            RazorpayError::InvalidSignature => Self::InvalidSignature,
            other => Self::Gateway(other),
        }
    }
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    /// A saved address; takes precedence over `address`.
    pub address_id: Option<AddressId>,
    /// A one-off address typed at checkout.
    pub address: Option<AddressInput>,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Body of `POST /api/checkout/payment`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Priced cart, nothing written.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSummary {
    pub items: Vec<CartLine>,
    pub coupon_code: Option<String>,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Prefilled shopper details for the payment widget.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Prefill {
    pub name: String,
    pub email: Option<String>,
    pub contact: String,
}

/// Everything the hosted checkout widget needs.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub key_id: String,
    /// Paise.
    pub amount: i64,
    pub currency: &'static str,
    pub gateway_order_id: String,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
}

/// A freshly placed order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// `None` when no online payment is needed.
    pub payment: Option<PaymentRequest>,
}

/// Result of the payment callback.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub order: Order,
    pub already_confirmed: bool,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    razorpay: Option<&'a RazorpayClient>,
    store_name: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service. Without a Razorpay client, orders are
    /// confirmed for offline payment.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        razorpay: Option<&'a RazorpayClient>,
        store_name: &'a str,
    ) -> Self {
        Self {
            pool,
            razorpay,
            store_name,
        }
    }

    const fn payment_method(&self) -> PaymentMethod {
        if self.razorpay.is_some() {
            PaymentMethod::Razorpay
        } else {
            PaymentMethod::Manual
        }
    }

    /// Price the cart with an optional coupon.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartEmpty`, or a coupon error if the code is
    /// unknown or not applicable.
    pub async fn summary(
        &self,
        user_id: UserId,
        coupon_code: Option<&str>,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let items = CartRepository::new(self.pool).list(user_id).await?;
        if items.is_empty() {
            return Err(CheckoutError::CartEmpty);
        }

        let snapshots: Vec<LineSnapshot> = items.iter().map(CartLine::snapshot).collect();
        let subtotal = pricing::subtotal(&snapshots);

        let coupon = match non_blank(coupon_code) {
            Some(code) => {
                let mut conn = self.pool.acquire().await?;
                Some(apply_coupon(&mut conn, code, subtotal, false).await?)
            }
            None => None,
        };
        let discount = coupon.as_ref().map_or(Decimal::ZERO, |(_, d)| *d);

        Ok(CheckoutSummary {
            items,
            coupon_code: coupon.map(|(row, _)| row.code),
            totals: OrderTotals::compute(&snapshots, discount),
        })
    }

    /// Place an order from the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns a `CheckoutError` describing the first failed check. On any
    /// error before the commit, nothing is written.
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        request: &CheckoutRequest,
    ) -> Result<PlacedOrder, CheckoutError> {
        let shipping = self.resolve_address(user.id, request).await?;
        let method = self.payment_method();

        if method == PaymentMethod::Razorpay {
            self.release_abandoned(user.id).await?;
        }

        let mut tx = self.pool.begin().await?;

        let lines = cart::list_lines(&mut tx, user.id, true).await?;
        if lines.is_empty() {
            return Err(CheckoutError::CartEmpty);
        }
        let snapshots = validate_lines(&lines)?;
        let subtotal = pricing::subtotal(&snapshots);

        let coupon = match non_blank(request.coupon_code.as_deref()) {
            Some(code) => Some(apply_coupon(&mut tx, code, subtotal, true).await?),
            None => None,
        };
        let (coupon_id, discount): (Option<CouponId>, Decimal) = coupon
            .as_ref()
            .map_or((None, Decimal::ZERO), |(row, d)| (Some(row.id), *d));
        let totals = OrderTotals::compute(&snapshots, discount);

        // Nothing to collect online for a fully discounted order.
        let confirm_now = method == PaymentMethod::Manual || totals.total.is_zero();
        let status = if confirm_now {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Pending
        };

        let number = order_number::generate(Utc::now());
        let order = orders::insert(
            &mut tx,
            &NewOrder {
                order_number: &number,
                user_id: user.id,
                status,
                payment_method: method,
                shipping_address: &shipping,
                totals,
                coupon_id,
                notes: non_blank(request.notes.as_deref()),
            },
        )
        .await?;

        for line in &snapshots {
            orders::insert_item(&mut tx, order.id, line).await?;
        }

        if let Some(id) = coupon_id
            && !coupons::record_use(&mut tx, id).await?
        {
            return Err(CouponRejection::Exhausted.into());
        }

        for line in &snapshots {
            if !orders::decrement_stock(&mut tx, line.product_id, line.quantity).await? {
                return Err(CheckoutError::InsufficientStock {
                    product: line.product_name.clone(),
                    available: 0,
                });
            }
        }

        if confirm_now {
            cart::clear(&mut tx, user.id).await?;
        }

        let items = orders::items(&mut tx, order.id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            lines = items.len(),
            "Order placed"
        );

        if confirm_now {
            return Ok(PlacedOrder {
                order,
                items,
                payment: None,
            });
        }

        let Some(razorpay) = self.razorpay else {
            return Err(CheckoutError::PaymentNotConfigured);
        };
        match self.start_payment(razorpay, user, &order).await {
            Ok(payment) => {
                let order = OrderRepository::new(self.pool)
                    .get_for_user(user.id, order.id)
                    .await?
                    .ok_or(CheckoutError::OrderNotFound)?;
                Ok(PlacedOrder {
                    order,
                    items,
                    payment: Some(payment),
                })
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Payment handoff failed, cancelling order");
                let cleanup = self.cancel_unpaid(&order).await;
                Err(handoff_error(order.id, e, cleanup))
            }
        }
    }

    /// Reissue the widget payload for one of the shopper's unpaid orders.
    ///
    /// The gateway order issued at checkout is reused; one is created only
    /// if the order never got one.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` for another shopper's order and
    /// `OrderNotPayable` once the order is paid, cancelled or not an online
    /// payment.
    pub async fn resume_payment(
        &self,
        user: &CurrentUser,
        order_id: OrderId,
    ) -> Result<PaymentRequest, CheckoutError> {
        let razorpay = self.razorpay.ok_or(CheckoutError::PaymentNotConfigured)?;
        let order = OrderRepository::new(self.pool)
            .get_for_user(user.id, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if !awaits_payment(&order) {
            return Err(CheckoutError::OrderNotPayable);
        }

        match order.razorpay_order_id.clone() {
            Some(gateway_order_id) => {
                tracing::info!(order_id = %order.id, "Payment resumed");
                self.payment_request(razorpay, user, &order, gateway_order_id)
            }
            None => self.start_payment(razorpay, user, &order).await,
        }
    }

    /// Handle the widget's success callback.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidSignature` on a forged or mangled
    /// callback (the payment is then marked failed), `OrderNotFound` for
    /// another shopper's order, and `GatewayMismatch` if the gateway order
    /// id differs from the one issued.
    pub async fn confirm_payment(
        &self,
        user_id: UserId,
        callback: &PaymentCallback,
    ) -> Result<PaymentOutcome, CheckoutError> {
        let razorpay = self.razorpay.ok_or(CheckoutError::PaymentNotConfigured)?;
        let repo = OrderRepository::new(self.pool);

        let order = repo
            .get_for_user(user_id, callback.order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if order.razorpay_order_id.as_deref() != Some(callback.razorpay_order_id.as_str()) {
            return Err(CheckoutError::GatewayMismatch);
        }

        if let Err(e) = razorpay.verify_payment_signature(
            &callback.razorpay_order_id,
            &callback.razorpay_payment_id,
            &callback.razorpay_signature,
        ) {
            tracing::warn!(order_id = %order.id, "Payment signature mismatch");
            repo.mark_payment_failed(user_id, order.id).await?;
            return Err(e.into());
        }

        if order.payment_status == PaymentStatus::Completed {
            return Ok(PaymentOutcome {
                order,
                already_confirmed: true,
            });
        }

        let mut tx = self.pool.begin().await?;
        let confirmed = orders::confirm_payment(
            &mut tx,
            order.id,
            &callback.razorpay_order_id,
            &callback.razorpay_payment_id,
        )
        .await?;

        let Some(confirmed) = confirmed else {
            tx.rollback().await?;
            // Lost a race with a concurrent callback, or the order was cancelled.
            let current = repo
                .get_for_user(user_id, order.id)
                .await?
                .ok_or(CheckoutError::OrderNotFound)?;
            if current.payment_status == PaymentStatus::Completed {
                return Ok(PaymentOutcome {
                    order: current,
                    already_confirmed: true,
                });
            }
            return Err(CheckoutError::OrderNotPayable);
        };

        cart::clear(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %confirmed.id,
            payment_id = %callback.razorpay_payment_id,
            "Payment confirmed"
        );

        Ok(PaymentOutcome {
            order: confirmed,
            already_confirmed: false,
        })
    }

    async fn resolve_address(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<ShippingAddress, CheckoutError> {
        if let Some(id) = request.address_id {
            let saved = AddressRepository::new(self.pool)
                .get(user_id, id)
                .await?
                .ok_or(CheckoutError::AddressNotFound)?;
            return Ok(saved.snapshot()?);
        }
        match &request.address {
            Some(input) => Ok(input.snapshot()?),
            None => Err(CheckoutError::AddressRequired),
        }
    }

    async fn start_payment(
        &self,
        razorpay: &RazorpayClient,
        user: &CurrentUser,
        order: &Order,
    ) -> Result<PaymentRequest, CheckoutError> {
        let amount = to_minor_units(order.total_amount)?;
        let gateway_order = razorpay.create_order(amount, &order.order_number).await?;

        OrderRepository::new(self.pool)
            .set_gateway_order_id(order.id, &gateway_order.id)
            .await?;

        self.payment_request(razorpay, user, order, gateway_order.id)
    }

    fn payment_request(
        &self,
        razorpay: &RazorpayClient,
        user: &CurrentUser,
        order: &Order,
        gateway_order_id: String,
    ) -> Result<PaymentRequest, CheckoutError> {
        Ok(PaymentRequest {
            key_id: razorpay.key_id().to_owned(),
            amount: to_minor_units(order.total_amount)?,
            currency: CURRENCY,
            gateway_order_id,
            name: self.store_name.to_owned(),
            description: format!("Order {}", order.order_number),
            prefill: prefill(user, &order.shipping_address),
        })
    }

    /// Cancel the shopper's earlier gateway orders that were never paid,
    /// returning their stock and coupon uses.
    ///
    /// Runs in its own transaction so checkout never holds these locks.
    async fn release_abandoned(&self, user_id: UserId) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let stale = orders::lock_unpaid_gateway_orders(&mut tx, user_id).await?;
        if stale.is_empty() {
            tx.rollback().await?;
            return Ok(());
        }

        let ids: Vec<OrderId> = stale.iter().map(|o| o.id).collect();
        orders::lock_order_products(&mut tx, &ids).await?;

        for order in &stale {
            if orders::cancel_abandoned(&mut tx, order.id).await? {
                orders::restock(&mut tx, order.id).await?;
                if let Some(coupon_id) = order.coupon_id {
                    coupons::release_use(&mut tx, coupon_id).await?;
                }
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    "Released unpaid order"
                );
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Undo a placed order whose payment never started.
    async fn cancel_unpaid(&self, order: &Order) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await?;
        if orders::cancel_unpaid(&mut tx, order.id).await? {
            orders::restock(&mut tx, order.id).await?;
            if let Some(coupon_id) = order.coupon_id {
                coupons::release_use(&mut tx, coupon_id).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Look up a coupon and compute its discount on `subtotal`.
async fn apply_coupon(
    conn: &mut sqlx::PgConnection,
    code: &str,
    subtotal: Decimal,
    lock: bool,
) -> Result<(CouponRow, Decimal), CheckoutError> {
    let row = coupons::find_by_code(conn, code, lock)
        .await?
        .ok_or(CheckoutError::CouponNotFound)?;
    let discount = pricing::coupon_discount(&row.rule(), subtotal, Utc::now())?;
    Ok((row, discount))
}

/// Check every locked cart line is still purchasable and snapshot it.
fn validate_lines(lines: &[CartLine]) -> Result<Vec<LineSnapshot>, CheckoutError> {
    lines
        .iter()
        .map(|line| {
            if line.status != ProductStatus::Active {
                return Err(CheckoutError::ItemUnavailable {
                    product: line.product_name.clone(),
                });
            }
            if line.quantity > line.stock_quantity {
                return Err(CheckoutError::InsufficientStock {
                    product: line.product_name.clone(),
                    available: line.stock_quantity.max(0),
                });
            }
            Ok(line.snapshot())
        })
        .collect()
}

/// The gateway error reaches the shopper even when cancelling the order
/// failed too; the cancel failure is only logged.
fn handoff_error(
    order_id: OrderId,
    gateway: CheckoutError,
    cleanup: Result<(), CheckoutError>,
) -> CheckoutError {
    if let Err(cancel_err) = cleanup {
        tracing::error!(
            %order_id,
            error = %cancel_err,
            "Failed to cancel order after payment handoff failure"
        );
    }
    gateway
}

/// A pending online order whose payment has not gone through.
fn awaits_payment(order: &Order) -> bool {
    order.status == OrderStatus::Pending
        && order.payment_method == PaymentMethod::Razorpay
        && matches!(
            order.payment_status,
            PaymentStatus::Pending | PaymentStatus::Failed
        )
}

fn prefill(user: &CurrentUser, address: &ShippingAddress) -> Prefill {
    let email = user.email.as_str();
    Prefill {
        name: address.full_name.clone(),
        // Phone sign-ups carry a placeholder address the widget should not show.
        email: (!email.ends_with("@temp.com")).then(|| email.to_owned()),
        contact: address.phone.clone(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
