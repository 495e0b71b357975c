//! Cart operations with stock checks.
//!
//! Every write locks the product row first, so two concurrent adds for the
//! same product serialize and the merged quantity is checked against stock
//! that cannot change underneath it.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use patra_core::{ProductId, ProductStatus, UserId};

use crate::db::RepositoryError;
use crate::db::cart::{self, CartRepository};
use crate::db::wishlist;
use crate::models::CartView;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity below one on add.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// No such product.
    #[error("Product not found")]
    ProductNotFound,

    /// Product exists but is not for sale.
    #[error("Product is not available")]
    Unavailable,

    /// Requested quantity exceeds stock.
    #[error("Only {available} items available")]
    InsufficientStock { available: i32 },

    /// Line not in the cart.
    #[error("Item not in cart")]
    NotInCart,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The cart with totals.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        let lines = CartRepository::new(self.pool).list(user_id).await?;
        Ok(CartView::new(lines))
    }

    /// Add `quantity` of a product, merging with any existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity`, `ProductNotFound`, `Unavailable`
    /// or `InsufficientStock` when the add is not allowed.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await?;
        add_in_tx(&mut tx, user_id, product_id, quantity).await?;
        tx.commit().await?;

        self.view(user_id).await
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the product has no line, or
    /// `InsufficientStock` if `quantity` exceeds stock.
    pub async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await?;

        if quantity <= 0 {
            if !cart::delete_line(&mut tx, user_id, product_id).await? {
                return Err(CartError::NotInCart);
            }
        } else {
            if cart::quantity_of(&mut tx, user_id, product_id).await?.is_none() {
                return Err(CartError::NotInCart);
            }
            let stock = cart::lock_product_stock(&mut tx, product_id)
                .await?
                .ok_or(CartError::ProductNotFound)?;
            check_stock(stock.status, stock.stock_quantity, quantity)?;
            cart::upsert(&mut tx, user_id, product_id, quantity).await?;
        }

        tx.commit().await?;
        self.view(user_id).await
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if there was no such line.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), CartError> {
        if CartRepository::new(self.pool)
            .remove(user_id, product_id)
            .await?
        {
            Ok(())
        } else {
            Err(CartError::NotInCart)
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        CartRepository::new(self.pool).clear(user_id).await?;
        Ok(())
    }

    /// Move a wishlist product into the cart (quantity 1) and drop it from the
    /// wishlist, atomically.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::add`]. Nothing changes on error.
    pub async fn move_from_wishlist(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await?;
        add_in_tx(&mut tx, user_id, product_id, 1).await?;
        wishlist::remove(&mut tx, user_id, product_id).await?;
        tx.commit().await?;

        self.view(user_id).await
    }
}

/// Merge `quantity` into the cart inside the caller's transaction.
///
/// # Errors
///
/// See [`CartService::add`].
pub async fn add_in_tx(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
) -> Result<i32, CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity);
    }

    let stock = cart::lock_product_stock(conn, product_id)
        .await?
        .ok_or(CartError::ProductNotFound)?;

    let existing = cart::quantity_of(conn, user_id, product_id)
        .await?
        .unwrap_or(0);
    let merged = existing.saturating_add(quantity);
    check_stock(stock.status, stock.stock_quantity, merged)?;

    cart::upsert(conn, user_id, product_id, merged).await?;
    Ok(merged)
}

/// Whether `wanted` units of a product with this status and stock can sit in a cart.
fn check_stock(status: ProductStatus, stock_quantity: i32, wanted: i32) -> Result<(), CartError> {
    if status != ProductStatus::Active {
        return Err(CartError::Unavailable);
    }
    if wanted > stock_quantity {
        return Err(CartError::InsufficientStock {
            available: stock_quantity.max(0),
        });
    }
    Ok(())
}
