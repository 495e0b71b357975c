//! Catalog repository (read-only).

use sqlx::PgPool;

use patra_core::ProductId;

use super::RepositoryError;
use crate::models::{Category, Product, ProductFilter};

/// Product columns joined with the category name. Expects aliases `p` and `c`.
pub(crate) const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.compare_price, p.stock_quantity,
           p.category_id, c.name AS category_name, p.images, p.status, p.tags,
           p.material, p.sku, p.weight, p.is_featured, p.created_at
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id
";

/// Shared `WHERE` clause for the shop listing and its count.
///
/// `$1` search pattern, `$2` category, `$3` min price, `$4` max price; each
/// is skipped when NULL.
const LISTING_WHERE: &str = r"
    WHERE p.status = 'active'
      AND ($1::text IS NULL OR p.name ILIKE $1 OR p.description ILIKE $1)
      AND ($2::uuid IS NULL OR p.category_id = $2)
      AND ($3::numeric IS NULL OR p.price >= $3)
      AND ($4::numeric IS NULL OR p.price <= $4)
";

/// Repository for categories and products.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, description, image_url, sort_order
            FROM shop.category
            WHERE is_active
            ORDER BY sort_order, name
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// One page of active products matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = filter.search_pattern();

        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} {LISTING_WHERE} ORDER BY {} LIMIT $5 OFFSET $6",
            filter.sort.order_by()
        ))
        .bind(pattern.as_deref())
        .bind(filter.category)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.product p {LISTING_WHERE}"
        ))
        .bind(pattern.as_deref())
        .bind(filter.category)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// Newest featured products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.status = 'active' AND p.is_featured \
             ORDER BY p.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// An active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_product(
        &self,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = $1 AND p.status = 'active'"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }
}
