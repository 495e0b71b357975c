//! Catalog repository: categories and products.

use sqlx::PgPool;

use patra_core::{CategoryId, ProductId};

use super::{RepositoryError, conflict_on_reference, conflict_on_unique};
use crate::models::{Category, CategoryInput, Product, ProductInput, ProductListQuery};

/// Product columns joined with the category name. Expects aliases `p` and `c`.
const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.compare_price, p.stock_quantity,
           p.category_id, c.name AS category_name, p.images, p.status, p.tags,
           p.material, p.sku, p.weight, p.is_featured, p.created_at, p.updated_at
    FROM shop.product p
    LEFT JOIN shop.category c ON c.id = p.category_id
";

const CATEGORY_SELECT: &str = r"
    SELECT c.id, c.name, c.description, c.image_url, c.is_active, c.sort_order,
           (SELECT COUNT(*) FROM shop.product p WHERE p.category_id = c.id) AS product_count,
           c.created_at
    FROM shop.category c
";

const SKU_TAKEN: &str = "A product with this SKU already exists";
const CATEGORY_TAKEN: &str = "A category with this name already exists";
const CATEGORY_IN_USE: &str = "Category still has products";
const CATEGORY_MISSING: &str = "Category does not exist";

/// Repository for catalog management.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Every category in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "{CATEGORY_SELECT} ORDER BY c.sort_order, c.name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO shop.category (name, description, image_url, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, CATEGORY_TAKEN))?;

        self.get_category(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category =
            sqlx::query_as::<_, Category>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(category)
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist and
    /// `RepositoryError::Conflict` if the new name is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE shop.category
            SET name = $2, description = $3, image_url = $4, is_active = $5,
                sort_order = $6, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.is_active)
        .bind(input.sort_order)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, CATEGORY_TAKEN))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_category(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while products still use it and
    /// `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.product WHERE category_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        if in_use {
            return Err(RepositoryError::Conflict(CATEGORY_IN_USE.to_owned()));
        }

        // The FK still guards a product inserted between the check and the delete.
        let deleted = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| conflict_on_reference(e, CATEGORY_IN_USE))?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Products matching the query, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        query: &ProductListQuery,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r"{PRODUCT_SELECT}
            WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.sku ILIKE $1)
              AND ($2::shop.product_status IS NULL OR p.status = $2)
            ORDER BY p.created_at DESC, p.id"
        ))
        .bind(query.search_pattern())
        .bind(query.status)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Get a product by ID, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Create a product with no images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate SKU or an unknown
    /// category.
    pub async fn create_product(
        &self,
        input: &ProductInput,
        category_id: CategoryId,
    ) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.product
                (name, description, price, compare_price, stock_quantity, category_id,
                 status, tags, material, sku, weight, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.compare_price)
        .bind(input.stock_quantity)
        .bind(category_id)
        .bind(input.status)
        .bind(&input.tags)
        .bind(input.material.as_deref())
        .bind(input.sku.as_deref())
        .bind(input.weight)
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(product_write_error)?;

        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields, keeping its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist and
    /// `RepositoryError::Conflict` for a duplicate SKU or unknown category.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
        category_id: CategoryId,
    ) -> Result<Product, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE shop.product
            SET name = $2, description = $3, price = $4, compare_price = $5,
                stock_quantity = $6, category_id = $7, status = $8, tags = $9,
                material = $10, sku = $11, weight = $12, is_featured = $13,
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.compare_price)
        .bind(input.stock_quantity)
        .bind(category_id)
        .bind(input.status)
        .bind(&input.tags)
        .bind(input.material.as_deref())
        .bind(input.sku.as_deref())
        .bind(input.weight)
        .bind(input.is_featured)
        .execute(self.pool)
        .await
        .map_err(product_write_error)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Cart and wishlist rows go with it; order lines keep
    /// their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let product = self.get_product(id).await?.ok_or(RepositoryError::NotFound)?;

        let deleted = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(product)
    }

    /// Append image URLs in order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn append_images(
        &self,
        id: ProductId,
        urls: &[String],
    ) -> Result<Product, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.product SET images = images || $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(urls)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Remove one image URL (every occurrence).
    ///
    /// Returns the product and whether the URL was present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn remove_image(
        &self,
        id: ProductId,
        url: &str,
    ) -> Result<(Product, bool), RepositoryError> {
        let had_image: Option<bool> = sqlx::query_scalar(
            r"
            UPDATE shop.product p
            SET images = array_remove(p.images, $2), updated_at = now()
            FROM (SELECT id, $2 = ANY(images) AS had FROM shop.product WHERE id = $1) old
            WHERE p.id = old.id
            RETURNING old.had
            ",
        )
        .bind(id)
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        let had_image = had_image.ok_or(RepositoryError::NotFound)?;
        let product = self.get_product(id).await?.ok_or(RepositoryError::NotFound)?;
        Ok((product, had_image))
    }
}

fn product_write_error(e: sqlx::Error) -> RepositoryError {
    match conflict_on_unique(e, SKU_TAKEN) {
        RepositoryError::Database(e) => conflict_on_reference(e, CATEGORY_MISSING),
        other => other,
    }
}
