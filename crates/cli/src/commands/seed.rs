//! Seed the catalog from a YAML file.
//!
//! Categories are matched by name and products by SKU, so running the same
//! file twice changes nothing. Images listed in the file replace the
//! product's images.
//!
//! ```yaml
//! categories:
//!   - name: Brass
//!     description: Traditional brass utensils
//!     sort_order: 1
//!     products:
//!       - name: Brass Lota
//!         sku: BR-LOTA-01
//!         price: 450.00
//!         stock_quantity: 25
//!         material: Brass
//!         tags: [pooja, kitchen]
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgConnection;
use tracing::{error, info};

use patra_core::{CategoryId, ProductStatus};

/// Top level of the catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategorySeed>,
}

/// One category and its products.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// One product.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    pub description: Option<String>,
    pub material: Option<String>,
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub is_featured: bool,
}

/// Rows touched by a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products_inserted: usize,
    pub products_updated: usize,
}

/// Problems that would make the file fail half way through.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut category_names = HashSet::new();
    let mut skus = HashSet::new();

    for category in &catalog.categories {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push("category with an empty name".to_owned());
        } else if !category_names.insert(name) {
            errors.push(format!("category '{name}' appears twice"));
        }

        for product in &category.products {
            let label = format!("{name} / {}", product.name);
            if product.name.trim().is_empty() {
                errors.push(format!("{name}: product with an empty name"));
            }
            if product.sku.trim().is_empty() {
                errors.push(format!("{label}: sku is required"));
            } else if !skus.insert(product.sku.trim()) {
                errors.push(format!("{label}: sku '{}' appears twice", product.sku));
            }
            if product.price <= Decimal::ZERO {
                errors.push(format!("{label}: price must be positive"));
            }
            if product
                .compare_price
                .is_some_and(|compare| compare <= product.price)
            {
                errors.push(format!("{label}: compare_price must exceed price"));
            }
            if product.stock_quantity < 0 {
                errors.push(format!("{label}: stock_quantity cannot be negative"));
            }
        }
    }

    errors
}

/// Seed categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, or a database write fails. Nothing is written unless the
/// whole file applies.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for category in &catalog.categories {
        let category_id = upsert_category(&mut tx, category).await?;
        summary.categories += 1;

        for product in &category.products {
            if upsert_product(&mut tx, category_id, product).await? {
                summary.products_inserted += 1;
            } else {
                summary.products_updated += 1;
            }
        }
    }

    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Products inserted: {}", summary.products_inserted);
    info!("  Products updated: {}", summary.products_updated);
    Ok(())
}

async fn upsert_category(
    conn: &mut PgConnection,
    category: &CategorySeed,
) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.category (name, description, image_url, sort_order)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description,
                image_url = EXCLUDED.image_url,
                sort_order = EXCLUDED.sort_order,
                updated_at = now()
        RETURNING id
        ",
    )
    .bind(category.name.trim())
    .bind(category.description.as_deref())
    .bind(category.image_url.as_deref())
    .bind(category.sort_order)
    .fetch_one(conn)
    .await
}

/// Returns `true` when the product was new.
async fn upsert_product(
    conn: &mut PgConnection,
    category_id: CategoryId,
    product: &ProductSeed,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.product
            (name, description, price, compare_price, stock_quantity, category_id,
             images, status, tags, material, sku, weight, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (sku) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                compare_price = EXCLUDED.compare_price,
                stock_quantity = EXCLUDED.stock_quantity,
                category_id = EXCLUDED.category_id,
                images = EXCLUDED.images,
                status = EXCLUDED.status,
                tags = EXCLUDED.tags,
                material = EXCLUDED.material,
                weight = EXCLUDED.weight,
                is_featured = EXCLUDED.is_featured,
                updated_at = now()
        RETURNING (xmax = 0)
        ",
    )
    .bind(product.name.trim())
    .bind(product.description.as_deref())
    .bind(product.price)
    .bind(product.compare_price)
    .bind(product.stock_quantity)
    .bind(category_id)
    .bind(&product.images)
    .bind(product.status)
    .bind(&product.tags)
    .bind(product.material.as_deref())
    .bind(product.sku.trim())
    .bind(product.weight)
    .bind(product.is_featured)
    .fetch_one(conn)
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
categories:
  - name: Brass
    sort_order: 1
    products:
      - name: Brass Lota
        sku: BR-LOTA-01
        price: 450.00
        stock_quantity: 25
        tags: [pooja]
      - name: Brass Thali
        sku: BR-THALI-01
        price: 1200
        compare_price: 1500
  - name: Copper
    products:
      - name: Copper Jug
        sku: CU-JUG-01
        price: 899.50
        is_featured: true
";

    #[test]
    fn test_parses_sample() {
        let catalog: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        let lota = catalog.categories.first().unwrap().products.first().unwrap();
        assert_eq!(lota.price, Decimal::new(45000, 2));
        assert_eq!(lota.status, ProductStatus::Active);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_duplicate_sku_rejected() {
        let yaml = r"
categories:
  - name: Brass
    products:
      - { name: A, sku: X-1, price: 10 }
  - name: Copper
    products:
      - { name: B, sku: X-1, price: 20 }
";
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 1);
        assert!(errors.first().unwrap().contains("appears twice"));
    }

    #[test]
    fn test_bad_prices_rejected() {
        let yaml = r"
categories:
  - name: Steel
    products:
      - { name: Free, sku: S-0, price: 0 }
      - { name: Odd, sku: S-1, price: 100, compare_price: 90 }
";
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(validate_catalog(&catalog).len(), 2);
    }
}
