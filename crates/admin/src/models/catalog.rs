//! Catalog management types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use patra_core::{CategoryId, ProductId, ProductStatus};

/// A row of `shop.category`, with how many products use it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Body for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryInputError {
    #[error("Category name is required")]
    NameRequired,
}

impl CategoryInput {
    /// Trim text fields and check the name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryInputError::NameRequired` for a blank name.
    pub fn normalize(mut self) -> Result<Self, CategoryInputError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(CategoryInputError::NameRequired);
        }
        self.description = blank_to_none(self.description);
        self.image_url = blank_to_none(self.image_url);
        Ok(self)
    }
}

/// A product row with its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub category_id: CategoryId,
    pub category_name: Option<String>,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub tags: Vec<String>,
    pub material: Option<String>,
    pub sku: Option<String>,
    pub weight: Option<Decimal>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for the product list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
}

impl ProductListQuery {
    /// `%term%` for `ILIKE` over name and sku, with LIKE metacharacters escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{escaped}%"))
    }
}

/// Body for creating or replacing a product. Images are managed through
/// the upload endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    pub material: Option<String>,
    pub sku: Option<String>,
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductInputError {
    #[error("Product name is required")]
    NameRequired,
    #[error("Price must be positive")]
    PriceNotPositive,
    #[error("Compare price must be greater than price")]
    ComparePriceTooLow,
    #[error("Stock quantity cannot be negative")]
    NegativeStock,
    #[error("Category is required")]
    CategoryRequired,
    #[error("Weight cannot be negative")]
    NegativeWeight,
}

impl ProductInput {
    /// Trim text fields, drop blank tags and check every rule.
    ///
    /// Returns the input with `category_id` guaranteed present.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn normalize(mut self) -> Result<(Self, CategoryId), ProductInputError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(ProductInputError::NameRequired);
        }
        if self.price <= Decimal::ZERO {
            return Err(ProductInputError::PriceNotPositive);
        }
        if self.compare_price.is_some_and(|compare| compare <= self.price) {
            return Err(ProductInputError::ComparePriceTooLow);
        }
        if self.stock_quantity < 0 {
            return Err(ProductInputError::NegativeStock);
        }
        if self.weight.is_some_and(|w| w < Decimal::ZERO) {
            return Err(ProductInputError::NegativeWeight);
        }
        let category_id = self.category_id.ok_or(ProductInputError::CategoryRequired)?;

        self.description = blank_to_none(self.description);
        self.material = blank_to_none(self.material);
        self.sku = blank_to_none(self.sku);
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();

        Ok((self, category_id))
    }
}

const fn default_true() -> bool {
    true
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn input() -> ProductInput {
        ProductInput {
            name: "  Copper Jug  ".to_owned(),
            description: Some("   ".to_owned()),
            price: Decimal::from(1499),
            compare_price: Some(Decimal::from(1799)),
            stock_quantity: 12,
            category_id: Some(CategoryId::new()),
            status: ProductStatus::Active,
            tags: vec![" copper ".to_owned(), String::new()],
            material: Some("Copper".to_owned()),
            sku: Some(" ".to_owned()),
            weight: None,
            is_featured: false,
        }
    }

    #[test]
    fn test_normalize_trims_and_drops_blanks() {
        let (product, _) = input().normalize().unwrap();
        assert_eq!(product.name, "Copper Jug");
        assert_eq!(product.description, None);
        assert_eq!(product.sku, None);
        assert_eq!(product.tags, vec!["copper".to_owned()]);
    }

    #[test]
    fn test_price_must_be_positive() {
        let mut p = input();
        p.price = Decimal::ZERO;
        assert_eq!(p.normalize().unwrap_err(), ProductInputError::PriceNotPositive);
    }

    #[test]
    fn test_compare_price_must_exceed_price() {
        let mut p = input();
        p.compare_price = Some(Decimal::from(1499));
        assert_eq!(p.normalize().unwrap_err(), ProductInputError::ComparePriceTooLow);
    }

    #[test]
    fn test_stock_and_category_rules() {
        let mut p = input();
        p.stock_quantity = -1;
        assert_eq!(p.normalize().unwrap_err(), ProductInputError::NegativeStock);

        let mut p = input();
        p.category_id = None;
        assert_eq!(p.normalize().unwrap_err(), ProductInputError::CategoryRequired);
    }

    #[test]
    fn test_blank_name() {
        let mut p = input();
        p.name = "   ".to_owned();
        assert_eq!(p.normalize().unwrap_err(), ProductInputError::NameRequired);
    }

    #[test]
    fn test_input_parses_from_json() {
        let json = r#"{"name":"Thali","price":"349.00","stock_quantity":4,
                       "category_id":"6f1c2c55-8a51-4d0b-9d0e-0c8f2a1b7e11"}"#;
        let p: ProductInput = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, Decimal::from_str("349.00").unwrap());
        assert_eq!(p.status, ProductStatus::Active);
        assert!(p.tags.is_empty());
    }

    #[test]
    fn test_category_name_required() {
        let c = CategoryInput {
            name: " ".to_owned(),
            description: None,
            image_url: None,
            is_active: true,
            sort_order: 0,
        };
        assert_eq!(c.normalize().unwrap_err(), CategoryInputError::NameRequired);
    }

    #[test]
    fn test_list_search_pattern() {
        let q = ProductListQuery {
            search: Some("SKU_1".to_owned()),
            status: None,
        };
        assert_eq!(q.search_pattern().unwrap(), "%SKU\\_1%");
    }
}
