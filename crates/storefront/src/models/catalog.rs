//! Catalog types: categories, products and the shop filter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use patra_core::{CategoryId, ProductId, ProductStatus};

/// An active category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i32,
}

/// A product joined with its category name.
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
}

/// Sort order for the shop listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
    Newest,
    /// Featured products first, then newest.
    Popularity,
}

impl ProductSort {
    /// `ORDER BY` clause. Only ever one of these fixed strings.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Name => "p.name ASC, p.id",
            Self::PriceLow => "p.price ASC, p.name",
            Self::PriceHigh => "p.price DESC, p.name",
            Self::Newest => "p.created_at DESC, p.id",
            Self::Popularity => "p.is_featured DESC, p.created_at DESC, p.id",
        }
    }
}

/// Query parameters for `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductFilter {
    pub const DEFAULT_PER_PAGE: u32 = 24;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Page size, clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(
            self.per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        )
    }

    /// Row offset for the requested page (pages start at 1).
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }

    /// `%term%` for `ILIKE`, with LIKE metacharacters escaped.
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults() {
        let filter = ProductFilter::default();
        assert_eq!(filter.limit(), 24);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_paging_clamps() {
        let filter = ProductFilter {
            page: Some(3),
            per_page: Some(500),
            ..ProductFilter::default()
        };
        assert_eq!(filter.limit(), 100);
        assert_eq!(filter.offset(), 200);

        let zero = ProductFilter {
            page: Some(0),
            per_page: Some(0),
            ..ProductFilter::default()
        };
        assert_eq!(zero.limit(), 1);
        assert_eq!(zero.offset(), 0);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = ProductFilter {
            search: Some(" 100%_copper ".to_owned()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.search_pattern().unwrap(), "%100\\%\\_copper%");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = ProductFilter {
            search: Some("   ".to_owned()),
            ..ProductFilter::default()
        };
        assert!(filter.search_pattern().is_none());
    }

    #[test]
    fn test_sort_parses_from_query_values() {
        let sort: ProductSort = serde_json::from_str("\"price_high\"").unwrap();
        assert_eq!(sort, ProductSort::PriceHigh);
        assert!(ProductSort::Popularity.order_by().starts_with("p.is_featured DESC"));
    }
}
