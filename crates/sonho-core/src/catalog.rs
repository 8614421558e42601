//! # Catalog Snapshot
//!
//! The session's last-loaded copy of the product table. The POS screen
//! filters it locally and the Cart Engine checks quantities against it.
//!
//! ```text
//! ┌──────────────┐  list_all   ┌──────────────────┐  filter   ┌──────────────┐
//! │ Catalog Store│ ──────────► │ CatalogSnapshot  │ ────────► │  POS grid    │
//! │   (SQLite)   │   (load /   │  products        │           │              │
//! └──────────────┘   refresh)  │  loaded_at       │  find     │  Cart Engine │
//!                              └──────────────────┘ ────────► └──────────────┘
//! ```
//!
//! The snapshot goes stale as soon as another terminal sells something. It
//! is refreshed on explicit request and after every successful checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{Category, Product, Sale};

// =============================================================================
// Catalog Snapshot
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    loaded_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn new(products: Vec<Product>, loaded_at: DateTime<Utc>) -> Self {
        CatalogSnapshot {
            products,
            loaded_at: Some(loaded_at),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// When the snapshot was taken. `None` until the first load.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn find(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Applies the POS category chip and search box.
    ///
    /// Both filters must hold. Search is a case-insensitive substring match
    /// on the product name; an empty search matches everything.
    pub fn filter(&self, query: &CatalogQuery) -> Vec<&Product> {
        let needle = query.search.trim().to_lowercase();

        self.products
            .iter()
            .filter(|p| query.category.map_or(true, |c| p.category == c))
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .collect()
    }
}

// =============================================================================
// Catalog Query
// =============================================================================

/// Category label that disables the category filter.
pub const ALL_CATEGORIES: &str = "Todos";

/// POS product grid filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// `None` shows every category.
    pub category: Option<Category>,
    pub search: String,
}

impl CatalogQuery {
    /// Builds a query from raw request parameters.
    ///
    /// A missing or empty category, or the `"Todos"` chip, selects all
    /// categories.
    pub fn parse(category: Option<&str>, search: Option<&str>) -> Result<Self, ValidationError> {
        let category = match category.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => None,
            Some(label) => Some(label.parse::<Category>()?),
        };

        Ok(CatalogQuery {
            category,
            search: search.unwrap_or_default().to_string(),
        })
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list, as shown on the manager dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    /// At least 1, even for an empty list.
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// Slices `all` into the requested page.
    ///
    /// Out-of-range pages clamp to the nearest valid one, so deleting the
    /// last product on the last page lands on the new last page.
    pub fn paginate(all: &[T], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = all.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);

        let start = (page - 1) * per_page;
        let items = all.iter().skip(start).take(per_page).cloned().collect();

        Page {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

// =============================================================================
// Dashboard Stats
// =============================================================================

/// Headline figures on the manager dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub sales_count: usize,
    pub revenue_cents: i64,
    pub product_count: usize,
}

impl DashboardStats {
    pub fn compute(products: &[Product], sales: &[Sale]) -> Self {
        DashboardStats {
            sales_count: sales.len(),
            revenue_cents: sales.iter().map(|s| s.total_cents).sum(),
            product_count: products.len(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn product(id: &str, name: &str, category: Category) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price_cents: 100,
            category,
            stock: 10,
            image: "🍞".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                product("1", "Pão Francês", Category::Paes),
                product("2", "Pão de Queijo", Category::Salgados),
                product("3", "Sonho de Creme", Category::Doces),
                product("4", "Bolo de Cenoura", Category::Bolos),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_filter_by_category_and_search() {
        let catalog = sample_catalog();

        let all = catalog.filter(&CatalogQuery::default());
        assert_eq!(all.len(), 4);

        let query = CatalogQuery::parse(Some("Pães"), None).unwrap();
        let names: Vec<_> = catalog.filter(&query).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Pão Francês"]);

        let query = CatalogQuery::parse(Some("Todos"), Some("PÃO")).unwrap();
        assert_eq!(catalog.filter(&query).len(), 2);

        let query = CatalogQuery::parse(Some("Salgados"), Some("pão")).unwrap();
        assert_eq!(catalog.filter(&query).len(), 1);
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let result = CatalogQuery::parse(Some("Pizzas"), None);
        assert!(matches!(result, Err(ValidationError::NotAllowed { .. })));
    }

    #[test]
    fn test_find() {
        let catalog = sample_catalog();
        assert_eq!(catalog.find("3").map(|p| p.name.as_str()), Some("Sonho de Creme"));
        assert!(catalog.find("99").is_none());
        assert!(CatalogSnapshot::default().loaded_at().is_none());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=12).collect();

        let page = Page::paginate(&items, 1, 5);
        assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(page.total_pages, 3);

        let page = Page::paginate(&items, 3, 5);
        assert_eq!(page.items, vec![11, 12]);

        let page = Page::paginate(&items, 9, 5);
        assert_eq!(page.page, 3);

        let empty: Page<u32> = Page::paginate(&[], 0, 5);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_dashboard_stats() {
        let catalog = sample_catalog();
        let sales = vec![
            Sale {
                id: "s1".to_string(),
                total_cents: 1800,
                payment_method: PaymentMethod::Pix,
                created_at: Utc::now(),
            },
            Sale {
                id: "s2".to_string(),
                total_cents: 450,
                payment_method: PaymentMethod::Dinheiro,
                created_at: Utc::now(),
            },
        ];

        let stats = DashboardStats::compute(catalog.products(), &sales);
        assert_eq!(
            stats,
            DashboardStats {
                sales_count: 2,
                revenue_cents: 2250,
                product_count: 4
            }
        );
    }
}
