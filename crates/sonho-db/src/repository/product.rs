//! # Product Repository
//!
//! SQLite implementation of the [`CatalogStore`].
//!
//! ## Key Operations
//! - Ordered catalog reads
//! - CRUD from the manager dashboard
//! - Atomic conditional stock decrement at checkout
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two terminals, one tray of Sonhos                    │
//! │                                                                         │
//! │  ❌ read-then-write (lost update)                                       │
//! │     A: SELECT stock → 5        B: SELECT stock → 5                      │
//! │     A: SET stock = 5 - 4 = 1   B: SET stock = 5 - 3 = 2   (7 sold!)     │
//! │                                                                         │
//! │  ✅ conditional decrement                                               │
//! │     UPDATE products SET stock = stock - ?2                              │
//! │     WHERE id = ?1 AND stock >= ?2                                       │
//! │                                                                         │
//! │     A: 5 → 1 (row updated)     B: 1 < 3 → no row → Insufficient(1)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use sonho_core::{Product, ProductDraft};

use crate::error::{DbError, DbResult};
use crate::store::{CatalogStore, StockDecrement};

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, category, stock, image, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let catalog = repo.list_all().await?;
/// let outcome = repo.decrement_stock(&id, 3).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Counts products (used by the seed tool and the dashboard).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl CatalogStore for ProductRepository {
    async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Loaded catalog");
        Ok(products)
    }

    async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn get_stock(&self, id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Product", id))
    }

    async fn set_stock(&self, id: &str, stock: i64) -> DbResult<Product> {
        debug!(id = %id, stock = stock, "Setting stock");

        let sql = format!(
            "UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {PRODUCT_COLUMNS}"
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(stock)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Single-statement conditional decrement.
    ///
    /// When no row is updated the product is re-read once to tell a missing
    /// product (`NotFound`) from a short one (`Insufficient`).
    async fn decrement_stock(&self, id: &str, qty: i64) -> DbResult<StockDecrement> {
        if qty < 1 {
            return Err(DbError::CheckViolation {
                message: format!("decrement quantity must be at least 1, got {qty}"),
            });
        }

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(qty)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match remaining {
            Some(remaining) => {
                debug!(id = %id, qty = qty, remaining = remaining, "Stock decremented");
                Ok(StockDecrement::Applied { remaining })
            }
            None => {
                let available = self.get_stock(id).await?;
                warn!(id = %id, qty = qty, available = available, "Stock decrement refused");
                Ok(StockDecrement::Insufficient { available })
            }
        }
    }

    async fn insert(&self, draft: &ProductDraft) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            price_cents: draft.price_cents,
            category: draft.category,
            stock: draft.stock,
            image: draft.image.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, category, stock, image, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.category)
        .bind(product.stock)
        .bind(&product.image)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update(&self, id: &str, draft: &ProductDraft) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let sql = format!(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                category = ?4,
                stock = ?5,
                image = ?6,
                updated_at = ?7
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&draft.name)
            .bind(draft.price_cents)
            .bind(draft.category)
            .bind(draft.stock)
            .bind(&draft.image)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use sonho_core::Category;

    async fn setup() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn draft(name: &str, price_cents: i64, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price_cents,
            category: Category::Doces,
            stock,
            image: "🍩".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_ordered_by_name() {
        let repo = setup().await;
        repo.insert(&draft("Sonho", 450, 10)).await.unwrap();
        repo.insert(&draft("Brigadeiro", 250, 30)).await.unwrap();
        repo.insert(&draft("Pão de Mel", 600, 5)).await.unwrap();

        let names: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Brigadeiro", "Pão de Mel", "Sonho"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_category_round_trips_through_sqlite() {
        let repo = setup().await;
        let mut bread = draft("Pão Francês", 50, 100);
        bread.category = Category::Paes;
        let inserted = repo.insert(&bread).await.unwrap();

        let loaded = repo.get(&inserted.id).await.unwrap().unwrap();
        assert_eq!(loaded.category, Category::Paes);
        assert_eq!(loaded.name, "Pão Francês");
    }

    #[tokio::test]
    async fn test_decrement_applies_only_when_enough_stock() {
        let repo = setup().await;
        let p = repo.insert(&draft("Sonho", 450, 5)).await.unwrap();

        let first = repo.decrement_stock(&p.id, 4).await.unwrap();
        assert_eq!(first, StockDecrement::Applied { remaining: 1 });

        let second = repo.decrement_stock(&p.id, 3).await.unwrap();
        assert_eq!(second, StockDecrement::Insufficient { available: 1 });
        assert_eq!(repo.get_stock(&p.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_decrement_missing_product_is_not_found() {
        let repo = setup().await;
        let err = repo.decrement_stock("missing", 1).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.get_stock("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_set_stock_and_delete() {
        let repo = setup().await;
        let p = repo.insert(&draft("Bolo", 3500, 2)).await.unwrap();

        let updated = repo.update(&p.id, &draft("Bolo de Fubá", 3200, 4)).await.unwrap();
        assert_eq!(updated.name, "Bolo de Fubá");
        assert_eq!(updated.stock, 4);

        let restocked = repo.set_stock(&p.id, 12).await.unwrap();
        assert_eq!(restocked.stock, 12);

        let err = repo.set_stock(&p.id, -1).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        repo.delete(&p.id).await.unwrap();
        assert!(repo.get(&p.id).await.unwrap().is_none());
        assert!(repo.delete(&p.id).await.unwrap_err().is_not_found());
    }
}
