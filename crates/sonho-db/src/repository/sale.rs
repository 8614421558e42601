//! # Sale Repository
//!
//! SQLite implementation of the [`SalesLedger`].
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── insert_sale(total, method) → Sale { id, created_at }            │
//! │                                                                         │
//! │  2. ADD ITEMS (one transaction for the batch)                           │
//! │     └── insert_sale_items(sale_id, lines)                               │
//! │                                                                         │
//! │  3. READ (manager dashboard)                                            │
//! │     └── list_all_with_items() → newest first, lines nested              │
//! │                                                                         │
//! │  Sales are never updated or deleted.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use sonho_core::{Money, PaymentMethod, Sale, SaleItem, SaleItemSnapshot, SaleWithItems};

use crate::error::{DbError, DbResult};
use crate::store::{LedgerSummary, SalesLedger};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }
}

#[async_trait]
impl SalesLedger for SaleRepository {
    async fn insert_sale(&self, total: Money, payment_method: PaymentMethod) -> DbResult<Sale> {
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            total_cents: total.cents(),
            payment_method,
            created_at: Utc::now(),
        };

        debug!(id = %sale.id, total = %total, method = %payment_method, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales (id, total_cents, payment_method, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&sale.id)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    async fn insert_sale_items(&self, sale_id: &str, items: &[SaleItemSnapshot]) -> DbResult<()> {
        debug!(sale_id = %sale_id, count = items.len(), "Inserting sale items");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name, product_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(sale_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.product_price_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    async fn list_all_with_items(&self) -> DbResult<Vec<SaleWithItems>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, total_cents, payment_method, created_at
            FROM sales
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, product_price_cents, quantity
            FROM sale_items
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        let history = sales
            .into_iter()
            .map(|sale| SaleWithItems {
                items: by_sale.remove(&sale.id).unwrap_or_default(),
                sale,
            })
            .collect::<Vec<_>>();

        debug!(count = history.len(), "Loaded sales history");
        Ok(history)
    }

    async fn summary(&self) -> DbResult<LedgerSummary> {
        let (sales_count, revenue_cents): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        Ok(LedgerSummary {
            sales_count,
            revenue_cents,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::store::CatalogStore;
    use sonho_core::{Category, ProductDraft};

    fn line(product_id: &str, name: &str, price: i64, qty: i64) -> SaleItemSnapshot {
        SaleItemSnapshot {
            product_id: product_id.to_string(),
            product_name: name.to_string(),
            product_price_cents: price,
            quantity: qty,
        }
    }

    #[tokio::test]
    async fn test_sale_with_items_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductDraft {
                name: "Pão Francês".to_string(),
                price_cents: 50,
                category: Category::Paes,
                stock: 100,
                image: "🥖".to_string(),
            })
            .await
            .unwrap();

        let ledger = db.sales();
        let sale = ledger
            .insert_sale(Money::from_cents(500), PaymentMethod::Dinheiro)
            .await
            .unwrap();
        ledger
            .insert_sale_items(&sale.id, &[line(&product.id, "Pão Francês", 50, 10)])
            .await
            .unwrap();

        let history = ledger.list_all_with_items().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sale.payment_method, PaymentMethod::Dinheiro);
        assert_eq!(history[0].items.len(), 1);
        assert_eq!(history[0].items[0].quantity, 10);
        assert_eq!(history[0].items[0].line_total().cents(), 500);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.sales();

        let first = ledger.insert_sale(Money::from_cents(100), PaymentMethod::Pix).await.unwrap();
        let second = ledger.insert_sale(Money::from_cents(200), PaymentMethod::Cartao).await.unwrap();

        let ids: Vec<_> = ledger
            .list_all_with_items()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.sale.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let summary = ledger.summary().await.unwrap();
        assert_eq!(summary.sales_count, 2);
        assert_eq!(summary.revenue_cents, 300);
    }

    #[tokio::test]
    async fn test_item_batch_is_all_or_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductDraft {
                name: "Sonho".to_string(),
                price_cents: 450,
                category: Category::Doces,
                stock: 10,
                image: "🍩".to_string(),
            })
            .await
            .unwrap();
        let ledger = db.sales();
        let sale = ledger.insert_sale(Money::from_cents(900), PaymentMethod::Pix).await.unwrap();

        // Second line violates CHECK (quantity >= 1)
        let result = ledger
            .insert_sale_items(
                &sale.id,
                &[line(&product.id, "Sonho", 450, 2), line(&product.id, "Sonho", 450, 0)],
            )
            .await;

        assert!(result.is_err());
        let history = ledger.list_all_with_items().await.unwrap();
        assert_eq!(history[0].sale.id, sale.id);
        assert!(history[0].items.is_empty());
    }

    #[tokio::test]
    async fn test_deleting_product_keeps_sale_item_snapshot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductDraft {
                name: "Bolo de Cenoura".to_string(),
                price_cents: 3500,
                category: Category::Bolos,
                stock: 3,
                image: "🎂".to_string(),
            })
            .await
            .unwrap();

        let ledger = db.sales();
        let sale = ledger.insert_sale(Money::from_cents(3500), PaymentMethod::Pix).await.unwrap();
        ledger
            .insert_sale_items(&sale.id, &[line(&product.id, "Bolo de Cenoura", 3500, 1)])
            .await
            .unwrap();

        db.products().delete(&product.id).await.unwrap();

        let history = ledger.list_all_with_items().await.unwrap();
        let items = &history[0].items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, None);
        assert_eq!(items[0].product_name, "Bolo de Cenoura");
    }
}
