//! # Store Traits
//!
//! The two collaborators the Checkout Orchestrator writes to, as traits.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Checkout Orchestrator (apps/web)                                      │
//! │        │                          │                                     │
//! │        │ &impl SalesLedger        │ &impl CatalogStore                  │
//! │        ▼                          ▼                                     │
//! │   SaleRepository            ProductRepository      (SQLite, this crate) │
//! │   or a failing test double  or a failing test double                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both traits are object-safe via `async_trait`, so tests can wrap the real
//! repositories and inject a failure at any single step.

use async_trait::async_trait;
use serde::Serialize;

use sonho_core::{Money, PaymentMethod, Product, ProductDraft, Sale, SaleItemSnapshot, SaleWithItems};

use crate::error::DbResult;

/// Outcome of the atomic conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was at least `qty`; this is what is left.
    Applied { remaining: i64 },
    /// Stock was below `qty`; nothing was written.
    Insufficient { available: i64 },
}

/// Durable product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every product, ordered by name then id.
    async fn list_all(&self) -> DbResult<Vec<Product>>;

    async fn get(&self, id: &str) -> DbResult<Option<Product>>;

    /// Live stock level. `NotFound` if the product no longer exists.
    async fn get_stock(&self, id: &str) -> DbResult<i64>;

    /// Overwrites the stock level (restock from the dashboard).
    async fn set_stock(&self, id: &str, stock: i64) -> DbResult<Product>;

    /// `stock = stock - qty` only if `stock >= qty`, as one statement.
    async fn decrement_stock(&self, id: &str, qty: i64) -> DbResult<StockDecrement>;

    async fn insert(&self, draft: &ProductDraft) -> DbResult<Product>;

    async fn update(&self, id: &str, draft: &ProductDraft) -> DbResult<Product>;

    /// Sale items keep their snapshot; their `product_id` becomes NULL.
    async fn delete(&self, id: &str) -> DbResult<()>;
}

/// Headline totals of the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub sales_count: i64,
    pub revenue_cents: i64,
}

/// Append-only record of completed sales.
#[async_trait]
pub trait SalesLedger: Send + Sync {
    /// Creates a sale with a generated id and timestamp.
    async fn insert_sale(&self, total: Money, payment_method: PaymentMethod) -> DbResult<Sale>;

    /// Writes the whole batch or nothing.
    async fn insert_sale_items(&self, sale_id: &str, items: &[SaleItemSnapshot]) -> DbResult<()>;

    /// Newest first, each sale with its lines.
    async fn list_all_with_items(&self) -> DbResult<Vec<SaleWithItems>>;

    async fn summary(&self) -> DbResult<LedgerSummary>;
}
