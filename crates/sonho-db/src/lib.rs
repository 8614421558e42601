//! # sonho-db: Database Layer for Sonho Doce
//!
//! The Catalog Store, the Sales Ledger and the staff accounts, on SQLite via
//! sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sonho Doce Data Flow                              │
//! │                                                                         │
//! │  apps/web (POS commands, Checkout Orchestrator, dashboard)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     sonho-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │   │    │
//! │  │   │               │    │ ProductRepo ──► CatalogStore      │   │    │
//! │  │   │ SqlitePool    │◄───│ SaleRepo ─────► SalesLedger       │   │    │
//! │  │   │               │    │ UserRepo        │   │ 001_init.sql │   │    │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘   │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database (sonho.db)                  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`store`] - `CatalogStore` / `SalesLedger` traits
//! - [`repository`] - SQLite implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sonho_db::{CatalogStore, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("sonho.db")).await?;
//! let catalog = db.products().list_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use store::{CatalogStore, LedgerSummary, SalesLedger, StockDecrement};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::{NewUser, UserCredentials, UserRepository};
