//! # Repository Module
//!
//! SQLite repositories for Sonho Doce.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler / Checkout Orchestrator                                   │
//! │       │                                                                 │
//! │       │  db.products().decrement_stock(&id, 3)                          │
//! │       ▼                                                                 │
//! │  ProductRepository ── impl CatalogStore                                 │
//! │  SaleRepository    ── impl SalesLedger                                  │
//! │  UserRepository                                                         │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog reads, admin CRUD, stock decrement
//! - [`sale::SaleRepository`] - Sales and their line items
//! - [`user::UserRepository`] - Staff accounts

pub mod product;
pub mod sale;
pub mod user;
