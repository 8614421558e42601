//! # sonho-core: Pure Business Logic for Sonho Doce
//!
//! Everything the bakery counter needs to reason about a sale without touching
//! a database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sonho Doce Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/web (axum service)                         │   │
//! │  │    access gate ──► POS commands ──► Checkout Orchestrator       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sonho-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │ product   │  │   │
//! │  │   │   Sale    │  │ discount  │  │ CartPhase │  │   form    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌──────────────┐                              │   │
//! │  │   │  catalog  │  │ notification │                              │   │
//! │  │   │ filtering │  │  toast queue │                              │   │
//! │  │   └───────────┘  └──────────────┘                              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 sonho-db (Database Layer)                       │   │
//! │  │        Catalog Store, Sales Ledger, users (SQLite)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Category, Role, ...)
//! - [`money`] - Money type with integer arithmetic in centavos
//! - [`cart`] - The Cart Engine and its checkout phase machine
//! - [`catalog`] - Catalog snapshot filtering, pagination and dashboard stats
//! - [`notification`] - Auto-expiring user notifications
//! - [`validation`] - Product form and sign-up validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use sonho_core::money::Money;
//!
//! let subtotal = Money::from_cents(2000); // R$ 20,00
//! let discount = subtotal.percentage(1000); // 10%
//! assert_eq!(discount.cents(), 200);
//! assert_eq!((subtotal - discount).to_string(), "R$ 18,00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod notification;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartPhase};
pub use catalog::{CatalogQuery, CatalogSnapshot, DashboardStats, Page};
pub use error::{CartWarning, CoreError, ValidationError};
pub use money::Money;
pub use notification::{Notification, NotificationQueue, Severity};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Discount unlocked by the manager override code, in basis points (10%).
pub const DEFAULT_DISCOUNT_BPS: u32 = 1000;

/// Factory value of the shared manager override code.
///
/// Deployments override it through configuration; it is a shared secret,
/// not a per-user credential.
pub const DEFAULT_OVERRIDE_CODE: &str = "1234";

/// How long a notification stays visible, in seconds.
pub const NOTIFICATION_TTL_SECS: i64 = 3;

/// Products shown per page on the manager's product list.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Image token used when a product is saved without one.
pub const DEFAULT_PRODUCT_IMAGE: &str = "🍞";

/// Longest accepted product name, in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Highest accepted product price: R$ 99.999,99.
pub const MAX_PRICE_CENTS: i64 = 9_999_999;
