//! # Error Types
//!
//! Domain-specific error types for sonho-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sonho-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CartWarning      - Cart Engine refusals shown as notifications    │
//! │                                                                         │
//! │  sonho-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  apps/web errors                                                       │
//! │  ├── CheckoutError    - Orchestrator step failures                     │
//! │  └── ApiError         - What the HTTP client sees (serialized)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `CartWarning` never fails the request: the cart refuses the edit and
//! leaves its state untouched.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Live stock is lower than the quantity being sold.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart built with 5 × Sonho (snapshot said stock = 8)
    ///      │
    ///      ▼
    /// Another terminal sells 5, live stock = 3
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Sonho", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Cart refused an operation.
    #[error(transparent)]
    Cart(#[from] CartWarning),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Cart Warning
// =============================================================================

/// Reasons the Cart Engine refuses an edit.
///
/// None of these change the cart; the caller turns them into an error
/// notification and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartWarning {
    /// Product has no stock left in the catalog snapshot.
    #[error("Product {product_name} is out of stock")]
    OutOfStock { product_name: String },

    /// Quantity would exceed the last-loaded stock.
    #[error("Maximum stock reached for {product_name} ({stock} available)")]
    StockLimitReached { product_name: String, stock: i64 },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Manager override code did not match.
    #[error("Invalid manager code")]
    InvalidDiscountCode,

    /// Cart is locked while the payment dialog is open.
    #[error("Checkout in progress, cancel the payment to edit the cart")]
    CheckoutInProgress,

    /// Checkout needs at least one item.
    #[error("Cart is empty")]
    EmptyCart,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value exceeds a ceiling expressed for humans (e.g. "R$ 99.999,99").
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// Value must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (not a number, not an integer, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
