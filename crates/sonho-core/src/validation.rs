//! # Validation Module
//!
//! Input validation for the manager's product form and staff sign-up.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP body (serde)                                             │
//! │  ├── Numbers or strings accepted for price / stock                      │
//! │  └── Missing fields default to empty                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Every field checked, errors collected per field                    │
//! │  └── Output: a typed draft the stores accept                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (stock >= 0), CHECK (price_cents >= 0)                       │
//! │  └── UNIQUE (email)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sonho_core::validation::{validate_product_form, ProductForm};
//!
//! let form = ProductForm {
//!     name: "  Sonho de Creme ".to_string(),
//!     price: "4.5".to_string(),
//!     stock: "".to_string(),
//!     category: "Doces".to_string(),
//!     image: None,
//! };
//!
//! let draft = validate_product_form(&form).unwrap();
//! assert_eq!(draft.name, "Sonho de Creme");
//! assert_eq!(draft.price_cents, 450);
//! assert_eq!(draft.stock, 0);
//! assert_eq!(draft.image, "🍞");
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;
use thiserror::Error;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Category, ProductDraft, Role};
use crate::{DEFAULT_PRODUCT_IMAGE, MAX_PRICE_CENTS, MAX_PRODUCT_NAME_LEN};

/// Result type for single-field validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted search string.
pub const MAX_SEARCH_LEN: usize = 100;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Field Errors
// =============================================================================

/// Validation failures keyed by form field name.
///
/// Only the first failure per field is kept, which is what the form shows
/// next to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(BTreeMap<String, ValidationError>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors::default()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.entry(err.field().to_string()).or_insert(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.get(field)
    }

    /// Field name → human-readable message.
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(field, err)| (field.clone(), err.to_string()))
            .collect()
    }

    fn collect<T>(&mut self, result: ValidationResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }
}

impl From<ValidationError> for FieldErrors {
    fn from(err: ValidationError) -> Self {
        let mut errors = FieldErrors::new();
        errors.push(err);
        errors
    }
}

// =============================================================================
// Product Form
// =============================================================================

/// Product form as submitted by the dashboard.
///
/// `price` and `stock` arrive either as JSON numbers or as the raw text of
/// the input; both end up as strings here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string_from_number")]
    pub price: String,
    #[serde(default, deserialize_with = "deserialize_string_from_number")]
    pub stock: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Validates every field of the product form.
///
/// ## Rules
/// - `name`: trimmed, 1 to 100 characters
/// - `price`: decimal, `0 < price <= 99.999,99` as typed, then rounded to centavos;
///   empty counts as 0
/// - `stock`: whole number `>= 0`; empty counts as 0
/// - `category`: one of the fixed categories
/// - `image`: empty or missing becomes `🍞`
pub fn validate_product_form(form: &ProductForm) -> Result<ProductDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = errors.collect(validate_product_name(&form.name));
    let price_cents = errors.collect(parse_price_cents(&form.price));
    let stock = errors.collect(parse_stock(&form.stock));
    let category = errors.collect(Category::from_str(&form.category));

    let image = form
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PRODUCT_IMAGE)
        .to_string();

    match (name, price_cents, stock, category) {
        (Some(name), Some(price_cents), Some(stock), Some(category)) if errors.is_empty() => {
            Ok(ProductDraft {
                name,
                price_cents,
                category,
                stock,
                image,
            })
        }
        _ => Err(errors),
    }
}

/// Validates a product name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use sonho_core::validation::validate_product_name;
///
/// assert_eq!(validate_product_name(" Broa ").unwrap(), "Broa");
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Parses a price typed into the form into centavos.
///
/// The bounds `0 < price <= 99.999,99` apply to the typed value, before it
/// is rounded half away from zero to two places (`"4.555"` becomes 456).
/// A lone comma is read as the decimal separator (`"4,50"`).
pub fn parse_price_cents(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };

    let value = if normalized.is_empty() {
        Decimal::ZERO
    } else {
        Decimal::from_str(&normalized).map_err(|_| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must be a number".to_string(),
        })?
    };

    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    if value > Decimal::new(MAX_PRICE_CENTS, 2) {
        return Err(price_too_large());
    }

    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|c| c.to_i64())
        .ok_or_else(price_too_large)
}

fn price_too_large() -> ValidationError {
    ValidationError::TooLarge {
        field: "price".to_string(),
        max: Money::from_cents(MAX_PRICE_CENTS).to_string(),
    }
}

/// Parses a stock count typed into the form.
///
/// `"12"` and `"12.0"` are accepted; `"1.5"` is not.
pub fn parse_stock(raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "stock".to_string(),
        reason: "must be a whole number".to_string(),
    };

    let stock = match raw.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            let value = Decimal::from_str(raw).map_err(|_| invalid())?;
            if !value.fract().is_zero() {
                return Err(invalid());
            }
            value.to_i64().ok_or_else(invalid)?
        }
    };

    validate_stock(stock)?;
    Ok(stock)
}

/// Validates a stock level for a direct restock.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Sign-up
// =============================================================================

/// Sign-up form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
}

/// A sign-up that passed validation. The password is still plain text;
/// hashing is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDraft {
    /// Trimmed and lowercased.
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

pub fn validate_signup(form: &SignupForm) -> Result<SignupDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = errors.collect(validate_email(&form.email));
    let password = errors.collect(validate_password(&form.password));
    let full_name = errors.collect(validate_full_name(&form.full_name));
    let role = errors.collect(Role::from_str(&form.role));

    match (email, password, full_name, role) {
        (Some(email), Some(password), Some(full_name), Some(role)) if errors.is_empty() => {
            Ok(SignupDraft {
                email,
                password,
                full_name,
                role,
            })
        }
        _ => Err(errors),
    }
}

/// Normalizes an email address (trim + lowercase) and checks it has an `@`.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if !email.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must contain @".to_string(),
        });
    }

    Ok(email)
}

fn validate_password(password: &str) -> ValidationResult<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(password.to_string())
}

fn validate_full_name(full_name: &str) -> ValidationResult<String> {
    let full_name = full_name.trim();

    if full_name.is_empty() {
        return Err(ValidationError::Required {
            field: "full_name".to_string(),
        });
    }

    if full_name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "full_name".to_string(),
            max: 100,
        });
    }

    Ok(full_name.to_string())
}

// =============================================================================
// Query Validators
// =============================================================================

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (matches everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

/// Validates a 1-based page number.
pub fn validate_page(page: usize) -> ValidationResult<usize> {
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    Ok(page)
}

// =============================================================================
// Unit Tests
// =============================================================================
