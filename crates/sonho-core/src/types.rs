//! # Domain Types
//!
//! Core domain types used throughout Sonho Doce.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │      Sale       │   │     SaleItem        │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)       │   │
//! │  │  name           │   │  total_cents    │   │  product_id (weak)  │   │
//! │  │  price_cents    │   │  payment_method │   │  product_name  ❄    │   │
//! │  │  category       │   │  created_at     │   │  product_price ❄    │   │
//! │  │  stock ≥ 0      │   └─────────────────┘   │  quantity ≥ 1       │   │
//! │  │  image (emoji)  │                         └─────────────────────┘   │
//! │  └─────────────────┘                          ❄ = frozen snapshot      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Category     │   │ PaymentMethod   │   │       Role          │   │
//! │  │  Pães, Doces,   │   │  Cartão         │   │  Atendente          │   │
//! │  │  Salgados,      │   │  Dinheiro       │   │  Padeiro            │   │
//! │  │  Bolos, Bebidas │   │  Pix            │   │  Gerente            │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Enum values are stored and serialized with their Portuguese labels, the
//! same strings the bakery staff see.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// Fixed set of product categories.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    #[serde(rename = "Pães")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Pães"))]
    Paes,
    Doces,
    Salgados,
    Bolos,
    Bebidas,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 5] = [
        Category::Paes,
        Category::Doces,
        Category::Salgados,
        Category::Bolos,
        Category::Bebidas,
    ];

    /// Label shown to staff and stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Paes => "Pães",
            Category::Doces => "Doces",
            Category::Salgados => "Salgados",
            Category::Bolos => "Bolos",
            Category::Bebidas => "Bebidas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid. `Cartão` is preselected in the payment dialog.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    /// Card payment on the counter terminal.
    #[default]
    #[serde(rename = "Cartão")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Cartão"))]
    Cartao,
    /// Cash.
    Dinheiro,
    /// Instant bank transfer.
    Pix,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cartao,
        PaymentMethod::Dinheiro,
        PaymentMethod::Pix,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cartao => "Cartão",
            PaymentMethod::Dinheiro => "Dinheiro",
            PaymentMethod::Pix => "Pix",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Role
// =============================================================================

/// Staff role. Only `Gerente` reaches the admin dashboard.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Role {
    Atendente,
    Padeiro,
    Gerente,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Atendente, Role::Padeiro, Role::Gerente];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Atendente => "Atendente",
            Role::Padeiro => "Padeiro",
            Role::Gerente => "Gerente",
        }
    }

    /// Whether this role may use catalog administration and sales history.
    #[inline]
    pub const fn is_manager(&self) -> bool {
        matches!(self, Role::Gerente)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product on the bakery shelf.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Price in centavos.
    pub price_cents: i64,

    pub category: Category,

    /// Units on the shelf; never negative.
    pub stock: i64,

    /// Emoji or icon token shown on the POS tile.
    pub image: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether at least one unit is available.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Validated product fields, ready for insert or update.
///
/// Produced by [`crate::validation::validate_product_form`]; the Catalog Store
/// only ever receives drafts that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    pub price_cents: i64,
    pub category: Category,
    pub stock: i64,
    pub image: String,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed checkout. Immutable once written.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Amount charged, after discount.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale.
///
/// Name and price are copied at checkout time, so the line survives later
/// product edits or deletion (`product_id` becomes `None` on delete).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub product_price_cents: i64,
    pub quantity: i64,
}

impl SaleItem {
    /// Returns the line total (price × quantity) as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.product_price_cents).multiply_quantity(self.quantity)
    }
}

/// A sale line before it has been written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItemSnapshot {
    pub product_id: String,
    pub product_name: String,
    pub product_price_cents: i64,
    pub quantity: i64,
}

/// A sale with its nested lines, as the sales history shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// User Profile
// =============================================================================

/// A staff member as seen by the rest of the system (no credentials).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_portuguese_labels() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(
            serde_json::to_string(&Category::Paes).unwrap(),
            "\"Pães\""
        );
        assert!("Tortas".parse::<Category>().is_err());
    }

    #[test]
    fn test_payment_method_default_is_card() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cartao);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cartao).unwrap(),
            "\"Cartão\""
        );
        assert_eq!("Pix".parse::<PaymentMethod>().unwrap(), PaymentMethod::Pix);
        assert!("Cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_only_gerente_is_manager() {
        assert!(Role::Gerente.is_manager());
        assert!(!Role::Atendente.is_manager());
        assert!(!Role::Padeiro.is_manager());
        assert_eq!("Padeiro".parse::<Role>().unwrap(), Role::Padeiro);
    }

    #[test]
    fn test_sale_item_line_total() {
        let item = SaleItem {
            id: "i1".to_string(),
            sale_id: "s1".to_string(),
            product_id: Some("p1".to_string()),
            product_name: "Pão Francês".to_string(),
            product_price_cents: 50,
            quantity: 10,
        };
        assert_eq!(item.line_total().cents(), 500);
    }

    #[test]
    fn test_sale_with_items_flattens_sale_fields() {
        let sale = SaleWithItems {
            sale: Sale {
                id: "s1".to_string(),
                total_cents: 500,
                payment_method: PaymentMethod::Dinheiro,
                created_at: Utc::now(),
            },
            items: vec![],
        };
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["total_cents"], 500);
        assert_eq!(json["payment_method"], "Dinheiro");
        assert!(json["items"].as_array().unwrap().is_empty());
    }
}
