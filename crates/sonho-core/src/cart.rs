//! # Cart Engine
//!
//! The attendant's in-progress order: product → quantity, availability checks
//! against the last-loaded catalog, and the manager discount.
//!
//! ## Phase Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │          add / update              begin_checkout                       │
//! │   Empty ─────────────► Building ─────────────────► AwaitingPayment      │
//! │     ▲                    ▲  │                         │    │    │       │
//! │     │   last line → 0    │  │                cancel   │    │    │       │
//! │     └────────────────────┼──┘◄────────────────────────┘    │    │       │
//! │     │                    │                     failure:    │    │       │
//! │     │                    │                  stays open ────┘    │       │
//! │     └────────────────────┴──────────────────────────────────────┘       │
//! │                      complete (successful checkout)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! While the payment dialog is open (`AwaitingPayment`) the lines are frozen:
//! the orchestrator is about to persist exactly what the attendant saw.
//!
//! ## Discount
//! The manager discount is an absolute amount captured when the code is
//! accepted. Later edits do not recompute it, so adding items after a
//! discount leaves it below 10% of the new subtotal. `total()` never goes
//! below zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogSnapshot;
use crate::error::CartWarning;
use crate::money::Money;
use crate::types::{Category, PaymentMethod, Product, SaleItemSnapshot};

// =============================================================================
// Cart Item
// =============================================================================

/// A product in the cart with its requested quantity.
///
/// Name and price are copied from the catalog when the line is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price_cents: i64,
    pub category: Category,
    pub image: String,
    /// Always ≥ 1 while the line exists.
    pub quantity: i64,
}

impl CartItem {
    fn from_product(product: &Product) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price_cents: product.price_cents,
            category: product.category,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// Calculates the line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart Phase
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CartPhase {
    /// No lines.
    #[default]
    Empty,
    /// Lines are being added or adjusted.
    Building,
    /// Payment dialog open; lines are locked.
    AwaitingPayment,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id`
/// - Every line has `quantity >= 1`
/// - `phase == Empty` exactly when there are no lines, except that the
///   discount survives emptying the cart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    discount: Money,
    phase: CartPhase,
    payment_method: PaymentMethod,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn phase(&self) -> CartPhase {
        self.phase
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Frozen discount amount.
    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of a product currently in the cart (0 if absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - `stock <= 0`: refused with [`CartWarning::OutOfStock`], cart unchanged
    /// - already in cart: quantity + 1 (no stock ceiling at add-time)
    /// - otherwise: new line with quantity 1
    pub fn add_to_cart(&mut self, product: &Product) -> Result<(), CartWarning> {
        self.ensure_editable()?;

        if !product.in_stock() {
            return Err(CartWarning::OutOfStock {
                product_name: product.name.clone(),
            });
        }

        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem::from_product(product)),
        }

        self.phase = CartPhase::Building;
        Ok(())
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// `new = max(0, current + delta)`. The ceiling is the stock recorded in
    /// `catalog`, which may be stale; the authoritative check happens at
    /// checkout. A line that reaches 0 is removed.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        delta: i64,
        catalog: &CatalogSnapshot,
    ) -> Result<(), CartWarning> {
        self.ensure_editable()?;

        let index = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or_else(|| CartWarning::NotInCart(product_id.to_string()))?;

        let item = &self.items[index];
        let new_qty = item.quantity.saturating_add(delta).max(0);

        if let Some(product) = catalog.find(product_id) {
            if new_qty > product.stock {
                return Err(CartWarning::StockLimitReached {
                    product_name: item.name.clone(),
                    stock: product.stock,
                });
            }
        }

        if new_qty == 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = new_qty;
        }

        self.phase = if self.items.is_empty() {
            CartPhase::Empty
        } else {
            CartPhase::Building
        };
        Ok(())
    }

    /// Sum of `price × quantity` over all lines.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Applies the manager discount if `code` matches `override_code`.
    ///
    /// The amount is `bps` of the current subtotal and replaces any earlier
    /// discount. A wrong code leaves the previous discount untouched.
    pub fn apply_discount(
        &mut self,
        code: &str,
        override_code: &str,
        bps: u32,
    ) -> Result<Money, CartWarning> {
        if code != override_code {
            return Err(CartWarning::InvalidDiscountCode);
        }

        self.discount = self.subtotal().percentage(bps);
        Ok(self.discount)
    }

    /// `subtotal - discount`, floored at zero.
    pub fn total(&self) -> Money {
        (self.subtotal() - self.discount).clamp_non_negative()
    }

    /// Opens the payment dialog.
    pub fn begin_checkout(&mut self) -> Result<(), CartWarning> {
        if self.items.is_empty() {
            return Err(CartWarning::EmptyCart);
        }
        self.phase = CartPhase::AwaitingPayment;
        Ok(())
    }

    /// Closes the payment dialog without paying.
    pub fn cancel_checkout(&mut self) {
        if self.phase == CartPhase::AwaitingPayment {
            self.phase = CartPhase::Building;
        }
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Snapshots the lines for the Sales Ledger.
    pub fn sale_lines(&self) -> Vec<SaleItemSnapshot> {
        self.items
            .iter()
            .map(|i| SaleItemSnapshot {
                product_id: i.product_id.clone(),
                product_name: i.name.clone(),
                product_price_cents: i.price_cents,
                quantity: i.quantity,
            })
            .collect()
    }

    /// Resets after a successful checkout: no lines, no discount, default
    /// payment method.
    pub fn complete(&mut self) {
        *self = Cart::new();
    }

    fn ensure_editable(&self) -> Result<(), CartWarning> {
        if self.phase == CartPhase::AwaitingPayment {
            return Err(CartWarning::CheckoutInProgress);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
