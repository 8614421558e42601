//! # Checkout Orchestrator
//!
//! Turns a cart whose payment dialog is open into a Sale, its SaleItems and
//! the matching stock decrements.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. SalesLedger::insert_sale(total, method) ──fail──► SaleCreationFailed│
//! │         │                                             (nothing written) │
//! │         ▼                                                               │
//! │  2. SalesLedger::insert_sale_items(sale_id) ──fail──► SaleItemsFailed   │
//! │         │                                             (orphan sale)     │
//! │         ▼                                                               │
//! │  3. for each line, in cart order:                                       │
//! │       a. CatalogStore::get_stock ───────────fail────► StockLookupFailed │
//! │       b. live stock < qty ──────────────────────────► InsufficientStock │
//! │       c. CatalogStore::decrement_stock                                  │
//! │            Insufficient (lost a race) ──────────────► InsufficientStock │
//! │            error ───────────────────────────────────► StockUpdateFailed │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CheckoutReceipt                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps run one after another with no transaction around them. A failure
//! after step 1 leaves what was already written: the sale row, its items and
//! any decrements from earlier lines. Those leftovers are logged at `warn`
//! and not compensated.
//!
//! Refreshing the catalog and resetting the cart (steps 4 and 5) belong to
//! the session, see [`crate::state::PosSession::checkout`].

use serde::Serialize;
use tracing::{debug, info, warn};

use sonho_core::{Cart, CartPhase, Money, PaymentMethod, Sale, SaleItemSnapshot};
use sonho_db::{CatalogStore, DbError, SalesLedger, StockDecrement};

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Payment has not been started for this cart")]
    NotAwaitingPayment,

    #[error("Failed to create sale: {0}")]
    SaleCreationFailed(#[source] DbError),

    #[error("Failed to record items of sale {sale_id}: {source}")]
    SaleItemsFailed {
        sale_id: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to read stock of {product_name}: {source}")]
    StockLookupFailed {
        product_name: String,
        #[source]
        source: DbError,
    },

    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_name: String,
        available: i64,
        requested: i64,
    },

    #[error("Failed to update stock of {product_name}: {source}")]
    StockUpdateFailed {
        product_name: String,
        #[source]
        source: DbError,
    },
}

/// What a successful checkout wrote.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItemSnapshot>,
}

/// Runs steps 1 to 3 against any catalog and ledger.
pub struct CheckoutOrchestrator<'a, C: CatalogStore, L: SalesLedger> {
    catalog: &'a C,
    ledger: &'a L,
}

impl<'a, C: CatalogStore, L: SalesLedger> CheckoutOrchestrator<'a, C, L> {
    pub fn new(catalog: &'a C, ledger: &'a L) -> Self {
        CheckoutOrchestrator { catalog, ledger }
    }

    /// Persists `cart` as one sale paid with `payment_method` for `total`.
    ///
    /// The cart is only read; resetting it is the caller's job.
    pub async fn checkout(
        &self,
        cart: &Cart,
        payment_method: PaymentMethod,
        total: Money,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if cart.phase() != CartPhase::AwaitingPayment {
            return Err(CheckoutError::NotAwaitingPayment);
        }

        let lines = cart.sale_lines();

        // Step 1
        let sale = self
            .ledger
            .insert_sale(total, payment_method)
            .await
            .map_err(CheckoutError::SaleCreationFailed)?;

        debug!(sale_id = %sale.id, total = %total, method = %payment_method, "Sale created");

        // Step 2
        if let Err(source) = self.ledger.insert_sale_items(&sale.id, &lines).await {
            warn!(sale_id = %sale.id, "Sale left without items after a failed checkout");
            return Err(CheckoutError::SaleItemsFailed {
                sale_id: sale.id,
                source,
            });
        }

        // Step 3
        let mut decremented: Vec<&str> = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Err(err) = self.reconcile_stock(line).await {
                warn!(
                    sale_id = %sale.id,
                    decremented = ?decremented,
                    failed_product = %line.product_id,
                    "Checkout aborted after the sale was recorded"
                );
                return Err(err);
            }
            decremented.push(&line.product_id);
        }

        info!(
            sale_id = %sale.id,
            total = %total,
            items = lines.len(),
            "Checkout complete"
        );

        Ok(CheckoutReceipt { sale, items: lines })
    }

    async fn reconcile_stock(&self, line: &SaleItemSnapshot) -> Result<(), CheckoutError> {
        let live = self
            .catalog
            .get_stock(&line.product_id)
            .await
            .map_err(|source| CheckoutError::StockLookupFailed {
                product_name: line.product_name.clone(),
                source,
            })?;

        if live < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                product_name: line.product_name.clone(),
                available: live,
                requested: line.quantity,
            });
        }

        match self
            .catalog
            .decrement_stock(&line.product_id, line.quantity)
            .await
        {
            Ok(StockDecrement::Applied { remaining }) => {
                debug!(product_id = %line.product_id, remaining = remaining, "Stock decremented");
                Ok(())
            }
            Ok(StockDecrement::Insufficient { available }) => Err(CheckoutError::InsufficientStock {
                product_name: line.product_name.clone(),
                available,
                requested: line.quantity,
            }),
            Err(source) => Err(CheckoutError::StockUpdateFailed {
                product_name: line.product_name.clone(),
                source,
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
