//! # POS Commands
//!
//! The attendant's screen: product grid, cart, discount and checkout.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  GET  /api/pos/products?category=Doces&search=sonho                     │
//! │  POST /api/pos/cart/items              { product_id }                   │
//! │  PATCH /api/pos/cart/items/{id}        { delta: +1 | -1 }               │
//! │  POST /api/pos/cart/discount           { code }                         │
//! │  POST /api/pos/checkout/begin          opens the payment dialog         │
//! │  PUT  /api/pos/checkout/payment-method { method: "Pix" }                │
//! │  POST /api/pos/checkout                confirms payment                 │
//! │       or                                                                │
//! │  POST /api/pos/checkout/cancel         back to editing                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A refused cart edit (out of stock, stock limit, wrong manager code, cart
//! locked) is still a 200: the cart comes back unchanged with an error
//! notification.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sonho_core::catalog::ALL_CATEGORIES;
use sonho_core::validation::validate_search_query;
use sonho_core::{CatalogQuery, Category, Notification, PaymentMethod, Product};

use crate::checkout::CheckoutReceipt;
use crate::commands::SessionView;
use crate::error::ApiError;
use crate::state::{AppState, Identity, PosSession};

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl CatalogParams {
    pub fn to_query(&self) -> Result<CatalogQuery, ApiError> {
        let search = validate_search_query(self.search.as_deref().unwrap_or_default())?;
        Ok(CatalogQuery::parse(self.category.as_deref(), Some(&search))?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductsView {
    /// `Todos` first, then every category.
    pub categories: Vec<&'static str>,
    pub products: Vec<Product>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl ProductsView {
    pub fn of(session: &PosSession, query: &CatalogQuery) -> Self {
        ProductsView {
            categories: category_chips(),
            products: session.catalog.filter(query).into_iter().cloned().collect(),
            loaded_at: session.catalog.loaded_at(),
        }
    }
}

pub fn category_chips() -> Vec<&'static str> {
    std::iter::once(ALL_CATEGORIES)
        .chain(Category::ALL.iter().map(Category::as_str))
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuantityRequest {
    pub delta: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub receipt: CheckoutReceipt,
    #[serde(flatten)]
    pub session: SessionView,
}

// =============================================================================
// Catalog
// =============================================================================

/// Filters the session's catalog snapshot. No database access.
pub async fn list_products(
    Extension(identity): Extension<Identity>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ProductsView>, ApiError> {
    let query = params.to_query()?;
    let session = identity.session.lock().await;
    Ok(Json(ProductsView::of(&session, &query)))
}

/// Re-reads the Catalog Store into the snapshot.
pub async fn refresh_products(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<ProductsView> {
    debug!(session_id = %identity.session_id, "refresh_products command");
    let mut session = identity.session.lock().await;
    session.refresh_catalog(&state.db.products()).await;
    Json(ProductsView::of(&session, &CatalogQuery::default()))
}

// =============================================================================
// Cart
// =============================================================================

pub async fn get_cart(Extension(identity): Extension<Identity>) -> Json<SessionView> {
    let mut session = identity.session.lock().await;
    Json(SessionView::of(&mut session))
}

/// Adds one unit of a product from the snapshot.
pub async fn add_to_cart(
    Extension(identity): Extension<Identity>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<SessionView>, ApiError> {
    debug!(product_id = %request.product_id, "add_to_cart command");
    let mut session = identity.session.lock().await;

    let product = session
        .catalog
        .find(&request.product_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Product", &request.product_id))?;

    if let Err(warning) = session.cart.add_to_cart(&product) {
        session.warn(&warning);
    }

    Ok(Json(SessionView::of(&mut session)))
}

/// Changes a line's quantity by `delta`; 0 removes the line.
pub async fn update_quantity(
    Extension(identity): Extension<Identity>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Json<SessionView> {
    debug!(product_id = %product_id, delta = request.delta, "update_quantity command");
    let mut session = identity.session.lock().await;
    let session = &mut *session;

    if let Err(warning) = session
        .cart
        .update_quantity(&product_id, request.delta, &session.catalog)
    {
        session.warn(&warning);
    }

    Json(SessionView::of(session))
}

/// Checks the manager override code and applies the discount.
pub async fn apply_discount(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<DiscountRequest>,
) -> Json<SessionView> {
    let pos = &state.settings.pos;
    let mut session = identity.session.lock().await;

    match session
        .cart
        .apply_discount(request.code.trim(), &pos.manager_override_code, pos.discount_bps)
    {
        Ok(amount) => {
            info!(session_id = %identity.session_id, discount = %amount, "Manager discount applied");
            session.notifications.success("Manager discount applied", Utc::now());
        }
        Err(warning) => session.warn(&warning),
    }

    Json(SessionView::of(&mut session))
}

// =============================================================================
// Checkout
// =============================================================================

/// Opens the payment dialog.
pub async fn begin_checkout(Extension(identity): Extension<Identity>) -> Json<SessionView> {
    let mut session = identity.session.lock().await;
    if let Err(warning) = session.cart.begin_checkout() {
        session.warn(&warning);
    }
    Json(SessionView::of(&mut session))
}

/// Closes the payment dialog without paying.
pub async fn cancel_checkout(Extension(identity): Extension<Identity>) -> Json<SessionView> {
    let mut session = identity.session.lock().await;
    session.cart.cancel_checkout();
    Json(SessionView::of(&mut session))
}

pub async fn select_payment_method(
    Extension(identity): Extension<Identity>,
    Json(request): Json<PaymentMethodRequest>,
) -> Json<SessionView> {
    let mut session = identity.session.lock().await;
    session.cart.select_payment_method(request.method);
    Json(SessionView::of(&mut session))
}

/// Confirms payment and runs the Checkout Orchestrator.
///
/// ## Returns
/// The receipt and the reset cart. On failure the error code says why and
/// the cart stays in the payment dialog for a retry.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    debug!(session_id = %identity.session_id, "checkout command");
    let mut session = identity.session.lock().await;

    let receipt = session
        .checkout(&state.db.products(), &state.db.sales())
        .await?;

    Ok(Json(CheckoutResponse {
        receipt,
        session: SessionView::of(&mut session),
    }))
}

// =============================================================================
// Notifications
// =============================================================================

pub async fn notifications(Extension(identity): Extension<Identity>) -> Json<Vec<Notification>> {
    let mut session = identity.session.lock().await;
    Json(session.notifications.active(Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_chips() {
        assert_eq!(
            category_chips(),
            vec!["Todos", "Pães", "Doces", "Salgados", "Bolos", "Bebidas"]
        );
    }

    #[test]
    fn test_catalog_params() {
        let params = CatalogParams {
            category: Some("Todos".to_string()),
            search: Some("  sonho ".to_string()),
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.category, None);
        assert_eq!(query.search, "sonho");

        let params = CatalogParams {
            category: Some("Pizzas".to_string()),
            search: None,
        };
        let err = params.to_query().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }
}
