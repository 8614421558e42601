//! # Dashboard Commands
//!
//! Catalog Admin and sales history, for the Gerente only (the access gate
//! enforces that before these run).
//!
//! Product writes also refresh the manager's own POS snapshot and leave a
//! notification, so the change shows up without a manual reload.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sonho_core::validation::{validate_page, validate_product_form, validate_search_query, validate_stock, ProductForm};
use sonho_core::{DashboardStats, Page, Product, SaleWithItems};
use sonho_db::{CatalogStore, SalesLedger};

use crate::error::ApiError;
use crate::state::{AppState, Identity};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetStockRequest {
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub deleted: String,
}

/// Products whose name contains the search, one page of them.
pub async fn product_page(
    state: &AppState,
    params: &ProductListParams,
) -> Result<Page<Product>, ApiError> {
    let search = validate_search_query(params.search.as_deref().unwrap_or_default())?;
    let page = validate_page(params.page.unwrap_or(1))?;
    let needle = search.to_lowercase();

    let matching: Vec<Product> = state
        .db
        .products()
        .list_all()
        .await?
        .into_iter()
        .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
        .collect();

    Ok(Page::paginate(&matching, page, state.settings.pos.page_size))
}

async fn after_catalog_change(state: &AppState, identity: &Identity, message: &str) {
    let mut session = identity.session.lock().await;
    session.refresh_catalog(&state.db.products()).await;
    session.notifications.success(message, Utc::now());
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    Ok(Json(product_page(&state, &params).await?))
}

/// ## Returns
/// 201 with the product, or 400 with errors keyed by field.
pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let draft = validate_product_form(&form)?;
    debug!(name = %draft.name, "create_product command");

    let product = state.db.products().insert(&draft).await?;
    info!(product_id = %product.id, name = %product.name, "Product created");

    after_catalog_change(&state, &identity, "Product created successfully").await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>, ApiError> {
    let draft = validate_product_form(&form)?;
    debug!(product_id = %id, "update_product command");

    let product = state.db.products().update(&id, &draft).await?;
    info!(product_id = %product.id, "Product updated");

    after_catalog_change(&state, &identity, "Product updated successfully").await;
    Ok(Json(product))
}

/// Past sales keep their line snapshots.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    debug!(product_id = %id, "delete_product command");

    state.db.products().delete(&id).await?;
    info!(product_id = %id, "Product deleted");

    after_catalog_change(&state, &identity, "Product removed").await;
    Ok(Json(DeleteResponse { deleted: id }))
}

/// Restock: overwrites the stock level.
pub async fn set_stock(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(request): Json<SetStockRequest>,
) -> Result<Json<Product>, ApiError> {
    validate_stock(request.stock)?;
    debug!(product_id = %id, stock = request.stock, "set_stock command");

    let product = state.db.products().set_stock(&id, request.stock).await?;
    info!(product_id = %id, stock = product.stock, "Stock updated");

    after_catalog_change(&state, &identity, "Stock updated").await;
    Ok(Json(product))
}

// =============================================================================
// Sales
// =============================================================================

/// Every sale, newest first, with its lines.
pub async fn list_sales(State(state): State<AppState>) -> Result<Json<Vec<SaleWithItems>>, ApiError> {
    Ok(Json(state.db.sales().list_all_with_items().await?))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let summary = state.db.sales().summary().await?;
    let product_count = state.db.products().count().await?;

    Ok(Json(DashboardStats {
        sales_count: usize::try_from(summary.sales_count).unwrap_or_default(),
        revenue_cents: summary.revenue_cents,
        product_count: usize::try_from(product_count).unwrap_or_default(),
    }))
}
