//! # Page Commands
//!
//! One JSON view model per screen. The access gate has already redirected
//! anyone who should not see the page.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;

use sonho_core::{DashboardStats, Notification, Page, PaymentMethod, Product, Role, SaleWithItems, UserProfile};
use sonho_db::{CatalogStore, SalesLedger};

use crate::commands::dashboard::{product_page, ProductListParams};
use crate::commands::pos::{CatalogParams, ProductsView};
use crate::commands::CartView;
use crate::error::ApiError;
use crate::state::{AppState, Identity};

#[derive(Debug, Clone, Serialize)]
pub struct AuthPageView {
    pub page: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnauthorizedView {
    pub page: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PosView {
    pub user: UserProfile,
    #[serde(flatten)]
    pub catalog: ProductsView,
    pub cart: CartView,
    pub payment_methods: Vec<PaymentMethod>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub user: UserProfile,
    pub stats: DashboardStats,
    pub products: Page<Product>,
    pub sales: Vec<SaleWithItems>,
    pub notifications: Vec<Notification>,
}

pub async fn login_page() -> Json<AuthPageView> {
    Json(AuthPageView {
        page: "login",
        roles: Vec::new(),
    })
}

pub async fn signup_page() -> Json<AuthPageView> {
    Json(AuthPageView {
        page: "signup",
        roles: Role::ALL.to_vec(),
    })
}

pub async fn unauthorized_page() -> Json<UnauthorizedView> {
    Json(UnauthorizedView {
        page: "unauthorized",
        message: "This area is restricted to managers",
    })
}

/// `/`: the counter screen.
pub async fn pos_page(
    Extension(identity): Extension<Identity>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<PosView>, ApiError> {
    let query = params.to_query()?;
    let mut session = identity.session.lock().await;

    Ok(Json(PosView {
        user: session.user().clone(),
        catalog: ProductsView::of(&session, &query),
        cart: CartView::from(&session.cart),
        payment_methods: PaymentMethod::ALL.to_vec(),
        notifications: session.notifications.active(Utc::now()),
    }))
}

/// `/dashboard`: stats, one page of products and the sales history.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<DashboardView>, ApiError> {
    let products = product_page(&state, &params).await?;
    let all_products = state.db.products().list_all().await?;
    let sales = state.db.sales().list_all_with_items().await?;

    let sale_rows: Vec<_> = sales.iter().map(|s| s.sale.clone()).collect();
    let stats = DashboardStats::compute(&all_products, &sale_rows);

    let mut session = identity.session.lock().await;
    Ok(Json(DashboardView {
        user: session.user().clone(),
        stats,
        products,
        sales,
        notifications: session.notifications.active(Utc::now()),
    }))
}
