//! # sonho-web: Sonho Doce Counter Service
//!
//! HTTP backend for the bakery's point of sale.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Request Path                                     │
//! │                                                                         │
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer ──► access_gate (token → Identity, capability check)        │
//! │                      │                                                  │
//! │        ┌─────────────┼──────────────┬──────────────┐                    │
//! │        ▼             ▼              ▼              ▼                    │
//! │   commands::pages  commands::pos  commands::dashboard  commands::auth    │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │              PosSession (cart, snapshot, notifications)                 │
//! │                      │ checkout                                         │
//! │                      ▼                                                  │
//! │              CheckoutOrchestrator ──► sonho-db (SQLite)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Layered settings (defaults, TOML file, environment)
//! - [`auth`] - Password hashing, JWT session tokens, cookie handling
//! - [`access`] - The role gate applied to every route
//! - [`state`] - `AppState`, POS sessions and their registry
//! - [`checkout`] - The Checkout Orchestrator
//! - [`commands`] - HTTP handlers
//! - [`error`] - `ApiError`, the only error a client sees

pub mod access;
pub mod auth;
pub mod checkout;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post, put};
use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use sonho_db::Database;

use crate::access::access_gate;
use crate::commands::{auth as auth_cmd, dashboard, health, pages, pos};
use crate::config::{Settings, DEV_JWT_SECRET};
use crate::state::AppState;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,sonho=debug,sqlx=warn,tower_http=debug";

/// How often expired sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Every route, behind the access gate.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(pages::pos_page))
        .route("/login", get(pages::login_page))
        .route("/signup", get(pages::signup_page))
        .route("/unauthorized", get(pages::unauthorized_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/healthcheck", get(health::healthcheck))
        // Auth
        .route("/api/auth/signup", post(auth_cmd::signup))
        .route("/api/auth/login", post(auth_cmd::login))
        .route("/api/auth/logout", post(auth_cmd::logout))
        .route("/api/me", get(auth_cmd::me))
        // POS
        .route("/api/pos/products", get(pos::list_products))
        .route("/api/pos/products/refresh", post(pos::refresh_products))
        .route("/api/pos/cart", get(pos::get_cart))
        .route("/api/pos/cart/items", post(pos::add_to_cart))
        .route("/api/pos/cart/items/{product_id}", patch(pos::update_quantity))
        .route("/api/pos/cart/discount", post(pos::apply_discount))
        .route("/api/pos/checkout", post(pos::checkout))
        .route("/api/pos/checkout/begin", post(pos::begin_checkout))
        .route("/api/pos/checkout/cancel", post(pos::cancel_checkout))
        .route("/api/pos/checkout/payment-method", put(pos::select_payment_method))
        .route("/api/pos/notifications", get(pos::notifications))
        // Dashboard
        .route(
            "/api/dashboard/products",
            get(dashboard::list_products).post(dashboard::create_product),
        )
        .route(
            "/api/dashboard/products/{id}",
            put(dashboard::update_product).delete(dashboard::delete_product),
        )
        .route("/api/dashboard/products/{id}/stock", put(dashboard::set_stock))
        .route("/api/dashboard/sales", get(dashboard::list_sales))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .layer(from_fn_with_state(state.clone(), access_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Installs the global tracing subscriber.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();
}

/// Opens the database, serves until a shutdown signal, then closes the pool.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    if settings.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the development JWT secret; set SONHO_AUTH__JWT_SECRET in production");
    }

    let db = Database::new(settings.database.db_config()).await?;
    let addr = settings.server.address();
    let state = AppState::new(db.clone(), settings);

    spawn_session_sweeper(state.clone());

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Sonho Doce listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn spawn_session_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.sessions.prune_expired(Utc::now()).await;
            if removed > 0 {
                debug!(removed = removed, "Expired sessions removed");
            }
        }
    });
}

/// Graceful shutdown signal handler.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

// =============================================================================
// HTTP Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{HeaderMap, Request, StatusCode};
    use serde_json::{json, Value};
    use sonho_db::DbConfig;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        build_router(AppState::new(db, Settings::default()))
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn sign_up(app: &Router, email: &str, role: &str) {
        let (status, _, body) = send(
            app,
            request(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "segredo123",
                    "full_name": "Equipe Sonho Doce",
                    "role": role,
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    async fn sign_in(app: &Router, email: &str, role: &str) -> String {
        sign_up(app, email, role).await;

        let (status, headers, body) = send(
            app,
            request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "segredo123" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("sonho_session="));
        assert!(cookie.contains("HttpOnly"));

        body["token"].as_str().unwrap().to_string()
    }

    async fn create_product(app: &Router, token: &str, body: Value) -> Value {
        let (status, _, product) = send(
            app,
            request("POST", "/api/dashboard/products", Some(token), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{product}");
        product
    }

    fn location(headers: &HeaderMap) -> &str {
        headers.get(LOCATION).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_is_turned_away() {
        let app = test_app().await;

        let (status, headers, _) = send(&app, request("GET", "/", None, None)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/login");

        let (status, _, body) = send(&app, request("GET", "/api/pos/cart", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let (status, _, body) = send(&app, request("GET", "/login", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], "login");
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let app = test_app().await;

        let (status, _, body) = send(&app, request("GET", "/healthcheck", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "serving");
        assert_eq!(body["database"], true);
        assert_eq!(body["migrations"]["applied"], body["migrations"]["total"]);
    }

    #[tokio::test]
    async fn test_attendant_cannot_reach_dashboard() {
        let app = test_app().await;
        let token = sign_in(&app, "ana@sonhodoce.com", "Atendente").await;

        let (status, _, body) = send(&app, request("GET", "/api/dashboard/stats", Some(&token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, headers, _) = send(&app, request("GET", "/dashboard", Some(&token), None)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/unauthorized");

        let (status, headers, _) = send(&app, request("GET", "/login", Some(&token), None)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location(&headers), "/");

        let (status, _, body) = send(&app, request("GET", "/api/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "Atendente");
    }

    #[tokio::test]
    async fn test_session_cookie_authenticates() {
        let app = test_app().await;
        let token = sign_in(&app, "bia@sonhodoce.com", "Padeiro").await;

        let request = Request::builder()
            .uri("/api/pos/cart")
            .header(COOKIE, format!("theme=dark; sonho_session={token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["phase"], "empty");
    }

    #[tokio::test]
    async fn test_bad_credentials_and_duplicate_signup() {
        let app = test_app().await;
        sign_up(&app, "caio@sonhodoce.com", "Atendente").await;

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "caio@sonhodoce.com", "password": "errada" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": "CAIO@sonhodoce.com",
                    "password": "segredo123",
                    "full_name": "Caio",
                    "role": "Padeiro",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({ "email": "sem-arroba", "password": "123", "full_name": "", "role": "Chef" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["email", "password", "full_name", "role"] {
            assert!(body["fields"].get(field).is_some(), "missing {field}: {body}");
        }
    }

    #[tokio::test]
    async fn test_full_sale_at_the_counter() {
        let app = test_app().await;
        let token = sign_in(&app, "gerente@sonhodoce.com", "Gerente").await;

        let product = create_product(
            &app,
            &token,
            json!({ "name": "Pão Francês", "price": 0.5, "stock": 200, "category": "Pães" }),
        )
        .await;
        let id = product["id"].as_str().unwrap().to_string();
        assert_eq!(product["price_cents"], 50);

        let (_, _, body) = send(
            &app,
            request("POST", "/api/pos/cart/items", Some(&token), Some(json!({ "product_id": id }))),
        )
        .await;
        assert_eq!(body["cart"]["items"][0]["quantity"], 1);

        let (_, _, body) = send(
            &app,
            request(
                "PATCH",
                &format!("/api/pos/cart/items/{id}"),
                Some(&token),
                Some(json!({ "delta": 9 })),
            ),
        )
        .await;
        assert_eq!(body["cart"]["subtotal_cents"], 500);

        let (_, _, body) = send(
            &app,
            request("POST", "/api/pos/cart/discount", Some(&token), Some(json!({ "code": "1234" }))),
        )
        .await;
        assert_eq!(body["cart"]["discount_cents"], 50);
        assert_eq!(body["cart"]["total_cents"], 450);

        let (status, _, body) = send(
            &app,
            request(
                "PUT",
                "/api/pos/checkout/payment-method",
                Some(&token),
                Some(json!({ "method": "Dinheiro" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["payment_method"], "Dinheiro");

        let (_, _, body) = send(&app, request("POST", "/api/pos/checkout/begin", Some(&token), None)).await;
        assert_eq!(body["cart"]["phase"], "awaiting_payment");

        let (status, _, body) = send(&app, request("POST", "/api/pos/checkout", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["receipt"]["sale"]["total_cents"], 450);
        assert_eq!(body["receipt"]["sale"]["payment_method"], "Dinheiro");
        assert_eq!(body["cart"]["phase"], "empty");
        assert_eq!(body["cart"]["discount_cents"], 0);

        let (_, _, stats) = send(&app, request("GET", "/api/dashboard/stats", Some(&token), None)).await;
        assert_eq!(stats["sales_count"], 1);
        assert_eq!(stats["revenue_cents"], 450);
        assert_eq!(stats["product_count"], 1);

        let (_, _, sales) = send(&app, request("GET", "/api/dashboard/sales", Some(&token), None)).await;
        assert_eq!(sales[0]["items"][0]["quantity"], 10);
        assert_eq!(sales[0]["items"][0]["product_name"], "Pão Francês");

        let (_, _, catalog) = send(
            &app,
            request("GET", "/api/pos/products?category=Todos&search=franc", Some(&token), None),
        )
        .await;
        assert_eq!(catalog["products"][0]["stock"], 190);
    }

    #[tokio::test]
    async fn test_refused_cart_edits_are_notifications() {
        let app = test_app().await;
        let token = sign_in(&app, "gerente@sonhodoce.com", "Gerente").await;

        let product = create_product(
            &app,
            &token,
            json!({ "name": "Bolo de Fubá", "price": "30,00", "stock": "", "category": "Bolos" }),
        )
        .await;
        assert_eq!(product["stock"], 0);

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/pos/cart/items",
                Some(&token),
                Some(json!({ "product_id": product["id"] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 0);
        let last = body["notifications"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["severity"], "error");
        assert!(last["message"].as_str().unwrap().contains("Bolo de Fubá"));

        let (_, _, body) = send(
            &app,
            request("POST", "/api/pos/cart/discount", Some(&token), Some(json!({ "code": "0000" }))),
        )
        .await;
        assert_eq!(body["cart"]["discount_cents"], 0);
        let last = body["notifications"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["message"], "Invalid manager code");
    }

    #[tokio::test]
    async fn test_stale_stock_keeps_payment_dialog_open() {
        let app = test_app().await;
        let token = sign_in(&app, "gerente@sonhodoce.com", "Gerente").await;

        let product = create_product(
            &app,
            &token,
            json!({ "name": "Sonho de Creme", "price": 4.5, "stock": 8, "category": "Doces" }),
        )
        .await;
        let id = product["id"].as_str().unwrap().to_string();

        send(&app, request("POST", "/api/pos/cart/items", Some(&token), Some(json!({ "product_id": id })))).await;
        send(
            &app,
            request(
                "PATCH",
                &format!("/api/pos/cart/items/{id}"),
                Some(&token),
                Some(json!({ "delta": 4 })),
            ),
        )
        .await;
        send(&app, request("POST", "/api/pos/checkout/begin", Some(&token), None)).await;

        // Sold elsewhere while the dialog was open
        let (status, _, _) = send(
            &app,
            request(
                "PUT",
                &format!("/api/dashboard/products/{id}/stock"),
                Some(&token),
                Some(json!({ "stock": 3 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(&app, request("POST", "/api/pos/checkout", Some(&token), None)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (_, _, body) = send(&app, request("GET", "/api/pos/cart", Some(&token), None)).await;
        assert_eq!(body["cart"]["phase"], "awaiting_payment");
        assert_eq!(body["cart"]["items"][0]["quantity"], 5);
    }

    #[tokio::test]
    async fn test_invalid_product_form_is_keyed_by_field() {
        let app = test_app().await;
        let token = sign_in(&app, "gerente@sonhodoce.com", "Gerente").await;

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/dashboard/products",
                Some(&token),
                Some(json!({ "name": "  ", "price": "abc", "stock": -1, "category": "Pizzas" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        for field in ["name", "price", "stock", "category"] {
            assert!(body["fields"].get(field).is_some(), "missing {field}: {body}");
        }
    }

    #[tokio::test]
    async fn test_dashboard_pagination_and_delete() {
        let app = test_app().await;
        let token = sign_in(&app, "gerente@sonhodoce.com", "Gerente").await;

        let mut ids = Vec::new();
        for i in 0..7 {
            let product = create_product(
                &app,
                &token,
                json!({ "name": format!("Broa {i}"), "price": 2, "stock": 10, "category": "Pães" }),
            )
            .await;
            ids.push(product["id"].as_str().unwrap().to_string());
        }

        let (_, _, page) = send(
            &app,
            request("GET", "/api/dashboard/products?page=9&search=broa", Some(&token), None),
        )
        .await;
        assert_eq!(page["total_pages"], 2);
        assert_eq!(page["page"], 2);
        assert_eq!(page["items"].as_array().unwrap().len(), 2);

        let (status, _, _) = send(
            &app,
            request("DELETE", &format!("/api/dashboard/products/{}", ids[0]), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(
            &app,
            request("DELETE", &format!("/api/dashboard/products/{}", ids[0]), Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _, dashboard) = send(&app, request("GET", "/dashboard", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["stats"]["product_count"], 6);
        assert_eq!(dashboard["products"]["total_items"], 6);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let app = test_app().await;
        let token = sign_in(&app, "davi@sonhodoce.com", "Atendente").await;

        let (status, headers, body) = send(&app, request("POST", "/api/auth/logout", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signed_out"], true);
        assert!(headers.get(SET_COOKIE).unwrap().to_str().unwrap().contains("Max-Age=0"));

        // The token is still validly signed, but its session is gone
        let (status, _, _) = send(&app, request("GET", "/api/pos/cart", Some(&token), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
