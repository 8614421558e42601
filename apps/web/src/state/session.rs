//! # POS Sessions
//!
//! One `PosSession` per signed-in terminal: who is signed in, their cart,
//! the catalog snapshot the cart is checked against, and pending
//! notifications.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sign-in ──► PosSession::open ──► catalog loaded once                   │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  SessionRegistry { jti → Arc<Mutex<PosSession>> }                        │
//! │                    │                                                    │
//! │     every request: lock the session's mutex, so one terminal's          │
//! │     commands run one at a time                                          │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  sign-out or token expiry ──► removed from the registry                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use sonho_core::{Cart, CartWarning, CatalogSnapshot, NotificationQueue, UserProfile};
use sonho_db::{CatalogStore, SalesLedger};

use crate::checkout::{CheckoutError, CheckoutOrchestrator, CheckoutReceipt};

pub type SessionHandle = Arc<Mutex<PosSession>>;

// =============================================================================
// PosSession
// =============================================================================

#[derive(Debug)]
pub struct PosSession {
    id: String,
    user: UserProfile,
    pub cart: Cart,
    pub catalog: CatalogSnapshot,
    pub notifications: NotificationQueue,
}

impl PosSession {
    /// Starts a session and loads the catalog.
    ///
    /// A failed load still opens the session, with an empty snapshot and an
    /// error notification.
    pub async fn open<C: CatalogStore>(
        id: impl Into<String>,
        user: UserProfile,
        notification_ttl: Duration,
        store: &C,
    ) -> Self {
        let mut session = PosSession {
            id: id.into(),
            user,
            cart: Cart::new(),
            catalog: CatalogSnapshot::default(),
            notifications: NotificationQueue::new(notification_ttl),
        };
        session.refresh_catalog(store).await;
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    /// Re-reads the Catalog Store into the snapshot.
    ///
    /// On failure the old snapshot stays and the attendant is told.
    pub async fn refresh_catalog<C: CatalogStore>(&mut self, store: &C) -> bool {
        match store.list_all().await {
            Ok(products) => {
                debug!(session_id = %self.id, products = products.len(), "Catalog loaded");
                self.catalog = CatalogSnapshot::new(products, Utc::now());
                true
            }
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Failed to load products");
                self.notifications.error("Failed to load products", Utc::now());
                false
            }
        }
    }

    /// Turns a Cart Engine refusal into an error notification.
    pub fn warn(&mut self, warning: &CartWarning) {
        debug!(session_id = %self.id, warning = %warning, "Cart edit refused");
        self.notifications.error(warning.to_string(), Utc::now());
    }

    /// Runs the Checkout Orchestrator, then refreshes the catalog and resets
    /// the cart.
    ///
    /// On failure the cart keeps its lines and stays in the payment dialog so
    /// the attendant can retry.
    pub async fn checkout<C, L>(&mut self, catalog: &C, ledger: &L) -> Result<CheckoutReceipt, CheckoutError>
    where
        C: CatalogStore,
        L: SalesLedger,
    {
        let result = CheckoutOrchestrator::new(catalog, ledger)
            .checkout(&self.cart, self.cart.payment_method(), self.cart.total())
            .await;

        match result {
            Ok(receipt) => {
                // The sale is committed; a failed refresh only costs freshness
                self.refresh_catalog(catalog).await;
                self.cart.complete();
                self.notifications.success("Sale completed successfully", Utc::now());
                Ok(receipt)
            }
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "Checkout failed");
                self.notifications.error(checkout_failure_message(&err), Utc::now());
                Err(err)
            }
        }
    }
}

/// What the attendant sees when a checkout fails.
pub fn checkout_failure_message(err: &CheckoutError) -> String {
    match err {
        CheckoutError::InsufficientStock { .. }
        | CheckoutError::EmptyCart
        | CheckoutError::NotAwaitingPayment => err.to_string(),
        _ => "Failed to complete the sale".to_string(),
    }
}

// =============================================================================
// SessionRegistry
// =============================================================================

struct Entry {
    expires_at: DateTime<Utc>,
    handle: SessionHandle,
}

/// Open sessions by session id (the token's `jti`).
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    pub async fn insert(&self, session: PosSession, expires_at: DateTime<Utc>) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));

        let mut sessions = self.inner.write().await;
        sessions.insert(
            id,
            Entry {
                expires_at,
                handle: handle.clone(),
            },
        );
        handle
    }

    /// A live session, or `None` if unknown or expired.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let now = Utc::now();
        {
            let sessions = self.inner.read().await;
            match sessions.get(id) {
                Some(entry) if entry.expires_at > now => return Some(entry.handle.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        debug!(session_id = %id, "Session expired");
        self.inner.write().await.remove(id);
        None
    }

    /// `true` if the session existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    /// Drops every expired session; returns how many went.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sonho_core::{Category, Product, ProductDraft, Role, Severity};
    use sonho_db::{Database, DbConfig, DbError, DbResult, StockDecrement};

    fn profile() -> UserProfile {
        UserProfile {
            id: "user-1".to_string(),
            email: "ana@sonhodoce.com".to_string(),
            full_name: "Ana".to_string(),
            role: Role::Atendente,
            created_at: Utc::now(),
        }
    }

    fn ttl() -> Duration {
        Duration::seconds(3)
    }

    /// Catalog whose reads always fail.
    struct OfflineCatalog;

    #[async_trait]
    impl CatalogStore for OfflineCatalog {
        async fn list_all(&self) -> DbResult<Vec<Product>> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn get(&self, _id: &str) -> DbResult<Option<Product>> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn get_stock(&self, _id: &str) -> DbResult<i64> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn set_stock(&self, _id: &str, _stock: i64) -> DbResult<Product> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn decrement_stock(&self, _id: &str, _qty: i64) -> DbResult<StockDecrement> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn insert(&self, _draft: &ProductDraft) -> DbResult<Product> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn update(&self, _id: &str, _draft: &ProductDraft) -> DbResult<Product> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
        async fn delete(&self, _id: &str) -> DbResult<()> {
            Err(DbError::ConnectionFailed("offline".to_string()))
        }
    }

    async fn seeded_db() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductDraft {
                name: "Pão de Queijo".to_string(),
                price_cents: 150,
                category: Category::Salgados,
                stock: 10,
                image: "🧀".to_string(),
            })
            .await
            .unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_open_loads_catalog() {
        let (db, product) = seeded_db().await;
        let session = PosSession::open("s1", profile(), ttl(), &db.products()).await;

        assert_eq!(session.id(), "s1");
        assert!(session.catalog.find(&product.id).is_some());
        assert!(session.catalog.loaded_at().is_some());
        assert!(session.cart.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_old_snapshot() {
        let (db, product) = seeded_db().await;
        let mut session = PosSession::open("s1", profile(), ttl(), &db.products()).await;

        assert!(!session.refresh_catalog(&OfflineCatalog).await);

        assert!(session.catalog.find(&product.id).is_some());
        let active = session.notifications.active(Utc::now());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_checkout_success_resets_cart_and_refreshes() {
        let (db, product) = seeded_db().await;
        let (catalog, ledger) = (db.products(), db.sales());
        let mut session = PosSession::open("s1", profile(), ttl(), &catalog).await;

        session.cart.add_to_cart(&product).unwrap();
        session.cart.add_to_cart(&product).unwrap();
        session.cart.begin_checkout().unwrap();

        let receipt = session.checkout(&catalog, &ledger).await.unwrap();

        assert_eq!(receipt.sale.total_cents, 300);
        assert!(session.cart.is_empty());
        assert_eq!(session.catalog.find(&product.id).unwrap().stock, 8);
        let active = session.notifications.active(Utc::now());
        assert_eq!(active.last().unwrap().severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_payment_dialog_open() {
        let (db, product) = seeded_db().await;
        let (catalog, ledger) = (db.products(), db.sales());
        let mut session = PosSession::open("s1", profile(), ttl(), &catalog).await;

        session.cart.add_to_cart(&product).unwrap();
        session.cart.begin_checkout().unwrap();
        catalog.set_stock(&product.id, 0).await.unwrap();

        let err = session.checkout(&catalog, &ledger).await.unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        assert_eq!(session.cart.phase(), sonho_core::CartPhase::AwaitingPayment);
        assert_eq!(session.cart.quantity_of(&product.id), 1);
        let active = session.notifications.active(Utc::now());
        assert!(active[0].message.contains("Pão de Queijo"));
    }

    #[test]
    fn test_generic_failure_message_hides_details() {
        let err = CheckoutError::SaleCreationFailed(DbError::ConnectionFailed("db.internal:5432".to_string()));
        assert_eq!(checkout_failure_message(&err), "Failed to complete the sale");
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let (db, _) = seeded_db().await;
        let registry = SessionRegistry::new();

        let live = PosSession::open("live", profile(), ttl(), &db.products()).await;
        let stale = PosSession::open("stale", profile(), ttl(), &db.products()).await;
        registry.insert(live, Utc::now() + Duration::hours(1)).await;
        registry.insert(stale, Utc::now() - Duration::seconds(1)).await;

        assert!(registry.get("live").await.is_some());
        assert!(registry.get("stale").await.is_none());
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove("live").await);
        assert!(!registry.remove("live").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let (db, _) = seeded_db().await;
        let registry = SessionRegistry::new();
        let session = PosSession::open("s", profile(), ttl(), &db.products()).await;
        let expires = Utc::now() + Duration::minutes(5);
        registry.insert(session, expires).await;

        assert_eq!(registry.prune_expired(Utc::now()).await, 0);
        assert_eq!(registry.prune_expired(expires + Duration::seconds(1)).await, 1);
    }
}
