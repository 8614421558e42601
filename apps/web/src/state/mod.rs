//! # State Module
//!
//! Everything a request handler can reach, passed explicitly through axum's
//! `State` extractor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  AppState (Clone, shared by every request)                              │
//! │  ├── db:       Database           SQLite pool, thread-safe              │
//! │  ├── sessions: SessionRegistry    RwLock<HashMap<jti, Arc<Mutex<..>>>>  │
//! │  ├── jwt:      JwtManager         read-only after startup               │
//! │  └── settings: Arc<Settings>      read-only after startup               │
//! │                                                                         │
//! │  Identity (request extension, set by the access gate)                   │
//! │  ├── user_id, role, session_id                                          │
//! │  └── session:  Arc<Mutex<PosSession>>   this terminal's cart & co.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod session;

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::debug;

use sonho_core::Role;
use sonho_db::Database;

use crate::auth::{token_from_headers, JwtManager};
use crate::config::Settings;

pub use session::{checkout_failure_message, PosSession, SessionHandle, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionRegistry,
    pub jwt: JwtManager,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let jwt = JwtManager::new(
            settings.auth.jwt_secret.clone(),
            settings.auth.session_lifetime_secs,
        );

        AppState {
            db,
            sessions: SessionRegistry::new(),
            jwt,
            settings: Arc::new(settings),
        }
    }

    pub fn notification_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.settings.pos.notification_ttl_secs)
    }

    /// Who is making this request, if anyone.
    ///
    /// A valid token whose session is gone (sign-out, restart, expiry)
    /// counts as anonymous.
    pub async fn resolve_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = token_from_headers(headers)?;

        let claims = match self.jwt.validate(&token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Ignoring unusable session token");
                return None;
            }
        };

        let session = self.sessions.get(&claims.jti).await?;

        Some(Identity {
            user_id: claims.sub,
            role: claims.role,
            session_id: claims.jti,
            session,
        })
    }
}

/// The signed-in user behind a request.
#[derive(Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub session_id: String,
    pub session: SessionHandle,
}
