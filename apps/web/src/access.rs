//! # Access Gate
//!
//! One check, at the edge of the router, decides whether a request reaches
//! its handler. Handlers behind the gate never look at roles themselves.
//!
//! ## Capabilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Path                                   Capability                      │
//! │  ─────────────────────────────────────  ──────────                      │
//! │  /login  /signup  /unauthorized         Public                          │
//! │  /healthcheck  /api/auth/*              Public                          │
//! │  /dashboard*  /api/dashboard*           Admin  (Gerente only)           │
//! │  everything else                        Pos    (any signed-in role)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decisions
//! ```text
//! ┌──────────────────────────────┬───────────────────┬────────────────────┐
//! │                              │ page path         │ /api/* path        │
//! ├──────────────────────────────┼───────────────────┼────────────────────┤
//! │ anonymous, Pos or Admin      │ → /login          │ 401                │
//! │ signed in, /login or /signup │ → /               │ (n/a)              │
//! │ not Gerente, Admin           │ → /unauthorized   │ 403                │
//! │ otherwise                    │ allow             │ allow              │
//! └──────────────────────────────┴───────────────────┴────────────────────┘
//! ```

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use sonho_core::Role;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Pos,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
    /// Not signed in (401).
    Unauthenticated,
    /// Signed in without the role (403).
    Forbidden,
}

const PUBLIC_PAGES: [&str; 4] = ["/login", "/signup", "/unauthorized", "/healthcheck"];

/// `true` for `prefix` itself and anything below it.
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_api(path: &str) -> bool {
    under(path, "/api")
}

pub fn capability_for(path: &str) -> Capability {
    if PUBLIC_PAGES.contains(&path) || under(path, "/api/auth") {
        Capability::Public
    } else if under(path, "/dashboard") || under(path, "/api/dashboard") {
        Capability::Admin
    } else {
        Capability::Pos
    }
}

/// The whole gate as a pure function of path and role.
pub fn decide(path: &str, role: Option<Role>) -> Decision {
    let api = is_api(path);

    match (capability_for(path), role) {
        (Capability::Public, Some(_)) if path == "/login" || path == "/signup" => {
            Decision::Redirect("/")
        }
        (Capability::Public, _) => Decision::Allow,
        (_, None) if api => Decision::Unauthenticated,
        (_, None) => Decision::Redirect("/login"),
        (Capability::Admin, Some(role)) if !role.is_manager() => {
            if api {
                Decision::Forbidden
            } else {
                Decision::Redirect("/unauthorized")
            }
        }
        _ => Decision::Allow,
    }
}

/// Middleware applying [`decide`] and attaching the caller's
/// [`Identity`](crate::state::Identity) to the request.
pub async fn access_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = state.resolve_identity(request.headers()).await;
    let path = request.uri().path().to_string();

    match decide(&path, identity.as_ref().map(|i| i.role)) {
        Decision::Allow => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Decision::Redirect(to) => {
            debug!(path = %path, to = %to, "Access gate redirect");
            Redirect::to(to).into_response()
        }
        Decision::Unauthenticated => {
            debug!(path = %path, "Access gate: not signed in");
            ApiError::unauthenticated().into_response()
        }
        Decision::Forbidden => {
            debug!(path = %path, "Access gate: manager role required");
            ApiError::forbidden().into_response()
        }
    }
}
