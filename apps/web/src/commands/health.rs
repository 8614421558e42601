//! Health check for monitoring.
//!
//! `200` when the database answers and every embedded migration is applied,
//! `503` otherwise.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use sonho_db::MigrationStatus;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: ServingStatus,
    pub database: bool,
    pub migrations: Option<MigrationStatus>,
    pub open_sessions: usize,
    pub version: &'static str,
    pub server_time: DateTime<Utc>,
}

pub async fn healthcheck(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = state.db.health_check().await;

    let migrations = if database {
        match state.db.migration_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "Failed to read migration status");
                None
            }
        }
    } else {
        None
    };

    let serving = database && migrations.is_some_and(|m| m.applied == m.total);
    let (code, status) = if serving {
        (StatusCode::OK, ServingStatus::Serving)
    } else {
        warn!(database = database, "Health check failing");
        (StatusCode::SERVICE_UNAVAILABLE, ServingStatus::NotServing)
    };

    (
        code,
        Json(HealthReport {
            status,
            database,
            migrations,
            open_sessions: state.sessions.len().await,
            version: env!("CARGO_PKG_VERSION"),
            server_time: Utc::now(),
        }),
    )
}
