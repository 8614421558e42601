//! # Auth Commands
//!
//! Sign-up, sign-in, sign-out and "who am I".

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Extension, Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use sonho_core::validation::{validate_signup, SignupForm};
use sonho_core::UserProfile;
use sonho_db::NewUser;

use crate::auth::{clear_session_cookie, hash_password, session_cookie, verify_password, AuthError};
use crate::error::ApiError;
use crate::state::{AppState, Identity, PosSession};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub signed_out: bool,
}

/// Creates a staff account.
///
/// ## Returns
/// 201 with the new profile; 400 with per-field errors; 409 if the email is
/// taken.
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let draft = validate_signup(&form)?;
    debug!(email = %draft.email, role = %draft.role, "signup command");

    let password_hash = hash_password(&draft.password)?;
    let profile = state
        .db
        .users()
        .insert(&NewUser {
            email: draft.email,
            full_name: draft.full_name,
            role: draft.role,
            password_hash,
        })
        .await?;

    info!(user_id = %profile.id, role = %profile.role, "Account created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Signs in and opens a POS session with a fresh catalog snapshot.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(email = %request.email, "login command");

    let credentials = state
        .db
        .users()
        .find_credentials_by_email(&request.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&request.password, &credentials.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = credentials.profile;
    let session_id = Uuid::new_v4().to_string();
    let lifetime = state.jwt.lifetime_secs();
    let (token, claims) = state.jwt.issue(&user.id, user.role, &session_id)?;

    let session = PosSession::open(
        session_id.clone(),
        user.clone(),
        state.notification_ttl(),
        &state.db.products(),
    )
    .await;
    let expires_at = Utc::now() + Duration::seconds(lifetime);
    state.sessions.insert(session, expires_at).await;

    info!(user_id = %user.id, role = %user.role, session_id = %session_id, "Signed in");

    let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at);
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&token, lifetime))]),
        Json(LoginResponse {
            token,
            expires_at,
            user,
        }),
    ))
}

/// Ends the caller's session, if any, and clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let signed_out = match state.resolve_identity(&headers).await {
        Some(identity) => {
            info!(user_id = %identity.user_id, session_id = %identity.session_id, "Signed out");
            state.sessions.remove(&identity.session_id).await
        }
        None => false,
    };

    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(LogoutResponse { signed_out }),
    )
}

/// The signed-in user's stored profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .db
        .users()
        .get_by_id(&identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &identity.user_id))?;

    Ok(Json(profile))
}
