// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth login routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::find_or_create_user;
use crate::services::session::{SESSION_COOKIE, SESSION_TTL_SECS};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a consent round trip may take before its `state` is refused.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;
const NONCE_LEN: usize = 16;

/// Login routes that need no session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route("/login/callback", get(login_callback))
        .route("/logout", post(logout))
}

/// Login routes behind the session guard.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/login/success", get(login_success))
}

/// Start OAuth flow - redirect to Google consent.
async fn login(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let oauth_state = sign_state(&state.config.oauth_state_key, now_millis()?)?;
    let auth_url = state.identity_provider.authorize_url(&oauth_state);

    tracing::info!("Starting OAuth flow, redirecting to Google");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, find or create the user, start a session.
///
/// Any failure of the handshake itself sends the browser back to `/login`.
/// Store failures are not handshake failures and surface as 500s.
async fn login_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let retry = Redirect::temporary(&state.config.route_path("/login"));

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Ok((jar, retry));
    }

    let state_ok = params
        .state
        .as_deref()
        .is_some_and(|s| verify_state(s, &state.config.oauth_state_key, now_millis().ok()));
    if !state_ok {
        tracing::warn!("Invalid, expired or missing OAuth state parameter");
        return Ok((jar, retry));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("OAuth callback without authorization code");
        return Ok((jar, retry));
    };

    tracing::info!("Exchanging authorization code for tokens");

    let grant = match state.identity_provider.exchange_code(&code).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::warn!(error = %e, "OAuth code exchange failed");
            return Ok((jar, retry));
        }
    };

    let user = match find_or_create_user(state.store.as_ref(), grant).await {
        Ok(user) => user,
        Err(AppError::Provider(reason)) => {
            tracing::warn!(reason = %reason, "Rejected provider profile");
            return Ok((jar, retry));
        }
        Err(e) => return Err(e),
    };

    let token = state
        .sessions
        .issue_token(&user)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;

    tracing::info!(user_id = %user.id, "OAuth successful, session established");

    Ok((
        jar.add(session_cookie(&state.config, token)),
        Redirect::temporary(&state.config.route_path("/login/success")),
    ))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn login_success() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "You are successfully logged in".to_string(),
    })
}

/// Logout - drop the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build(SESSION_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies());

    (jar.remove(removal), StatusCode::NO_CONTENT)
}

fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Build a signed OAuth `state`: base64url("nonce_hex|timestamp_hex|signature_hex").
fn sign_state(secret: &[u8], now_ms: u128) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate OAuth nonce")))?;

    let payload = format!("{}|{:x}", hex::encode(nonce), now_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify the signature and age of an OAuth `state`.
///
/// `now_ms` of `None` (clock unavailable) fails closed.
fn verify_state(state: &str, secret: &[u8], now_ms: Option<u128>) -> bool {
    let Some(now_ms) = now_ms else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(state) else {
        return false;
    };
    let Ok(state_str) = String::from_utf8(bytes) else {
        return false;
    };

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let &[nonce_hex, timestamp_hex, signature_hex] = parts.as_slice() else {
        return false;
    };

    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(format!("{}|{}", nonce_hex, timestamp_hex).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Ok(issued_ms) = u128::from_str_radix(timestamp_hex, 16) else {
        return false;
    };
    issued_ms <= now_ms && now_ms - issued_ms <= STATE_MAX_AGE_MS
}
