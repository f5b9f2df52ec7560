// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session handles and the signed tokens that carry them.
//!
//! A session handle is exactly the user's store ID. The handle travels to
//! the client as the `sub` claim of an HS256 JWT, which owns expiry and
//! tamper resistance. Resolving a handle always goes back to the store, so
//! a user removed out of band loses their session on the next request.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "clubs_session";

/// Session token lifetime (30 days).
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Session handle (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Why a request's session could not be resolved to a user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session token presented")]
    Missing,

    #[error("session token rejected: {0}")]
    InvalidToken(String),

    #[error("session refers to unknown user {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Store(AppError),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Store(inner) => inner,
            SessionError::Missing
            | SessionError::InvalidToken(_)
            | SessionError::UnknownUser(_) => AppError::Forbidden,
        }
    }
}

/// Converts users to session tokens and back.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionManager {
    pub fn new(store: Arc<dyn UserStore>, signing_key: &[u8]) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
        }
    }

    /// The session handle for `user`.
    pub fn serialize(&self, user: &User) -> String {
        tracing::debug!(user_id = %user.id, "Serializing user");
        user.id.clone()
    }

    /// Resolve a session handle back to its user.
    pub async fn deserialize(&self, handle: &str) -> Result<User, SessionError> {
        tracing::debug!(user_id = handle, "Deserializing user");
        self.store
            .find_by_id(handle)
            .await
            .map_err(SessionError::Store)?
            .ok_or_else(|| SessionError::UnknownUser(handle.to_string()))
    }

    /// Issue a signed session token for `user`.
    pub fn issue_token(&self, user: &User) -> anyhow::Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let claims = Claims {
            sub: self.serialize(user),
            iat: now as usize,
            exp: (now + SESSION_TTL_SECS) as usize,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verify a session token and return the handle it carries.
    pub fn handle_from_token(&self, token: &str) -> Result<String, SessionError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(SessionError::InvalidToken("empty subject".to_string()));
        }

        Ok(data.claims.sub)
    }

    /// Verify a token (if any) and load the user it refers to.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<User, SessionError> {
        let token = token.ok_or(SessionError::Missing)?;
        let handle = self.handle_from_token(token)?;
        self.deserialize(&handle).await
    }
}
