// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The session secret is never used directly: separate keys for session
//! tokens and OAuth state are derived from it with HKDF-SHA256.

use hkdf::Hkdf;
use sha2::Sha256;
use std::env;

/// Default prefix under which all API routes are mounted.
pub const DEFAULT_BASE_PATH: &str = "/api/message";

const SESSION_KEY_INFO: &[u8] = b"clubs-api session token v1";
const OAUTH_STATE_KEY_INFO: &[u8] = b"clubs-api oauth state v1";

/// Which `UserStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Absolute URL Google redirects back to after consent
    pub google_callback_url: String,
    /// Prefix for every API route, e.g. `/api/message`
    pub base_path: String,
    /// Store implementation
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// HS256 key for session tokens (derived)
    pub session_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter (derived)
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        let (session_key, oauth_state_key) = derive_keys(b"test_session_secret_32_bytes_min!");
        Self {
            google_client_id: "test_client_id".to_string(),
            google_callback_url: "http://localhost:8080/api/message/login/callback".to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            google_client_secret: "test_secret".to_string(),
            session_key,
            oauth_state_key,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        let gcp_project_id = match store_backend {
            StoreBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StoreBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        let session_secret = env::var("SESSION_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.is_empty() {
            return Err(ConfigError::Missing("SESSION_SECRET"));
        }
        let (session_key, oauth_state_key) = derive_keys(session_secret.as_bytes());

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_callback_url: env::var("GOOGLE_CALLBACK_URL")
                .map_err(|_| ConfigError::Missing("GOOGLE_CALLBACK_URL"))?,
            base_path: normalize_base_path(
                &env::var("BASE_PATH").unwrap_or_else(|_| DEFAULT_BASE_PATH.to_string()),
            ),
            store_backend,
            gcp_project_id,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            session_key,
            oauth_state_key,
        })
    }

    /// Absolute path of a route under the base path.
    pub fn route_path(&self, suffix: &str) -> String {
        format!("{}{}", self.base_path, suffix)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.google_callback_url.starts_with("https://")
    }
}

/// Derive the session-token key and OAuth-state key from the shared secret.
fn derive_keys(secret: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut session_key = [0u8; 32];
    let mut state_key = [0u8; 32];
    hk.expand(SESSION_KEY_INFO, &mut session_key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    hk.expand(OAUTH_STATE_KEY_INFO, &mut state_key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    (session_key.to_vec(), state_key.to_vec())
}

/// Ensure a leading slash and no trailing slash; `/` collapses to the empty prefix.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
