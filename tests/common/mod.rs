// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use clubs_api::config::Config;
use clubs_api::db::{FirestoreDb, MemoryDb, UserStore};
use clubs_api::error::AppError;
use clubs_api::models::{ClubUpdate, NewUser, User};
use clubs_api::routes::create_router;
use clubs_api::services::{AuthorizationGrant, IdentityProvider, ProfileEmail, ProviderProfile};
use clubs_api::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build a provider profile grant.
#[allow(dead_code)]
pub fn grant(id: &str, name: &str, emails: &[&str]) -> AuthorizationGrant {
    AuthorizationGrant {
        token: format!("access-{}", id),
        refresh_token: Some(format!("refresh-{}", id)),
        profile: ProviderProfile {
            id: id.to_string(),
            display_name: name.to_string(),
            emails: emails
                .iter()
                .map(|e| ProfileEmail {
                    value: e.to_string(),
                })
                .collect(),
        },
    }
}

/// Identity provider that answers known authorization codes without network.
#[derive(Default)]
pub struct StubProvider {
    grants: HashMap<String, AuthorizationGrant>,
}

impl StubProvider {
    #[allow(dead_code)]
    pub fn with_code(mut self, code: &str, grant: AuthorizationGrant) -> Self {
        self.grants.insert(code.to_string(), grant);
        self
    }
}

#[async_trait]
impl IdentityProvider for StubProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/auth?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<AuthorizationGrant, AppError> {
        self.grants
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("unknown code {}", code)))
    }
}

/// Memory store whose reads and writes can be made to fail.
///
/// Session lookups (`find_by_id`) always go through, so the guard admits
/// the request and the failure lands in the handler.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryDb,
    pub fail_updates: Arc<AtomicBool>,
    pub fail_creates: Arc<AtomicBool>,
    pub fail_list: Arc<AtomicBool>,
}

fn simulated(flag: &AtomicBool, what: &str) -> Result<(), AppError> {
    if flag.load(Ordering::SeqCst) {
        return Err(AppError::Database(format!("simulated {} failure", what)));
    }
    Ok(())
}

#[async_trait]
impl UserStore for FlakyStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        self.inner.find_by_external_id(external_id).await
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        simulated(&self.fail_list, "read")?;
        self.inner.list().await
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        simulated(&self.fail_creates, "create")?;
        self.inner.create(user).await
    }

    async fn update_clubs(&self, id: &str, update: ClubUpdate) -> Result<User, AppError> {
        simulated(&self.fail_updates, "write")?;
        self.inner.update_clubs(id, update).await
    }
}

/// App over a fresh [`FlakyStore`], with `provider` for logins.
#[allow(dead_code)]
pub fn create_flaky_app(provider: StubProvider) -> (Router, Arc<AppState>, FlakyStore) {
    let store = FlakyStore::default();
    let (app, state) =
        create_test_app_with(Config::test_default(), Arc::new(store.clone()), provider);
    (app, state, store)
}

/// Create a test app backed by `store` with a stub provider.
#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    store: Arc<dyn UserStore>,
    provider: StubProvider,
) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, store, Arc::new(provider)));
    (create_router(state.clone()), state)
}

/// Create a test app with an in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app(provider: StubProvider) -> (Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let (app, state) =
        create_test_app_with(Config::test_default(), Arc::new(db.clone()), provider);
    (app, state, db)
}

/// Insert a user directly and return a `Cookie` header value for it.
#[allow(dead_code)]
pub async fn seed_session(state: &AppState, external_id: &str) -> (User, String) {
    let user = state
        .store
        .create(NewUser {
            external_id: external_id.to_string(),
            external_token: "tok".to_string(),
            display_name: "Seeded".to_string(),
            email: format!("{}@example.com", external_id),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        })
        .await
        .expect("seed user");
    let token = state.sessions.issue_token(&user).expect("issue token");
    (user, format!("clubs_session={}", token))
}

/// Drive `/login` then `/login/callback` with `code`; returns the callback response.
#[allow(dead_code)]
pub async fn complete_login(app: &Router, code: &str) -> Response<Body> {
    let response = send(app, "GET", "/api/message/login", None, None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = location(&response);
    let state = location
        .split("state=")
        .nth(1)
        .expect("state in consent URL")
        .to_string();

    send(
        app,
        "GET",
        &format!("/api/message/login/callback?code={}&state={}", code, state),
        None,
        None,
    )
    .await
}

/// `name=value` part of the session Set-Cookie header, if any.
#[allow(dead_code)]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .find(|value| value.starts_with("clubs_session="))
        .and_then(|value| value.split(';').next().map(str::to_string))
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Send one request through the router.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    json_body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match json_body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Send a URL-encoded form body through the router.
#[allow(dead_code)]
pub async fn send_form(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
    form_body: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body.to_string()))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
