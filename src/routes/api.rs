// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in users.

use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::User;
use crate::services::{MembershipService, MembershipUpdate};
use crate::AppState;
use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    routing::get,
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require a session).
/// The session guard is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/user", get(get_me))
        .route(
            "/user/clubs",
            get(list_clubs).post(add_club).delete(remove_club),
        )
}

// ─── Users ───────────────────────────────────────────────────

/// Public view of a user. The stored provider token is never exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub external_id: String,
    pub display_name: String,
    pub email: String,
    pub clubs: Vec<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            display_name: user.display_name,
            email: user.email,
            clubs: user.clubs,
            created_at: user.created_at,
        }
    }
}

/// List every user.
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.store.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get current user profile.
async fn get_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(user.into())
}

// ─── Clubs ───────────────────────────────────────────────────

/// Body of club add/remove requests.
///
/// Club identifiers are opaque, so any string is accepted, including the
/// empty one. The length cap only bounds the size of the stored document.
#[derive(Debug, Deserialize, Validate)]
pub struct ClubRequest {
    #[validate(length(max = 256, message = "club must be at most 256 characters"))]
    pub club: String,
}

impl ClubRequest {
    fn into_club(self) -> Result<String> {
        self.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(self.club)
    }
}

/// Validated club name from either a JSON or an HTML form body.
pub struct ClubBody(pub String);

impl<S> FromRequest<S> for ClubBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let request = if is_form {
            let Form(request) = Form::<ClubRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            request
        } else {
            let Json(request) = Json::<ClubRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            request
        };

        request.into_club().map(ClubBody)
    }
}

/// Get the caller's clubs.
async fn list_clubs(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<Vec<String>> {
    Json(MembershipService::list_clubs(&user))
}

/// Add a club to the caller's membership.
async fn add_club(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ClubBody(club): ClubBody,
) -> Result<Json<MembershipUpdate>> {
    let update = state.membership.add_club(&user.id, &club).await?;
    Ok(Json(update))
}

/// Remove a club from the caller's membership.
async fn remove_club(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ClubBody(club): ClubBody,
) -> Result<Json<MembershipUpdate>> {
    let update = state.membership.remove_club(&user.id, &club).await?;
    Ok(Json(update))
}
