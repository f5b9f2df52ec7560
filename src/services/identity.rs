// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maps a verified external identity onto a stored user.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{NewUser, User};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

/// One email address from a provider profile.
#[derive(Debug, Clone)]
pub struct ProfileEmail {
    pub value: String,
}

/// Identity claims returned by the provider after a successful handshake.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub id: String,
    pub display_name: String,
    pub emails: Vec<ProfileEmail>,
}

/// Everything the provider hands back for one authorization code.
#[derive(Debug, Clone)]
pub struct AuthorizationGrant {
    pub token: String,
    pub refresh_token: Option<String>,
    pub profile: ProviderProfile,
}

/// External OAuth2 identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent-page URL the browser is sent to, carrying `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Redeem an authorization code for tokens and the user's profile.
    async fn exchange_code(&self, code: &str) -> Result<AuthorizationGrant, AppError>;
}

/// Return the user linked to the grant's profile, creating it on first login.
///
/// An existing user is returned untouched; in particular its stored
/// `external_token` is not replaced by the newer grant token.
pub async fn find_or_create_user(
    store: &dyn UserStore,
    grant: AuthorizationGrant,
) -> Result<User, AppError> {
    let profile = grant.profile;

    if let Some(user) = store.find_by_external_id(&profile.id).await? {
        tracing::debug!(user_id = %user.id, "Existing user signed in");
        return Ok(user);
    }

    let email = profile
        .emails
        .into_iter()
        .next()
        .map(|e| e.value)
        .ok_or_else(|| AppError::Provider("profile has no email address".to_string()))?;

    let user = store
        .create(NewUser {
            external_id: profile.id,
            external_token: grant.token,
            display_name: profile.display_name,
            email,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
        .await?;

    tracing::info!(user_id = %user.id, external_id = %user.external_id, "Created new user");
    Ok(user)
}
