// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Users live in the `users` collection keyed by their store-generated ID.
//! Membership changes are expressed as Firestore field transforms
//! (`append_missing_elements` / `remove_all_from_array`) so the server
//! applies them atomically against the current document.

use super::{collections, new_user_id, UserStore};
use crate::error::AppError;
use crate::models::{ClubUpdate, NewUser, User};
use async_trait::async_trait;
use futures_util::TryStreamExt;

/// Field holding the membership array.
const CLUBS_FIELD: &str = "clubs";
/// Field holding the identity-provider account ID.
const EXTERNAL_ID_FIELD: &str = "externalId";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        let external_id = external_id.to_string();
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field(EXTERNAL_ID_FIELD).eq(external_id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.pop())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let stream = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj::<User>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stream
            .try_collect::<Vec<User>>()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let user = user.into_user(new_user_id());

        // `insert` fails if the document already exists, so an ID collision
        // can never overwrite another user.
        let created: User = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id = %created.id, "Created user document");
        Ok(created)
    }

    async fn update_clubs(&self, id: &str, update: ClubUpdate) -> Result<User, AppError> {
        let client = self.get_client()?;

        // Transforms on a missing document would create it, so check first.
        // The check does not guard `clubs` itself; that is the transform's job.
        if self.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let club = update.club().to_string();
        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(id)
            .transforms(|t| match &update {
                ClubUpdate::AddToSet(_) => t.fields([t
                    .field(CLUBS_FIELD)
                    .append_missing_elements([club.as_str()])]),
                ClubUpdate::Pull(_) => t.fields([t
                    .field(CLUBS_FIELD)
                    .remove_all_from_array([club.as_str()])]),
            })
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add club update to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
