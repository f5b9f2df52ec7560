// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store.
//!
//! Used for local development (`STORE_BACKEND=memory`) and tests. Club
//! mutations run while holding the entry's shard write lock, so concurrent
//! updates to the same user are serialized the same way Firestore field
//! transforms are.

use super::{new_user_id, UserStore};
use crate::error::AppError;
use crate::models::{ClubUpdate, NewUser, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Shared in-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    /// external_id -> id; the entry lock makes lookup-before-create race free
    by_external_id: Arc<DashMap<String, String>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|user| user.value().clone()))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.by_external_id.get(external_id).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        match self.by_external_id.entry(user.external_id.clone()) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "user with external id {} already exists",
                user.external_id
            ))),
            Entry::Vacant(slot) => {
                let user = user.into_user(new_user_id());
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            }
        }
    }

    async fn update_clubs(&self, id: &str, update: ClubUpdate) -> Result<User, AppError> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        let changed = update.apply(&mut user.clubs);
        tracing::debug!(user_id = id, club = update.club(), changed, "Applied club update");
        Ok(user.value().clone())
    }
}
