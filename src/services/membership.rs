// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club membership operations for the signed-in user.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{ClubUpdate, User};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of an add or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipUpdate {
    /// Club named in the request
    pub club: String,
    /// Membership after the update was applied
    pub clubs: Vec<String>,
}

/// Reads and mutates a user's club list through the store's atomic updates.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn UserStore>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// The user's clubs as loaded with their session.
    pub fn list_clubs(user: &User) -> Vec<String> {
        user.clubs.clone()
    }

    /// Add `club` unless already present.
    pub async fn add_club(&self, user_id: &str, club: &str) -> Result<MembershipUpdate, AppError> {
        self.apply(user_id, ClubUpdate::AddToSet(club.to_string()))
            .await
    }

    /// Remove `club`; succeeds when it was never present.
    pub async fn remove_club(
        &self,
        user_id: &str,
        club: &str,
    ) -> Result<MembershipUpdate, AppError> {
        self.apply(user_id, ClubUpdate::Pull(club.to_string())).await
    }

    async fn apply(&self, user_id: &str, update: ClubUpdate) -> Result<MembershipUpdate, AppError> {
        let club = update.club().to_string();
        let user = self.store.update_clubs(user_id, update).await?;

        tracing::info!(user_id, club = %club, count = user.clubs.len(), "Membership updated");

        Ok(MembershipUpdate {
            club,
            clubs: user.clubs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::NewUser;

    async fn setup() -> (MembershipService, Arc<MemoryDb>, String) {
        let db = Arc::new(MemoryDb::new());
        let user = db
            .create(NewUser {
                external_id: "g1".into(),
                external_token: "tok".into(),
                display_name: "Ada".into(),
                email: "ada@x.com".into(),
                created_at: "2026-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap();
        (MembershipService::new(db.clone()), db, user.id)
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let (service, _, id) = setup().await;

        service.add_club(&id, "chess").await.unwrap();
        let update = service.add_club(&id, "chess").await.unwrap();

        assert_eq!(update.club, "chess");
        assert_eq!(update.clubs, vec!["chess".to_string()]);
    }

    #[tokio::test]
    async fn remove_absent_is_noop() {
        let (service, _, id) = setup().await;
        service.add_club(&id, "go").await.unwrap();

        let update = service.remove_club(&id, "chess").await.unwrap();
        assert_eq!(update.clubs, vec!["go".to_string()]);
    }

    #[tokio::test]
    async fn add_then_remove_roundtrip() {
        let (service, db, id) = setup().await;

        service.add_club(&id, "chess").await.unwrap();
        let user = db.find_by_id(&id).await.unwrap().unwrap();
        assert!(MembershipService::list_clubs(&user).contains(&"chess".to_string()));

        service.remove_club(&id, "chess").await.unwrap();
        let user = db.find_by_id(&id).await.unwrap().unwrap();
        assert!(!MembershipService::list_clubs(&user).contains(&"chess".to_string()));
    }

    #[tokio::test]
    async fn concurrent_adds_of_different_clubs_both_land() {
        let (service, db, id) = setup().await;

        let (x, y) = tokio::join!(service.add_club(&id, "x"), service.add_club(&id, "y"));
        x.unwrap();
        y.unwrap();

        let clubs = db.find_by_id(&id).await.unwrap().unwrap().clubs;
        assert!(clubs.contains(&"x".to_string()));
        assert!(clubs.contains(&"y".to_string()));
    }

    #[tokio::test]
    async fn unknown_user_fails() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.add_club("nobody", "chess").await,
            Err(AppError::NotFound(_))
        ));
    }
}
