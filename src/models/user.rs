//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User document stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-generated identifier (also used as document ID and session handle)
    pub id: String,
    /// Google account ID (`sub`)
    pub external_id: String,
    /// Provider access token captured at first login
    pub external_token: String,
    pub display_name: String,
    pub email: String,
    /// Club identifiers; never contains duplicates
    #[serde(default)]
    pub clubs: Vec<String>,
    /// When the user first signed in
    #[serde(default)]
    pub created_at: String,
}

/// A user that has not been persisted yet. The store assigns the `id`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_id: String,
    pub external_token: String,
    pub display_name: String,
    pub email: String,
    pub created_at: String,
}

impl NewUser {
    /// Attach a store-generated ID. Membership always starts empty.
    pub fn into_user(self, id: String) -> User {
        User {
            id,
            external_id: self.external_id,
            external_token: self.external_token,
            display_name: self.display_name,
            email: self.email,
            clubs: Vec::new(),
            created_at: self.created_at,
        }
    }
}

/// Atomic mutation applied to a user's `clubs` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClubUpdate {
    /// Append the club unless already present.
    AddToSet(String),
    /// Remove every occurrence of the club (no-op if absent).
    Pull(String),
}

impl ClubUpdate {
    pub fn club(&self) -> &str {
        match self {
            ClubUpdate::AddToSet(club) | ClubUpdate::Pull(club) => club,
        }
    }

    /// Apply to an in-memory list. Returns whether the list changed.
    pub fn apply(&self, clubs: &mut Vec<String>) -> bool {
        match self {
            ClubUpdate::AddToSet(club) => {
                if clubs.iter().any(|c| c == club) {
                    false
                } else {
                    clubs.push(club.clone());
                    true
                }
            }
            ClubUpdate::Pull(club) => {
                let before = clubs.len();
                clubs.retain(|c| c != club);
                clubs.len() != before
            }
        }
    }
}
