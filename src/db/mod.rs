//! Database layer.
//!
//! Handlers only see the [`UserStore`] trait; Firestore backs production and
//! [`MemoryDb`] backs local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{ClubUpdate, NewUser, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Persistence contract for user records.
///
/// Implementations must apply [`ClubUpdate`] atomically on the store side;
/// callers never read, modify and write back `clubs` themselves.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by store ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Get the user linked to an identity-provider account.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError>;

    /// All users, unpaginated.
    async fn list(&self) -> Result<Vec<User>, AppError>;

    /// Persist a new user under a freshly generated ID.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Apply a set mutation to `clubs` and return the updated user.
    ///
    /// Fails with [`AppError::NotFound`] if the user does not exist.
    async fn update_clubs(&self, id: &str, update: ClubUpdate) -> Result<User, AppError>;
}

/// Generate a new opaque user ID.
pub(crate) fn new_user_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
