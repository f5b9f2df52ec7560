// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google;
pub mod identity;
pub mod membership;
pub mod session;

pub use google::GoogleOAuthClient;
pub use identity::{
    find_or_create_user, AuthorizationGrant, IdentityProvider, ProfileEmail, ProviderProfile,
};
pub use membership::{MembershipService, MembershipUpdate};
pub use session::{SessionError, SessionManager};
