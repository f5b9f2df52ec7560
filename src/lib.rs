// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Clubs API: session-authenticated club membership service.
//!
//! This crate provides the backend API that signs users in through Google
//! OAuth and lets each signed-in user manage the set of clubs they belong to.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::UserStore;
use services::{IdentityProvider, MembershipService, SessionManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub sessions: SessionManager,
    pub membership: MembershipService,
}

impl AppState {
    /// Assemble state, wiring the session and membership services to the same store.
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let sessions = SessionManager::new(store.clone(), &config.session_key);
        let membership = MembershipService::new(store.clone());
        Self {
            config,
            store,
            identity_provider,
            sessions,
            membership,
        }
    }
}
