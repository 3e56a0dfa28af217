//! RAG Portal
//!
//! Multi-tenant web front end for a retrieval-augmented chat service:
//! login, registration, a role-gated admin dashboard and a chat page that
//! relays questions and documents to an external completion endpoint.
//!
//! # Architecture
//!
//! - **Server**: Axum router with server-rendered HTML forms
//! - **Identity**: auth and `Users` documents behind [`identity`] traits
//! - **Chat**: multipart relay to the completion endpoint
//! - **Sessions**: in-memory, cookie keyed
//!
//! # Modules
//!
//! - [`chat`]: completion relay and attachment policy
//! - [`config`]: layered configuration
//! - [`crypto`]: role token sealing
//! - [`i18n`]: locales and message catalogs
//! - [`routes`]: page and API handlers
//! - [`security`]: session, role and rate-limit guards
//! - [`session`]: browser sessions and chat threads
//! - [`ui`]: page renderers
//! - [`users`]: positions and the user directory

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod crypto;
pub mod error;
pub mod i18n;
pub mod identity;
pub mod routes;
pub mod security;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod ui;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use crate::chat::ChatBackend;
use crate::config::AppConfig;
use crate::crypto::{CryptoError, RoleTokenCipher};
use crate::identity::{DocumentStore, IdentityBackends, IdentityProvider};
use crate::security::CredentialRateLimiter;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Password accounts.
    pub accounts: Arc<dyn IdentityProvider>,
    /// `Users` collection.
    pub documents: Arc<dyn DocumentStore>,
    /// Chat completion relay.
    pub chat: Arc<dyn ChatBackend>,
    /// Role token cipher.
    pub cipher: RoleTokenCipher,
    /// Browser sessions.
    pub sessions: SessionStore,
    /// Per-client credential rate limiter
    pub rate_limiter: Arc<CredentialRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        identity: IdentityBackends,
        chat: Arc<dyn ChatBackend>,
    ) -> Result<Self, CryptoError> {
        let cipher = RoleTokenCipher::from_base64(&config.crypto.role_key)?;
        let sessions = SessionStore::new(Duration::from_secs(config.session.ttl_minutes * 60));
        let rate_limiter = Arc::new(CredentialRateLimiter::new(
            config.resilience.requests_per_second,
            config.resilience.burst_size,
        ));

        Ok(Self {
            accounts: identity.accounts,
            documents: identity.documents,
            chat,
            cipher,
            sessions,
            rate_limiter,
            config,
        })
    }
}
