//! External identity and user-document services.
//!
//! The portal never stores credentials or user documents itself. Sign-in,
//! sign-up and the `Users` collection are reached through two seams:
//!
//! - [`IdentityProvider`]: password accounts
//! - [`DocumentStore`]: user documents, authorized with the caller's id token
//!
//! [`firebase`] talks to the Identity Toolkit and Firestore REST APIs;
//! [`memory`] keeps everything in process for local runs and tests.

pub mod firebase;
pub mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::IdentityConfig;
use crate::users::{Position, UserRecord};

/// Tokens returned by a successful sign-in or sign-up.
#[derive(Clone)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Error codes reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidCredentials,
    InvalidEmail,
    TooManyRequests,
    EmailAlreadyInUse,
    WeakPassword,
    OperationNotAllowed,
    UserDisabled,
    PermissionDenied,
    Other(String),
}

impl AuthErrorCode {
    /// Parse a service message such as `"WEAK_PASSWORD : Password should be at least 6 characters"`.
    #[must_use]
    pub fn parse(message: &str) -> Self {
        let code = message.split(" : ").next().unwrap_or_default().trim();
        match code {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" => Self::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidCredentials,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "USER_DISABLED" => Self::UserDisabled,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserNotFound => "EMAIL_NOT_FOUND",
            Self::WrongPassword => "INVALID_PASSWORD",
            Self::InvalidCredentials => "INVALID_LOGIN_CREDENTIALS",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::TooManyRequests => "TOO_MANY_ATTEMPTS_TRY_LATER",
            Self::EmailAlreadyInUse => "EMAIL_EXISTS",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::OperationNotAllowed => "OPERATION_NOT_ALLOWED",
            Self::UserDisabled => "USER_DISABLED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The service answered with an error code.
    #[error("identity service error: {0}")]
    Service(AuthErrorCode),

    /// The service could not be reached.
    #[error("identity transport error: {0}")]
    Transport(String),

    /// The service answered with something we could not read.
    #[error("unexpected identity response: {0}")]
    InvalidResponse(String),

    /// Base URL that cannot address documents.
    #[error("invalid identity service url: {0}")]
    InvalidUrl(String),

    /// Id that cannot name a document in the users collection.
    #[error("invalid user id: {0:?}")]
    InvalidDocumentId(String),
}

impl IdentityError {
    /// Service error code, if the failure came from the service itself.
    #[must_use]
    pub fn code(&self) -> Option<&AuthErrorCode> {
        match self {
            Self::Service(code) => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Password accounts.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    /// Set the account's display name.
    async fn update_display_name(&self, id_token: &str, name: &str) -> Result<(), IdentityError>;
}

/// The `Users` collection. Every call is made on behalf of the signed-in user.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Fetch one user document; `None` when it does not exist.
    async fn get_user(&self, id_token: &str, uid: &str)
    -> Result<Option<UserRecord>, IdentityError>;

    /// Create or replace a user document.
    async fn set_user(&self, id_token: &str, user: &UserRecord) -> Result<(), IdentityError>;

    async fn list_users(&self, id_token: &str) -> Result<Vec<UserRecord>, IdentityError>;

    /// Change only `position` and `tokenKey` of an existing document.
    async fn update_position(
        &self,
        id_token: &str,
        uid: &str,
        position: Position,
        token_key: &str,
    ) -> Result<(), IdentityError>;
}

/// Both halves of an identity backend.
#[derive(Debug, Clone)]
pub struct IdentityBackends {
    pub accounts: Arc<dyn IdentityProvider>,
    pub documents: Arc<dyn DocumentStore>,
}

/// Build the backend selected by `identity.provider`.
pub fn build_backends(config: &IdentityConfig) -> anyhow::Result<IdentityBackends> {
    match config.provider.as_str() {
        "firebase" => {
            let client = Arc::new(firebase::FirebaseClient::new(config)?);
            Ok(IdentityBackends {
                accounts: Arc::clone(&client) as Arc<dyn IdentityProvider>,
                documents: client,
            })
        }
        "memory" => {
            let backend = Arc::new(memory::MemoryIdentity::new());
            Ok(IdentityBackends {
                accounts: Arc::clone(&backend) as Arc<dyn IdentityProvider>,
                documents: backend,
            })
        }
        other => anyhow::bail!("unknown identity provider: {other}"),
    }
}
