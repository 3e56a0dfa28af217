//! In-process identity backend.
//!
//! Accounts, issued tokens and user documents live in maps behind
//! `RwLock`s. Error codes mirror the REST service so pages behave the same.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::{AuthErrorCode, AuthSession, DocumentStore, IdentityError, IdentityProvider};
use crate::users::{Position, UserRecord};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryIdentity {
    /// Keyed by lowercased email.
    accounts: RwLock<HashMap<String, Account>>,
    /// id token -> uid
    tokens: RwLock<HashMap<String, String>>,
    documents: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account together with its user document.
    pub fn seed_user(&self, password: &str, user: UserRecord) {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                user.email.to_lowercase(),
                Account {
                    uid: user.id.clone(),
                    password: password.to_string(),
                    display_name: Some(user.name.clone()),
                },
            );
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id.clone(), user);
    }

    /// Display name recorded for an account.
    #[must_use]
    pub fn display_name(&self, email: &str) -> Option<String> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&email.to_lowercase())
            .and_then(|a| a.display_name.clone())
    }

    fn issue(&self, uid: &str, email: &str) -> AuthSession {
        let id_token = format!("mem.{}", Uuid::new_v4());
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id_token.clone(), uid.to_string());
        AuthSession {
            uid: uid.to_string(),
            email: email.to_string(),
            id_token,
        }
    }

    fn authorize(&self, id_token: &str) -> Result<String, IdentityError> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id_token)
            .cloned()
            .ok_or(IdentityError::Service(AuthErrorCode::PermissionDenied))
    }
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        if !valid_email(email) {
            return Err(IdentityError::Service(AuthErrorCode::InvalidEmail));
        }
        let account = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&email.to_lowercase())
            .cloned()
            .ok_or(IdentityError::Service(AuthErrorCode::UserNotFound))?;
        if account.password != password {
            return Err(IdentityError::Service(AuthErrorCode::WrongPassword));
        }
        Ok(self.issue(&account.uid, email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        if !valid_email(email) {
            return Err(IdentityError::Service(AuthErrorCode::InvalidEmail));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Service(AuthErrorCode::WeakPassword));
        }

        let uid = Uuid::new_v4().simple().to_string();
        {
            let mut accounts = self
                .accounts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let key = email.to_lowercase();
            if accounts.contains_key(&key) {
                return Err(IdentityError::Service(AuthErrorCode::EmailAlreadyInUse));
            }
            accounts.insert(
                key,
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                    display_name: None,
                },
            );
        }
        Ok(self.issue(&uid, email))
    }

    async fn update_display_name(&self, id_token: &str, name: &str) -> Result<(), IdentityError> {
        let uid = self.authorize(id_token)?;
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(account) = accounts.values_mut().find(|a| a.uid == uid) {
            account.display_name = Some(name.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryIdentity {
    async fn get_user(
        &self,
        id_token: &str,
        uid: &str,
    ) -> Result<Option<UserRecord>, IdentityError> {
        self.authorize(id_token)?;
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned())
    }

    async fn set_user(&self, id_token: &str, user: &UserRecord) -> Result<(), IdentityError> {
        self.authorize(id_token)?;
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn list_users(&self, id_token: &str) -> Result<Vec<UserRecord>, IdentityError> {
        self.authorize(id_token)?;
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    async fn update_position(
        &self,
        id_token: &str,
        uid: &str,
        position: Position,
        token_key: &str,
    ) -> Result<(), IdentityError> {
        self.authorize(id_token)?;
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let user = documents
            .get_mut(uid)
            .ok_or_else(|| IdentityError::Service(AuthErrorCode::Other("NOT_FOUND".to_string())))?;
        user.position = position;
        user.token_key = token_key.to_string();
        Ok(())
    }
}
