//! Identity Toolkit and Firestore REST client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use url::Url;

use super::{AuthErrorCode, AuthSession, DocumentStore, IdentityError, IdentityProvider};
use crate::config::IdentityConfig;
use crate::users::{Position, USERS_COLLECTION, UserRecord, is_valid_user_id};

/// Documents requested per listing page.
const LIST_PAGE_SIZE: u32 = 300;

/// Client for a Firebase project.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    http: reqwest::Client,
    api_key: String,
    auth_base_url: String,
    documents_url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl FirebaseClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Self::with_client(http, config)
    }

    pub fn with_client(
        http: reqwest::Client,
        config: &IdentityConfig,
    ) -> Result<Self, IdentityError> {
        let mut documents_url = Url::parse(&config.firestore_base_url)
            .map_err(|e| IdentityError::InvalidUrl(e.to_string()))?;
        documents_url
            .path_segments_mut()
            .map_err(|()| IdentityError::InvalidUrl(config.firestore_base_url.clone()))?
            .pop_if_empty()
            .extend([
                "projects",
                config.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
            ]);
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            auth_base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            documents_url,
        })
    }

    fn account_url(&self, method: &str) -> String {
        format!("{}/accounts:{method}", self.auth_base_url)
    }

    fn collection_url(&self) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(USERS_COLLECTION);
        }
        url
    }

    /// Document URL for `uid`. The id is encoded as a single path segment.
    fn user_url(&self, uid: &str) -> Result<Url, IdentityError> {
        if !is_valid_user_id(uid) {
            return Err(IdentityError::InvalidDocumentId(uid.to_string()));
        }
        let mut url = self.collection_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(uid);
        }
        Ok(url)
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let response = self
            .http
            .post(self.account_url(method))
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: PasswordResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(AuthSession {
            uid: body.local_id,
            email: if body.email.is_empty() {
                email.to_string()
            } else {
                body.email
            },
            id_token: body.id_token,
        })
    }
}

/// Turn a non-2xx response into the service's error code.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let code = match serde_json::from_str::<ErrorEnvelope>(&text) {
        // Firestore puts the canonical code in `status`; Identity Toolkit in `message`
        Ok(envelope) => match envelope.error.status.as_deref() {
            Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case("INVALID_ARGUMENT") => {
                AuthErrorCode::parse(s)
            }
            _ => AuthErrorCode::parse(&envelope.error.message),
        },
        Err(_) => AuthErrorCode::Other(format!("HTTP_{}", status.as_u16())),
    };

    warn!(
        name: "identity.request.failed",
        status = status.as_u16(),
        code = %code,
        "Identity service returned an error"
    );
    Err(IdentityError::Service(code))
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn read_string(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn read_bool(fields: &Map<String, Value>, key: &str) -> bool {
    fields
        .get(key)
        .and_then(|v| v.get("booleanValue"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn user_fields(user: &UserRecord) -> Value {
    json!({
        "name": string_value(&user.name),
        "email": string_value(&user.email),
        "position": string_value(user.position.as_stored()),
        "tokenKey": string_value(&user.token_key),
        "termsAccepted": { "booleanValue": user.terms_accepted },
    })
}

fn user_from_document(doc: FirestoreDocument) -> UserRecord {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    UserRecord {
        id,
        name: read_string(&doc.fields, "name"),
        email: read_string(&doc.fields, "email"),
        position: Position::from_stored(&read_string(&doc.fields, "position")),
        token_key: read_string(&doc.fields, "tokenKey"),
        terms_accepted: read_bool(&doc.fields, "termsAccepted"),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        self.password_call("signUp", email, password).await
    }

    async fn update_display_name(&self, id_token: &str, name: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.account_url("update"))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "idToken": id_token,
                "displayName": name,
                "returnSecureToken": false,
            }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirebaseClient {
    async fn get_user(
        &self,
        id_token: &str,
        uid: &str,
    ) -> Result<Option<UserRecord>, IdentityError> {
        let response = self
            .http
            .get(self.user_url(uid)?)
            .bearer_auth(id_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(name: "identity.user.missing", uid = %uid, "User document not found");
            return Ok(None);
        }

        let doc: FirestoreDocument = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        Ok(Some(user_from_document(doc)))
    }

    async fn set_user(&self, id_token: &str, user: &UserRecord) -> Result<(), IdentityError> {
        let response = self
            .http
            .patch(self.user_url(&user.id)?)
            .bearer_auth(id_token)
            .json(&json!({ "fields": user_fields(user) }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn list_users(&self, id_token: &str) -> Result<Vec<UserRecord>, IdentityError> {
        let url = self.collection_url();
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut users = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .http
                .get(url.clone())
                .bearer_auth(id_token)
                .query(&query)
                .send()
                .await?;
            let page: ListDocumentsResponse = check_status(response)
                .await?
                .json()
                .await
                .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

            users.extend(page.documents.into_iter().map(user_from_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(name: "identity.users.listed", count = users.len(), "Listed user documents");
        Ok(users)
    }

    async fn update_position(
        &self,
        id_token: &str,
        uid: &str,
        position: Position,
        token_key: &str,
    ) -> Result<(), IdentityError> {
        let response = self
            .http
            .patch(self.user_url(uid)?)
            .bearer_auth(id_token)
            .query(&[
                ("updateMask.fieldPaths", "position"),
                ("updateMask.fieldPaths", "tokenKey"),
                ("currentDocument.exists", "true"),
            ])
            .json(&json!({
                "fields": {
                    "position": string_value(position.as_stored()),
                    "tokenKey": string_value(token_key),
                }
            }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
