//! Shared fixtures for the HTTP flow tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use tower::ServiceExt;

use rag_portal::AppState;
use rag_portal::chat::{ChatBackend, ChatError, ChatReply, ChatRequest};
use rag_portal::config::{
    AppConfig, ChatConfig, CryptoConfig, IdentityConfig, ResilienceConfig, ServerConfig,
    SessionConfig,
};
use rag_portal::crypto::RoleTokenCipher;
use rag_portal::identity::IdentityBackends;
use rag_portal::identity::memory::MemoryIdentity;
use rag_portal::server::build_router;
use rag_portal::users::{Position, UserRecord};

pub const ROLE_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
pub const PASSWORD: &str = "secret1";
pub const ADMIN_EMAIL: &str = "ana@example.com";
pub const EMPLOYEE_EMAIL: &str = "bruno@example.com";
pub const COOKIE_NAME: &str = "portal_session";

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            static_dir: "static".to_string(),
        },
        identity: IdentityConfig {
            provider: "memory".to_string(),
            api_key: String::new(),
            project_id: String::new(),
            auth_base_url: "http://127.0.0.1:1".to_string(),
            firestore_base_url: "http://127.0.0.1:1".to_string(),
        },
        chat: ChatConfig {
            endpoint: "http://127.0.0.1:1/generate-query".to_string(),
            timeout_secs: 5,
            max_upload_bytes: 10 * 1024 * 1024,
        },
        crypto: CryptoConfig {
            role_key: ROLE_KEY.to_string(),
        },
        session: SessionConfig {
            cookie_name: COOKIE_NAME.to_string(),
            ttl_minutes: 30,
        },
        resilience: ResilienceConfig {
            rate_limit_enabled: false,
            requests_per_second: 5,
            burst_size: 10,
            request_timeout_secs: 30,
        },
    }
}

/// Chat backend double: records every request and answers with `reply`.
#[derive(Debug)]
pub struct FakeChat {
    pub reply: Result<Option<String>, ()>,
    pub delay: Option<Duration>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChat {
    pub fn answering(text: Option<&str>) -> Self {
        Self {
            reply: Ok(text.map(str::to_string)),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers only after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::answering(Some("late"))
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChatBackend for FakeChat {
    async fn ask(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(output) => Ok(ChatReply {
                output: output.clone(),
            }),
            Err(()) => Err(ChatError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub identity: Arc<MemoryIdentity>,
    pub chat: Arc<FakeChat>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), FakeChat::answering(Some("Hello from the assistant")))
    }

    pub fn with(config: AppConfig, chat: FakeChat) -> Self {
        let identity = Arc::new(MemoryIdentity::new());
        let cipher = RoleTokenCipher::from_base64(ROLE_KEY).expect("role key");

        let seed = |id: &str, name: &str, email: &str, position: Position| UserRecord {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            position,
            token_key: cipher.seal_position(position).unwrap_or_default(),
            terms_accepted: true,
        };
        identity.seed_user(PASSWORD, seed("u-admin", "Ana", ADMIN_EMAIL, Position::MainAdmin));
        identity.seed_user(
            PASSWORD,
            seed("u-employee", "Bruno", EMPLOYEE_EMAIL, Position::Employee),
        );

        let chat = Arc::new(chat);
        let backends = IdentityBackends {
            accounts: Arc::clone(&identity) as _,
            documents: Arc::clone(&identity) as _,
        };
        let state = AppState::new(Arc::new(config), backends, Arc::clone(&chat) as _)
            .expect("state");

        Self {
            router: build_router(state.clone()),
            state,
            identity,
            chat,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request")).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).expect("request"))
            .await
    }

    /// Sign in through the login form and return the `Cookie` header value.
    pub async fn login(&self, email: &str) -> String {
        let body = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
        let response = self.post_form("/en/login", &body, None).await;
        assert_eq!(response.status(), 303, "login should redirect");
        session_cookie(&response).expect("session cookie set")
    }
}

/// `name=value` of the session cookie set by a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{COOKIE_NAME}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
