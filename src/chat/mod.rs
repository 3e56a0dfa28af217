//! Relay to the external chat completion endpoint.
//!
//! - [`ChatBackend`]: the seam handlers call
//! - [`HttpChatBackend`]: multipart POST to the configured endpoint
//! - [`attachments`]: upload policy and transcript formatting

pub mod attachments;
mod http;

use async_trait::async_trait;

pub use attachments::{Attachment, compose_user_message, partition, upstream_question};
pub use http::HttpChatBackend;

/// One question with its attachments.
#[derive(Clone)]
pub struct ChatRequest {
    pub question: String,
    /// Sealed role token of the caller.
    pub token: String,
    pub files: Vec<Attachment>,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("question", &self.question)
            .field("token", &"<redacted>")
            .field("files", &self.files)
            .finish()
    }
}

/// Backend answer; `output` is `None` when the backend returned nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub output: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat backend unreachable: {0}")]
    Transport(String),

    #[error("chat backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("chat backend response unreadable: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ChatBackend: Send + Sync + std::fmt::Debug {
    async fn ask(&self, request: ChatRequest) -> Result<ChatReply, ChatError>;
}
