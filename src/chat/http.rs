use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ChatBackend, ChatError, ChatReply, ChatRequest};
use crate::config::ChatConfig;

/// Posts questions as `multipart/form-data` to the chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    output: Option<serde_json::Value>,
}

impl HttpChatBackend {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn ask(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let file_count = request.files.len();
        let mut form = reqwest::multipart::Form::new()
            .text("question", request.question)
            .text("token", request.token);

        for file in request.files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str(&file.content_type)
                .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
            form = form.part("file", part);
        }

        debug!(
            name: "chat.request.sent",
            endpoint = %self.endpoint,
            files = file_count,
            "Forwarding question to chat backend"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                name: "chat.request.failed",
                status = status.as_u16(),
                "Chat backend returned an error"
            );
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        let output = match body.output {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
        .filter(|s| !s.trim().is_empty());

        Ok(ChatReply { output })
    }
}
