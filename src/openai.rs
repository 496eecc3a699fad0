//! Chat Completions upstream.

use async_trait::async_trait;

use crate::error::{RelayError, Result};
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse};

const SERVICE: &str = "openai";

/// Sends a chat completion request and returns the decoded response.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;
}

/// `POST {base_url}/chat/completions` with bearer auth.
pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiChatClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = self.url();
        tracing::debug!(url = %url, model = %request.model, "sending chat completion request");

        let mut rb = self
            .http
            .post(&url)
            .header(http::header::CONTENT_TYPE, "application/json");
        if !self.api_key.is_empty() {
            rb = rb.bearer_auth(&self.api_key);
        }
        let resp = rb
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Connection {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| RelayError::Connection {
            service: SERVICE,
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                service: SERVICE,
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::shape(SERVICE, format!("invalid chat completion body: {e}")))
    }
}
