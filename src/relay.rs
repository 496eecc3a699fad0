//! The completion relay: query → chat model → (optional) media model → response.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::functions::{self, Invocation, MediaFunction};
use crate::models::chat::{ChatCompletionRequest, ChatMessage};
use crate::models::relay::RelayResponse;
use crate::openai::{ChatClient, OpenAiChatClient};
use crate::replicate::{MediaClient, ReplicateClient};

/// Holds both upstream clients and the model configuration.
///
/// Immutable after construction; shared across requests behind an `Arc`.
pub struct Relay {
    chat: Arc<dyn ChatClient>,
    media: Arc<dyn MediaClient>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(chat: Arc<dyn ChatClient>, media: Arc<dyn MediaClient>, config: RelayConfig) -> Self {
        Self {
            chat,
            media,
            config,
        }
    }

    /// Wire the OpenAI and Replicate clients from `config`, sharing one HTTP client.
    pub fn from_config(http: reqwest::Client, config: RelayConfig) -> Self {
        let chat = OpenAiChatClient::new(
            http.clone(),
            config.openai_base_url.clone(),
            config.openai_api_key.clone(),
        );
        let media = ReplicateClient::new(
            http,
            config.replicate_base_url.clone(),
            config.replicate_token.clone(),
            config.poll_interval,
        );
        Self::new(Arc::new(chat), Arc::new(media), config)
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The chat request sent for `query`: one user message plus both function declarations.
    pub fn chat_request(&self, query: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.chat_model.clone(),
            messages: vec![ChatMessage::user(query)],
            functions: Some(functions::declarations().to_vec()),
            function_call: None,
            temperature: None,
            user: None,
        }
    }

    /// Relay one query. Exactly one of text, audio, image or an error comes back.
    pub async fn handle(&self, query: &str) -> Result<RelayResponse> {
        let request = self.chat_request(query);
        let response = self.chat.complete(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::shape("openai", "response contains no choices"))?;

        let Some(call) = choice.message.directive() else {
            tracing::debug!(finish_reason = ?choice.finish_reason, "model answered with text");
            return Ok(RelayResponse::text(
                choice.message.content.clone().unwrap_or_default(),
            ));
        };

        tracing::info!(function = %call.name, arguments = %call.arguments, "function_call");
        let invocation = Invocation::resolve(call)?;
        self.invoke(invocation).await
    }

    async fn invoke(&self, invocation: Invocation) -> Result<RelayResponse> {
        let function = invocation.function;
        let model = match function {
            MediaFunction::Music => &self.config.music_model,
            MediaFunction::Image => &self.config.image_model,
        };
        let input = function.media_input(invocation.arguments);
        let output = self.media.run(model, input).await?;

        Ok(match function {
            MediaFunction::Music => RelayResponse::audio(output),
            MediaFunction::Image => RelayResponse::image(output),
        })
    }
}
