//! Data models for the relay endpoint and the Chat Completions API.
//!
//! - `chat`: the subset of the OpenAI Chat Completions request/response this service uses.
//! - `relay`: the inbound `{ query }` body and the outbound `{ data, type }` body.

pub mod chat;
pub mod relay;

pub use chat::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatResponseMessage,
    FunctionCall, FunctionDef, Role,
};
pub use relay::{RelayRequest, RelayResponse, ResponseKind};
