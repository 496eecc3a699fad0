#![forbid(unsafe_code)]
#![doc = r#"
Chat2Media

Relay a natural-language query to OpenAI Chat Completions with two declared
functions (`createMusic`, `createImage`). When the model calls one, its
arguments are forwarded to a Replicate model and the generated media is
returned; otherwise the model's text answer is.

Modules
- `models`: Chat Completions wire types and the relay request/response bodies.
- `functions`: Static function declarations and directive dispatch.
- `openai` / `replicate`: Upstream clients behind the `ChatClient` / `MediaClient` traits.
- `relay`: The request handler core.
- `server`: Axum router (`POST /api/gpt`, `GET /status`).
- `config`, `util`: Environment configuration, tracing, HTTP client and CORS helpers.
"#]

pub mod config;
pub mod error;
pub mod functions;
pub mod models;
pub mod openai;
pub mod relay;
pub mod replicate;
pub mod server;
pub mod util;

pub use crate::config::RelayConfig;
pub use crate::error::RelayError;
pub use crate::relay::Relay;

pub use crate::models::{chat, relay as relay_models};
