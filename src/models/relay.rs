use serde::{Deserialize, Serialize};

/// Inbound body of `POST /api/gpt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub query: String,
}

/// What kind of payload a [`RelayResponse`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Text,
    Audio,
    Image,
}

/// Successful relay outcome: `{ "data": ..., "type": "text" | "audio" | "image" }`.
///
/// For `text`, `data` is the model's message content. For `audio` and `image`
/// it is the media API output, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub data: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
}

impl RelayResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            data: serde_json::Value::String(content.into()),
            kind: ResponseKind::Text,
        }
    }

    pub fn audio(output: serde_json::Value) -> Self {
        Self {
            data: output,
            kind: ResponseKind::Audio,
        }
    }

    pub fn image(output: serde_json::Value) -> Self {
        Self {
            data: output,
            kind: ResponseKind::Image,
        }
    }
}
