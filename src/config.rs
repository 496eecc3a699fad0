use std::time::Duration;

use crate::replicate::ModelRef;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";

// Function calling needs a gpt-3.5-turbo or gpt-4 family model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

pub const DEFAULT_MUSIC_MODEL: &str = "facebookresearch/musicgen:7a76a8258b23fae65c5a22debb8841d1d7e816b75c2f24218cd2bd8573787906";
pub const DEFAULT_IMAGE_MODEL: &str =
    "ai-forever/kandinsky-2:601eea49d49003e6ea75a11527209c4f510a93e2112c969d548fbb45b9c4f19f";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Runtime configuration for the relay, resolved once at startup and
/// handed to the clients and the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub replicate_token: String,
    pub replicate_base_url: String,
    pub chat_model: String,
    pub music_model: String,
    pub image_model: String,
    pub poll_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            replicate_token: String::new(),
            replicate_base_url: DEFAULT_REPLICATE_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            music_model: DEFAULT_MUSIC_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    ///
    /// Environment:
    /// - OPENAI_API_KEY                          -> chat API bearer token (default empty)
    /// - REPLICATE_TOKEN / REPLICATE_API_TOKEN   -> media API token (default empty)
    /// - OPENAI_BASE_URL, REPLICATE_BASE_URL     -> upstream base URLs
    /// - CHAT2MEDIA_MODEL                        -> chat model id
    /// - CHAT2MEDIA_MUSIC_MODEL / _IMAGE_MODEL   -> `owner/name:version` references
    /// - CHAT2MEDIA_POLL_INTERVAL_MS             -> prediction poll interval (u64)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let poll_interval = get("CHAT2MEDIA_POLL_INTERVAL_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        Self {
            openai_api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            replicate_token: get("REPLICATE_TOKEN")
                .or_else(|| get("REPLICATE_API_TOKEN"))
                .unwrap_or_default(),
            replicate_base_url: get("REPLICATE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.replicate_base_url),
            chat_model: get("CHAT2MEDIA_MODEL").unwrap_or(defaults.chat_model),
            music_model: get("CHAT2MEDIA_MUSIC_MODEL").unwrap_or(defaults.music_model),
            image_model: get("CHAT2MEDIA_IMAGE_MODEL").unwrap_or(defaults.image_model),
            poll_interval,
        }
    }

    /// Names of credentials that are missing, for startup warnings.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if self.replicate_token.is_empty() {
            missing.push("REPLICATE_TOKEN");
        }
        missing
    }

    /// Problems with the configured media model references, for startup warnings.
    ///
    /// The same check runs again when a model is invoked, so a bad reference
    /// also fails that request with a `config` error.
    pub fn invalid_models(&self) -> Vec<String> {
        [
            ("CHAT2MEDIA_MUSIC_MODEL", &self.music_model),
            ("CHAT2MEDIA_IMAGE_MODEL", &self.image_model),
        ]
        .into_iter()
        .filter_map(|(key, reference)| {
            ModelRef::parse(reference)
                .err()
                .map(|e| format!("{key}: {e}"))
        })
        .collect()
    }
}
