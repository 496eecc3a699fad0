//! Replicate predictions upstream.
//!
//! Running a model is two steps: create a prediction, then poll it until it
//! reaches a terminal status. The output of a succeeded prediction is returned
//! untouched; its shape is defined by the model (usually a URL or list of URLs).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

const SERVICE: &str = "replicate";

/// Runs a generative model with an input map and returns its output.
#[async_trait]
pub trait MediaClient: Send + Sync {
    async fn run(&self, model: &str, input: Map<String, Value>) -> Result<Value>;
}

/// A model reference: `owner/name:version` pins a version, `owner/name`
/// targets the model's latest deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    Version(String),
    Model { owner: String, name: String },
}

impl ModelRef {
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (model, version) = match reference.split_once(':') {
            Some((model, version)) => (model, Some(version)),
            None => (reference, None),
        };
        let Some((owner, name)) = model
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
        else {
            return Err(RelayError::Config(format!(
                "model reference '{reference}' must be owner/name or owner/name:version"
            )));
        };
        match version {
            Some("") => Err(RelayError::Config(format!(
                "model reference '{reference}' has an empty version"
            ))),
            Some(version) => Ok(Self::Version(version.to_string())),
            None => Ok(Self::Model {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

/// Prediction lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: &'a Map<String, Value>,
}

pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            poll_interval,
        }
    }

    async fn create(&self, model: &ModelRef, input: &Map<String, Value>) -> Result<Prediction> {
        let (url, version) = match model {
            ModelRef::Version(v) => (format!("{}/predictions", self.base_url), Some(v.as_str())),
            ModelRef::Model { owner, name } => (
                format!("{}/models/{owner}/{name}/predictions", self.base_url),
                None,
            ),
        };
        let body = CreatePrediction { version, input };
        let rb = self.authorized(self.http.post(&url)).json(&body);
        self.send(rb).await
    }

    async fn get(&self, id: &str) -> Result<Prediction> {
        let url = format!("{}/predictions/{id}", self.base_url);
        let rb = self.authorized(self.http.get(&url));
        self.send(rb).await
    }

    fn authorized(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            rb
        } else {
            rb.bearer_auth(&self.token)
        }
    }

    async fn send(&self, rb: reqwest::RequestBuilder) -> Result<Prediction> {
        let resp = rb.send().await.map_err(|e| RelayError::Connection {
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
            .map_err(|e| RelayError::shape(SERVICE, format!("invalid prediction body: {e}")))
    }
}

#[async_trait]
impl MediaClient for ReplicateClient {
    async fn run(&self, model: &str, input: Map<String, Value>) -> Result<Value> {
        let model_ref = ModelRef::parse(model)?;
        let mut prediction = self.create(&model_ref, &input).await?;
        tracing::info!(
            model = %model,
            prediction = %prediction.id,
            status = prediction.status.as_str(),
            "prediction created"
        );

        while !prediction.status.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get(&prediction.id).await?;
            tracing::debug!(
                prediction = %prediction.id,
                status = prediction.status.as_str(),
                "polled prediction"
            );
        }

        match prediction.status {
            PredictionStatus::Succeeded => Ok(prediction.output.unwrap_or(Value::Null)),
            status => {
                let message = match prediction.error {
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => "no error reported".to_string(),
                };
                Err(RelayError::PredictionFailed {
                    id: prediction.id,
                    status: status.as_str().to_string(),
                    message,
                })
            }
        }
    }
}
