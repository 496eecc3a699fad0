use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Everything that can go wrong while relaying a query.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Inbound body is not JSON or lacks a string `query`.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network failure talking to an upstream API.
    #[error("{service} request failed: {message}")]
    Connection {
        service: &'static str,
        message: String,
    },

    /// Upstream answered with a non-success HTTP status.
    #[error("{service} API error ({status}): {message}")]
    UpstreamStatus {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// A media prediction reached a terminal state other than `succeeded`.
    #[error("prediction {id} {status}: {message}")]
    PredictionFailed {
        id: String,
        status: String,
        message: String,
    },

    /// Upstream replied with something the relay cannot interpret.
    #[error("unexpected {service} response: {message}")]
    ResponseShape {
        service: &'static str,
        message: String,
    },

    /// The model asked for a function that was never declared.
    #[error("model requested unknown function '{0}'")]
    UnknownFunction(String),

    /// Server-side misconfiguration, e.g. an unusable model reference.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RelayError {
    pub(crate) fn shape(service: &'static str, message: impl Into<String>) -> Self {
        Self::ResponseShape {
            service,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownFunction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Connection { .. }
            | Self::UpstreamStatus { .. }
            | Self::PredictionFailed { .. }
            | Self::ResponseShape { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Connection { .. } | Self::UpstreamStatus { .. } | Self::PredictionFailed { .. } => {
                "upstream"
            }
            Self::ResponseShape { .. } => "response_shape",
            Self::UnknownFunction(_) => "unknown_function",
            Self::Config(_) => "config",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    kind: &'static str,
    message: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetails {
                kind: self.kind(),
                message: self.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}
