use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::error::RelayError;
use crate::models::relay::RelayRequest;
use crate::relay::Relay;
use crate::util::cors_layer_from_env;

pub const RELAY_ROUTE: &str = "/api/gpt";

/// Build the Axum router with `/api/gpt` and `/status` around a shared relay.
pub fn build_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route(RELAY_ROUTE, post(relay_query))
        .with_state(relay)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer_from_env())
}

/// Service status endpoint.
async fn status(State(relay): State<Arc<Relay>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "chat2media",
        "version": env!("CARGO_PKG_VERSION"),
        "chat_model": relay.config().chat_model,
        "routes": ["/status", RELAY_ROUTE]
    }))
}

/// Relay a `{ "query": ... }` body through the chat model and, when it asks
/// for one, the matching media model.
///
/// The body is decoded by hand so that malformed input gets the same
/// `{ "error": ... }` envelope as every other failure.
async fn relay_query(State(relay): State<Arc<Relay>>, body: Bytes) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("relay", %request_id);

    async move {
        let result = match serde_json::from_slice::<RelayRequest>(&body) {
            Ok(req) => relay.handle(&req.query).await,
            Err(e) => Err(RelayError::InvalidRequest(e.to_string())),
        };
        match result {
            Ok(out) => {
                tracing::info!(kind = ?out.kind, "relay complete");
                Json(out).into_response()
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "relay failed");
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
