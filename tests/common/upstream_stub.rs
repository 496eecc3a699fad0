use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What the stub's `/v1/chat/completions` answers.
#[derive(Clone)]
pub enum ChatReply {
    /// Wrapped as the single choice of a full completion body.
    Message(Value),
    /// Sent as the whole 200 body.
    Body(Value),
    Error { status: StatusCode, body: Value },
}

/// How the stub's predictions end after one `processing` poll.
#[derive(Clone)]
pub enum PredictionOutcome {
    Succeed(Value),
    Fail(String),
    Cancel,
}

/// One stub server standing in for both the OpenAI and Replicate APIs.
pub struct UpstreamStub {
    base_url: String,
    state: Arc<StubState>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

struct StubState {
    chat_reply: ChatReply,
    outcome: PredictionOutcome,
    chat_requests: Mutex<Vec<Value>>,
    prediction_requests: Mutex<Vec<Value>>,
    prediction_paths: Mutex<Vec<String>>,
    authorizations: Mutex<Vec<String>>,
    polls: AtomicUsize,
}

impl UpstreamStub {
    pub async fn start(chat_reply: ChatReply, outcome: PredictionOutcome) -> Self {
        let state = Arc::new(StubState {
            chat_reply,
            outcome,
            chat_requests: Mutex::new(Vec::new()),
            prediction_requests: Mutex::new(Vec::new()),
            prediction_paths: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(chat_handler))
            .route("/v1/predictions", post(create_prediction))
            .route(
                "/v1/models/:owner/:name/predictions",
                post(create_model_prediction),
            )
            .route("/v1/predictions/:id", get(get_prediction))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream stub");
        let addr = listener.local_addr().expect("upstream stub local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Upstream stub server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        UpstreamStub {
            base_url: format!("http://{}/v1", addr),
            state,
            shutdown: Mutex::new(Some(tx)),
        }
    }

    /// Stub answering the chat request with a plain assistant message.
    pub async fn text(content: &str) -> Self {
        Self::start(
            ChatReply::Message(json!({"role": "assistant", "content": content})),
            PredictionOutcome::Succeed(Value::Null),
        )
        .await
    }

    /// Stub answering the chat request with a function call.
    pub async fn function_call(name: &str, arguments: &str, outcome: PredictionOutcome) -> Self {
        Self::start(
            ChatReply::Message(json!({
                "role": "assistant",
                "content": null,
                "function_call": {"name": name, "arguments": arguments}
            })),
            outcome,
        )
        .await
    }

    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chat_requests.lock().expect("lock").clone()
    }

    pub fn prediction_requests(&self) -> Vec<Value> {
        self.state.prediction_requests.lock().expect("lock").clone()
    }

    /// Paths (below `/v1`) that predictions were created on.
    pub fn prediction_paths(&self) -> Vec<String> {
        self.state.prediction_paths.lock().expect("lock").clone()
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().expect("lock").clone()
    }

    pub fn polls(&self) -> usize {
        self.state.polls.load(Ordering::SeqCst)
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.shutdown.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    }
}

fn record_auth(state: &StubState, headers: &HeaderMap) {
    if let Some(v) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        state.authorizations.lock().expect("lock").push(v.to_string());
    }
}

async fn chat_handler(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_auth(&state, &headers);
    state.chat_requests.lock().expect("lock").push(body);

    match &state.chat_reply {
        ChatReply::Message(message) => (
            StatusCode::OK,
            Json(json!({
                "id": "chatcmpl-stub",
                "object": "chat.completion",
                "created": 1_700_000_000u64,
                "model": "gpt-4",
                "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })),
        ),
        ChatReply::Body(body) => (StatusCode::OK, Json(body.clone())),
        ChatReply::Error { status, body } => (*status, Json(body.clone())),
    }
}

async fn create_prediction(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_prediction(&state, &headers, "/predictions".to_string(), body)
}

async fn create_model_prediction(
    State(state): State<Arc<StubState>>,
    Path((owner, name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let path = format!("/models/{owner}/{name}/predictions");
    record_prediction(&state, &headers, path, body)
}

fn record_prediction(
    state: &StubState,
    headers: &HeaderMap,
    path: String,
    body: Value,
) -> (StatusCode, Json<Value>) {
    record_auth(state, headers);
    state.prediction_paths.lock().expect("lock").push(path);
    state.prediction_requests.lock().expect("lock").push(body);
    (
        StatusCode::CREATED,
        Json(json!({"id": "pred-1", "status": "starting", "output": null, "error": null})),
    )
}

async fn get_prediction(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
) -> Json<Value> {
    let n = state.polls.fetch_add(1, Ordering::SeqCst);
    if n == 0 {
        return Json(json!({"id": id, "status": "processing", "output": null}));
    }
    match &state.outcome {
        PredictionOutcome::Succeed(output) => {
            Json(json!({"id": id, "status": "succeeded", "output": output}))
        }
        PredictionOutcome::Fail(message) => {
            Json(json!({"id": id, "status": "failed", "output": null, "error": message}))
        }
        PredictionOutcome::Cancel => {
            Json(json!({"id": id, "status": "canceled", "output": null, "error": null}))
        }
    }
}
