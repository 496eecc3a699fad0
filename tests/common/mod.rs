#![allow(dead_code)]

pub mod upstream_stub;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http;
use chat2media::{server::build_router, Relay, RelayConfig};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The real router bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    fn make_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed building reqwest client")
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(http::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
    }

    pub async fn post_bytes(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(http::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Config pointing both upstreams at `upstream_base` with test credentials.
pub fn test_config(upstream_base: &str) -> RelayConfig {
    RelayConfig {
        openai_api_key: "sk-test".into(),
        openai_base_url: upstream_base.into(),
        replicate_token: "r8-test".into(),
        replicate_base_url: upstream_base.into(),
        poll_interval: Duration::from_millis(10),
        ..RelayConfig::default()
    }
}

/// Spawn the application router with a relay built from `config`.
pub async fn spawn_app(config: RelayConfig) -> TestServer {
    let relay = Arc::new(Relay::from_config(reqwest::Client::new(), config));
    let app = build_router(relay);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app.into_make_service());

    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url,
        addr,
        join,
        client: TestServer::make_client(),
    }
}
