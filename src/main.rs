use std::sync::Arc;

use anyhow::Context;
use chat2media::server::{build_router, RELAY_ROUTE};
use chat2media::util::{build_http_client_from_env, env_bind_addr, init_tracing};
use chat2media::{Relay, RelayConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = RelayConfig::from_env();
    for key in config.missing_credentials() {
        tracing::warn!("{} is not set; upstream calls will be unauthenticated", key);
    }
    for problem in config.invalid_models() {
        tracing::warn!("{}; requests for that model will fail", problem);
    }
    tracing::info!(
        chat_model = %config.chat_model,
        openai = %config.openai_base_url,
        replicate = %config.replicate_base_url,
        "relay configured"
    );

    let relay = Arc::new(Relay::from_config(build_http_client_from_env(), config));
    let app = build_router(relay);

    let addr = env_bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Chat2Media listening on http://{}{}", addr, RELAY_ROUTE);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Chat2Media stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
