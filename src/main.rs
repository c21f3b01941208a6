use anyhow::Context;
use tokio::net::TcpListener;

use dianli_qa_backend::config::{AppConfig, AppPaths};
use dianli_qa_backend::logging;
use dianli_qa_backend::server::router::router;
use dianli_qa_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let paths = AppPaths::new();
    logging::init(&paths);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::initialize(config).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("电力交易智能问答系统服务启动...");
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Chat endpoint: http://{}/api/chat", addr);

    let app = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
