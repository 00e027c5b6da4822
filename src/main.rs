use std::net::SocketAddr;

use academic_recommender::{app, config::AppConfig, telemetry};
use anyhow::Context;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    let _log_guard = telemetry::init(&config.logging)?;

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .context("invalid SERVER_BIND address")?;

    let app = app::build_router(&config).await?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "academic recommender listening");

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
