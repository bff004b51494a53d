//! Entry point: load config, wire services, serve HTTP until Ctrl-C.

use anyhow::Context;
use dotenv::dotenv;
use projectdesk::adapters::http;
use projectdesk::bootstrap::build_state;
use projectdesk::shared::config::AppConfig;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load()
        .context("load configuration (PROJECTDESK_* env or PROJECTDESK_CONFIG file)")?;
    let state = build_state(&cfg).await?;

    let addr = format!("{}:{}", cfg.host_or_default(), cfg.port_or_default());
    let listener = TcpListener::bind(&addr).await?;
    http::serve(listener, state, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
    })
    .await?;
    info!("server stopped");
    Ok(())
}
