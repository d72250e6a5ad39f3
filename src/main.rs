use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agent_suite_portal::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agent_suite_portal=debug,tower_http=debug")),
        )
        .init();

    let config = Config::discover();
    let system_config = &config.system_config;
    info!(
        "Backend: {} (markup policy: {:?})",
        system_config.backend_base_url, system_config.markup_policy
    );

    let addr: SocketAddr = format!("{}:{}", system_config.host, system_config.port).parse()?;
    let app = routes::build_app(AppState::new(config.clone()));

    info!("Starting portal on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
