//! Binary entry point for the reading-log server.

use reading_log_server::{app, config::ServerConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reading_log_server=info,reading_log_core=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let state = AppState::new(config)?;
    tracing::info!(data_file = %state.config.data_file.display(), "record store ready");

    let addr = state.config.bind_addr().to_string();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Reading-log server listening on {}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
