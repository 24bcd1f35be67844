/**
 * ChatHub Server Entry Point
 *
 * Loads `.env` and configuration, initializes tracing and serves the
 * router until Ctrl-C, then cancels every open stream.
 */

use chathub::backend::server::create_app;
use chathub::shared::HubConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = HubConfig::load()?;
    tracing::info!("[Server] Configuration loaded: {:?}", config.auth_mode);

    let port = config.port;
    let (app, hub) = create_app(config)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Server] Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[Server] Failed to listen for Ctrl-C: {}", e);
            }
            hub.shutdown();
        })
        .await?;

    tracing::info!("[Server] Stopped");
    Ok(())
}
