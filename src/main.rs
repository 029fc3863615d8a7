use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filestash::config::Config;
use filestash::platform::{PlatformAuth, PlatformClient};
use filestash::storage::StorageManager;
use filestash::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filestash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting filestash...");

    // Load configuration
    let config = Config::load()?;
    tracing::info!(platform = %config.platform.url, "Configuration loaded");

    // Storage backends and auth service
    let client = PlatformClient::from_config(&config.platform);
    let storage = StorageManager::from_config(&config, &client).await?;
    let auth = Arc::new(PlatformAuth::new(client));
    tracing::info!("Storage initialized");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, auth, storage);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
