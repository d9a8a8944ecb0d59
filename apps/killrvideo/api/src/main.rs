use axum_helpers::server::{create_production_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_videos::{CqlCatalog, DataApiCatalog, VideoService, handlers};
use tracing::info;

mod config;
mod openapi;

use config::{Config, StoreConfig};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    info!(
        app = config.app.name,
        version = config.app.version,
        backend = %config.catalog.backend,
        table = %config.catalog.qualified_table(),
        vector_column = %config.catalog.vector_column,
        similarity = %config.catalog.similarity,
        "Configuring catalog store"
    );

    // Neither backend touches the network here; the CQL session is opened on first use
    let api_routes = match config.store.clone() {
        StoreConfig::DataApi(data_api) => {
            let store = DataApiCatalog::new(data_api, &config.catalog)?;
            handlers::router(VideoService::new(store))
        }
        StoreConfig::Cql(cassandra) => {
            let store = CqlCatalog::new(cassandra, config.catalog.clone())?;
            handlers::router(VideoService::new(store))
        }
    };

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<openapi::ApiDoc>(api_routes, &config.server).await?;

    info!(
        "Starting {} with graceful shutdown ({}s timeout)",
        config.app.name, config.server.shutdown_timeout_secs
    );

    create_production_app(router, &config.server, async move {
        // Store handles are owned by the router and close when it is dropped
        info!("Shutting down: releasing catalog store");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("KillrVideo API shutdown complete");
    Ok(())
}
