use std::sync::Arc;

use scrape_core::{DescriptorRegistry, ScraperRegistry};
use sql_exporter::api::{ApiServer, ApiServerConfig, AppState};
use sql_exporter::database::{self, MySqlDatabase};
use sql_exporter::{CollectionConfig, Exporter, ExporterConfig, logging};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ExporterConfig::from_env()?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref())?;

    let mut descriptors = DescriptorRegistry::new(config.namespace.clone());
    let mut scrapers = ScraperRegistry::with_defaults(&mut descriptors)?;
    config.apply_to(&mut scrapers)?;
    tracing::info!(collectors = ?scrapers.names(), "Collectors enabled");

    let pool = database::init_pool(&config.database_url, config.max_connections).await?;

    let shutdown = CancellationToken::new();
    let exporter = Exporter::new(scrapers, descriptors, CollectionConfig::from(&config))?
        .with_shutdown(shutdown.child_token());
    let state = AppState::new(
        Arc::new(exporter),
        Arc::new(MySqlDatabase::new(pool.clone())),
    );
    let server = ApiServer::new(ApiServerConfig::from(&config), state)
        .with_cancel_token(shutdown.clone());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
        }
    });

    server.run().await?;
    pool.close().await;

    tracing::info!("sql-exporter stopped");
    Ok(())
}
