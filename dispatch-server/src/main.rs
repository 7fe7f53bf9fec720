use dispatch_server::core::{Config, DispatchEngine};
use dispatch_server::services::{MemoryCatalog, MemoryDirectory};
use dispatch_server::utils::logger::init_logger_with_file;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    info!("starting dispatch server");

    // Catalog and directory are in-process placeholders until the external
    // product and identity services are wired in.
    let catalog = Arc::new(MemoryCatalog::new());
    let directory = Arc::new(MemoryDirectory::new());

    let engine = match DispatchEngine::initialize(&config, catalog, directory) {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to initialize engine: {}", e);
            return Err(anyhow::anyhow!(e));
        }
    };

    if let Err(e) = engine.store().ping() {
        error!("order store health check failed: {}", e);
        return Err(anyhow::anyhow!("order store unavailable: {e}"));
    }
    info!("order store healthy, engine ready");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    engine.shutdown();

    Ok(())
}
