//! Engine assembly
//!
//! Wires the store, lifecycle service, broadcast hub and event router
//! together and owns their shutdown.

use crate::broadcast::{BroadcastHub, EventRouter};
use crate::core::config::Config;
use crate::orders::{OrderService, OrderStore};
use crate::services::{AgentDirectory, CatalogLookup};
use shared::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Assembled order lifecycle engine
pub struct DispatchEngine {
    service: Arc<OrderService>,
    hub: Arc<BroadcastHub>,
    store: OrderStore,
    shutdown_token: CancellationToken,
}

impl DispatchEngine {
    /// Open storage, start the event router and assemble the service
    pub fn initialize(
        config: &Config,
        catalog: Arc<dyn CatalogLookup>,
        directory: Arc<dyn AgentDirectory>,
    ) -> AppResult<Self> {
        if !config.work_dir.exists() {
            std::fs::create_dir_all(&config.work_dir).map_err(|e| {
                error!("Failed to create work directory: {}", e);
                AppError::internal(format!("Failed to create work directory: {}", e))
            })?;
        }

        let db_path = config.db_path();
        info!(path = %db_path.display(), "opening order store");
        let store = OrderStore::open(&db_path)?;

        let (event_tx, event_rx) = broadcast::channel(config.event_channel_capacity);
        let hub = Arc::new(BroadcastHub::new(config.subscriber_buffer));
        let service = Arc::new(OrderService::new(
            store.clone(),
            catalog,
            directory,
            event_tx,
        ));

        let shutdown_token = CancellationToken::new();
        let router = EventRouter::new(hub.clone());
        let token = shutdown_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("event router shutdown requested");
                }
                _ = router.run(event_rx) => {}
            }
        });

        Ok(Self {
            service,
            hub,
            store,
            shutdown_token,
        })
    }

    pub fn service(&self) -> Arc<OrderService> {
        self.service.clone()
    }

    pub fn hub(&self) -> Arc<BroadcastHub> {
        self.hub.clone()
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Stop the event router; pending notices already queued per
    /// subscriber stay deliverable
    pub fn shutdown(&self) {
        info!("engine shutting down");
        self.shutdown_token.cancel();
    }
}
