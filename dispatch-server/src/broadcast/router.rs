//! Event router - drains the lifecycle event channel into the hub

use crate::broadcast::hub::BroadcastHub;
use shared::order::OrderEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Bridges the lifecycle service's event channel to the broadcast hub
///
/// Runs as a single task, preserving commit order across all subscribers
/// of the same order.
pub struct EventRouter {
    hub: Arc<BroadcastHub>,
}

impl EventRouter {
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self { hub }
    }

    /// Drain events until the channel closes
    pub async fn run(self, mut source: broadcast::Receiver<OrderEvent>) {
        info!("event router started");
        loop {
            match source.recv().await {
                Ok(event) => {
                    debug!(order_id = %event.order_id, "routing event");
                    self.hub.fan_out(&event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event router lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("event channel closed, router stopping");
                    break;
                }
            }
        }
    }
}
