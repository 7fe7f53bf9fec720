//! Broadcast hub - subscriber registry and fan-out
//!
//! Two scopes:
//! - role feed: every connected delivery partner and admin hears about new
//!   and claimed orders
//! - order rooms: any subscriber may join the room of a specific order to
//!   follow its status
//!
//! Each subscriber owns a bounded mpsc channel. Fan-out uses `try_send`:
//! a full buffer drops the notice for that subscriber only, a closed
//! channel gets the subscriber pruned. Notices to one subscriber arrive in
//! publish order because they all flow through its single channel.

use dashmap::DashMap;
use shared::models::Role;
use shared::order::{EventPayload, Notice, OrderEvent};
use shared::{AppError, AppResult};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct SubscriberEntry {
    role: Role,
    tx: mpsc::Sender<Notice>,
}

/// Connected-subscriber registry with role feeds and per-order rooms
pub struct BroadcastHub {
    buffer: usize,
    conns: DashMap<String, SubscriberEntry>,
    rooms: DashMap<String, HashSet<String>>,
}

impl BroadcastHub {
    /// `buffer` is the per-subscriber notice queue length
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer,
            conns: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    // ========== Subscriber Management ==========

    /// Register a connection and get its notice stream
    pub fn subscribe(&self, conn_id: impl Into<String>, role: Role) -> mpsc::Receiver<Notice> {
        let conn_id = conn_id.into();
        let (tx, rx) = mpsc::channel(self.buffer);
        self.conns.insert(conn_id.clone(), SubscriberEntry { role, tx });
        debug!(%conn_id, role = %role, "subscriber connected");
        rx
    }

    /// Drop a connection and its room memberships
    pub fn unsubscribe(&self, conn_id: &str) {
        self.conns.remove(conn_id);
        self.rooms.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
        debug!(%conn_id, "subscriber disconnected");
    }

    /// Join the room of one order; the connection must be subscribed
    pub fn join_room(&self, conn_id: &str, order_id: &str) -> AppResult<()> {
        if !self.conns.contains_key(conn_id) {
            return Err(AppError::not_found("Connection").with_detail("conn_id", conn_id));
        }
        self.rooms
            .entry(order_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
        debug!(%conn_id, %order_id, "joined order room");
        Ok(())
    }

    /// Leave one order room
    pub fn leave_room(&self, conn_id: &str, order_id: &str) {
        if let Some(mut members) = self.rooms.get_mut(order_id) {
            members.remove(conn_id);
        }
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }

    // ========== Fan-out ==========

    /// Translate one committed event into notices and deliver them
    pub fn fan_out(&self, event: &OrderEvent) {
        match &event.payload {
            EventPayload::OrderCreated { order } => {
                self.send_to_roles(
                    &[Role::DeliveryPartner, Role::Admin],
                    Notice::OrderCreated {
                        order: order.clone(),
                    },
                );
            }
            EventPayload::OrderAccepted { order } => {
                // Role feed only needs the id; the room gets the snapshot
                self.send_to_roles(
                    &[Role::DeliveryPartner, Role::Admin],
                    Notice::OrderAccepted {
                        order_id: order.id.clone(),
                    },
                );
                self.send_to_room(
                    &order.id,
                    Notice::OrderStatusChanged {
                        order: order.clone(),
                    },
                );
            }
            EventPayload::OrderStatusChanged { order } => {
                self.send_to_room(
                    &order.id,
                    Notice::OrderStatusChanged {
                        order: order.clone(),
                    },
                );
            }
        }
    }

    fn send_to_roles(&self, roles: &[Role], notice: Notice) {
        let mut closed = Vec::new();
        for entry in self.conns.iter() {
            if roles.contains(&entry.role) {
                self.deliver(entry.key(), &entry.tx, notice.clone(), &mut closed);
            }
        }
        self.prune(closed);
    }

    fn send_to_room(&self, order_id: &str, notice: Notice) {
        let members: Vec<String> = match self.rooms.get(order_id) {
            Some(members) => members.iter().cloned().collect(),
            None => return,
        };

        let mut closed = Vec::new();
        for conn_id in members {
            if let Some(entry) = self.conns.get(&conn_id) {
                self.deliver(&conn_id, &entry.tx, notice.clone(), &mut closed);
            }
        }
        self.prune(closed);
    }

    fn deliver(
        &self,
        conn_id: &str,
        tx: &mpsc::Sender<Notice>,
        notice: Notice,
        closed: &mut Vec<String>,
    ) {
        match tx.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(notice)) => {
                warn!(%conn_id, order_id = %notice.order_id(), "subscriber buffer full, notice dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                closed.push(conn_id.to_string());
            }
        }
    }

    // Pruning happens outside the iteration holding DashMap shard locks
    fn prune(&self, closed: Vec<String>) {
        for conn_id in closed {
            self.unsubscribe(&conn_id);
        }
    }
}
