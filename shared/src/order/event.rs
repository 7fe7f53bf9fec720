//! Order events - immutable facts recorded after a committed write

use crate::models::Order;
use crate::util;
use serde::{Deserialize, Serialize};

/// Committed lifecycle event, as published by the lifecycle service
///
/// Events for the same order are published in the exact order the
/// corresponding writes were committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds), set at emission
    pub timestamp: i64,
    /// What happened
    pub payload: EventPayload,
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// A new pending order was created
    OrderCreated { order: Order },
    /// A delivery partner won the claim on a pending order
    OrderAccepted { order: Order },
    /// The order advanced to a new status
    OrderStatusChanged { order: Order },
}

impl OrderEvent {
    fn new(order_id: String, payload: EventPayload) -> Self {
        Self {
            event_id: util::new_id(),
            order_id,
            timestamp: util::now_millis(),
            payload,
        }
    }

    pub fn created(order: Order) -> Self {
        Self::new(order.id.clone(), EventPayload::OrderCreated { order })
    }

    pub fn accepted(order: Order) -> Self {
        Self::new(order.id.clone(), EventPayload::OrderAccepted { order })
    }

    pub fn status_changed(order: Order) -> Self {
        Self::new(order.id.clone(), EventPayload::OrderStatusChanged { order })
    }

    /// The order snapshot carried by this event
    pub fn order(&self) -> &Order {
        match &self.payload {
            EventPayload::OrderCreated { order }
            | EventPayload::OrderAccepted { order }
            | EventPayload::OrderStatusChanged { order } => order,
        }
    }
}

/// Wire-level notification delivered to a single subscriber
///
/// `order.accepted` deliberately carries only the order id: role-broadcast
/// listeners just need to drop the order from their unassigned view. Room
/// subscribers get the full snapshot via `order.status_changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notice {
    #[serde(rename = "order.created")]
    OrderCreated { order: Order },
    #[serde(rename = "order.accepted")]
    OrderAccepted { order_id: String },
    #[serde(rename = "order.status_changed")]
    OrderStatusChanged { order: Order },
}

impl Notice {
    pub fn order_id(&self) -> &str {
        match self {
            Self::OrderCreated { order } | Self::OrderStatusChanged { order } => &order.id,
            Self::OrderAccepted { order_id } => order_id,
        }
    }
}
