//! Order entity - the central record of the dispatch domain
//!
//! # Invariants
//!
//! - `delivery_partner_id` is unset iff `status == Pending`
//! - `items` and `total_price` are write-once at creation
//! - `status` only advances along the legal transition graph
//! - `version` increases by exactly one per committed write

use crate::util;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    PickedUp,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses freeze the order permanently
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::PickedUp => "picked_up",
            Self::OnTheWay => "on_the_way",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line of an order, with name and unit price snapshotted from the
/// catalog at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Persisted order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Opaque unique identifier, assigned at creation
    pub id: String,
    /// Identity of the placing customer; immutable
    pub customer_id: String,
    /// Assigned delivery partner; set exactly once, by the claim arbiter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_partner_id: Option<String>,
    /// Frozen cart contents
    pub items: Vec<OrderItem>,
    /// Snapshot price computed once at creation, never recomputed
    pub total_price: Decimal,
    pub status: OrderStatus,
    /// Optimistic concurrency version, bumped on every committed write
    pub version: u64,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

impl Order {
    /// Create a new pending order. The caller is responsible for having
    /// computed `total_price` from catalog prices at this moment.
    pub fn new(customer_id: impl Into<String>, items: Vec<OrderItem>, total_price: Decimal) -> Self {
        let now = util::now_millis();
        Self {
            id: util::new_id(),
            customer_id: customer_id.into(),
            delivery_partner_id: None,
            items,
            total_price,
            status: OrderStatus::Pending,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given partner is the assignee of this order
    pub fn is_assigned_to(&self, partner_id: &str) -> bool {
        self.delivery_partner_id.as_deref() == Some(partner_id)
    }

    /// Check the assignment invariant: partner unset iff status is pending
    pub fn assignment_consistent(&self) -> bool {
        self.delivery_partner_id.is_none() == (self.status == OrderStatus::Pending)
    }
}
