//! Event broadcast
//!
//! The lifecycle service publishes committed [`shared::order::OrderEvent`]s
//! on a broadcast channel; the [`EventRouter`] drains that channel and asks
//! the [`BroadcastHub`] to fan each event out to role feeds and per-order
//! rooms. Delivery is at-most-once: a slow subscriber loses notices, never
//! blocks the writer.

pub mod hub;
pub mod router;

pub use hub::BroadcastHub;
pub use router::EventRouter;
