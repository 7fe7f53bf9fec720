//! Order lifecycle events
//!
//! Events are immutable facts emitted after a write has been durably
//! committed to the order store. Subscribers receive them through the
//! broadcast hub; delivery is at-most-once and best-effort.

pub mod event;

pub use event::{EventPayload, Notice, OrderEvent};
