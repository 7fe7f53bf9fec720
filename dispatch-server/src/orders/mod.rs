//! Order lifecycle engine
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | `store` | redb-backed persistence with conditional updates |
//! | `state` | status transition graph and per-transition actor checks |
//! | `claim` | race-free assignment of pending orders to delivery partners |
//! | `service` | lifecycle operations, query surface and event emission |

pub mod claim;
pub mod service;
pub mod state;
pub mod store;

pub use claim::ClaimArbiter;
pub use service::{CreateOrderItem, OrderService, SystemSnapshot};
pub use store::{OrderStore, StoreError, StoreResult};
