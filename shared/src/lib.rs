//! Shared types for the dispatch platform
//!
//! Common types used across the server and client crates: the order domain
//! model, order lifecycle events, the unified error system, and small
//! utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{Actor, Order, OrderItem, OrderStatus, Product, Role, UserProfile};
pub use order::{EventPayload, Notice, OrderEvent};
