//! Dispatch Server - order lifecycle and claim arbitration engine
//!
//! # Architecture Overview
//!
//! This crate coordinates delivery-order assignment between customers and
//! delivery partners, and pushes order-state changes to live subscribers:
//!
//! - **Order store** (`orders::store`): embedded redb persistence with a
//!   single atomic conditional-update primitive
//! - **State machine** (`orders::state`): legal status transitions
//! - **Claim arbiter** (`orders::claim`): at-most-one winner per pending order
//! - **Broadcast hub** (`broadcast`): role feeds and per-order rooms
//! - **Lifecycle service** (`orders::service`): orchestration facade
//!
//! # Module Structure
//!
//! ```text
//! dispatch-server/src/
//! ├── core/          # Config, engine assembly
//! ├── auth/          # Role capability checks
//! ├── services/      # Catalog and directory collaborators
//! ├── orders/        # Store, state machine, claim arbiter, service
//! ├── broadcast/     # Topic registry, hub, event router
//! └── utils/         # Logging
//! ```
//!
//! # Write Path
//!
//! ```text
//! request → OrderService → validator → conditional write (redb)
//!                                           │ committed
//!                                           ▼
//!                     caller ◄── snapshot   broadcast channel
//!                                           ▼
//!                                      EventRouter → BroadcastHub → subscribers
//! ```
//!
//! Broadcast delivery is asynchronous and best-effort; it can never delay or
//! fail a commit.

pub mod auth;
pub mod broadcast;
pub mod core;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export public types
pub use broadcast::{BroadcastHub, EventRouter};
pub use core::{Config, DispatchEngine};
pub use orders::{ClaimArbiter, OrderService, OrderStore};
pub use services::{AgentDirectory, CatalogLookup, MemoryCatalog, MemoryDirectory};

// Re-export unified error types from shared
pub use shared::{AppError, AppResult, ErrorCode};
