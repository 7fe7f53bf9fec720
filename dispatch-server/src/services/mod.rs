//! External collaborator interfaces
//!
//! The engine treats the product catalog and the user directory as external
//! services reached through narrow traits. In-memory implementations back
//! tests and single-process deployments.

pub mod catalog;
pub mod directory;

pub use catalog::{CatalogLookup, MemoryCatalog};
pub use directory::{AgentDirectory, MemoryDirectory};
