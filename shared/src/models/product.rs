//! Product reference resolved through the catalog collaborator
//!
//! The core snapshots name/price at order-creation time and never re-reads
//! the catalog for that order afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product as resolved by the catalog at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Current catalog price; frozen into the order at creation
    pub price: Decimal,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}
