//! Catalog Lookup - resolves product id to current name and price
//!
//! The lifecycle service consults the catalog exactly once per order, at
//! creation time, and freezes the resolved prices into the order. Later
//! catalog changes never touch existing orders.

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::models::Product;
use shared::{AppError, AppResult, ErrorCode};

/// Collaborator interface to the product catalog
///
/// Implementations over a network must map transport failures to
/// [`ErrorCode::ServiceUnavailable`] so the caller can abort cleanly
/// without partial writes.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Resolve a product id to its current catalog entry
    async fn product(&self, product_id: &str) -> AppResult<Product>;
}

/// In-memory catalog, used in tests and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: DashMap<String, Product>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product
    pub fn insert(&self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Change the price of an existing product; returns false if unknown
    pub fn set_price(&self, product_id: &str, price: Decimal) -> bool {
        match self.products.get_mut(product_id) {
            Some(mut entry) => {
                entry.price = price;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CatalogLookup for MemoryCatalog {
    async fn product(&self, product_id: &str) -> AppResult<Product> {
        self.products
            .get(product_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product with ID {} not found.", product_id),
                )
                .with_detail("product_id", product_id)
            })
    }
}
