//! Claim arbitration
//!
//! Many delivery partners race to accept the same pending order; exactly
//! one wins. The claim is a single conditional update on `status ==
//! pending` that writes the winner's id and flips the status to accepted
//! in one committed transaction. Every loser gets a final conflict answer
//! derived from the commit outcome, never from a pre-read.

use crate::orders::store::{OrderStore, StoreError};
use shared::models::{Order, OrderStatus};
use shared::{AppError, AppResult};
use tracing::{debug, info};

/// Arbitrates concurrent claims on pending orders
#[derive(Clone)]
pub struct ClaimArbiter {
    store: OrderStore,
}

impl ClaimArbiter {
    pub fn new(store: OrderStore) -> Self {
        Self { store }
    }

    /// Attempt to claim a pending order for `partner_id`
    ///
    /// Returns the accepted post-image on success. A lost race returns
    /// [`shared::ErrorCode::OrderUnavailable`]; the outcome is final and
    /// must not be retried against the same order.
    pub fn claim(&self, order_id: &str, partner_id: &str) -> AppResult<Order> {
        let result = self
            .store
            .update_conditional(order_id, OrderStatus::Pending, None, |order| {
                order.delivery_partner_id = Some(partner_id.to_string());
                order.status = OrderStatus::Accepted;
            });

        match result {
            Ok(order) => {
                debug_assert!(order.assignment_consistent());
                info!(order_id = %order.id, partner_id = %partner_id, "order claimed");
                Ok(order)
            }
            Err(StoreError::OrderNotFound(id)) => Err(AppError::order_not_found(id)),
            Err(StoreError::PreconditionFailed { order_id, actual, .. }) => {
                debug!(%order_id, status = %actual, "claim lost");
                Err(AppError::claim_conflict(order_id))
            }
            Err(other) => Err(other.into()),
        }
    }
}
