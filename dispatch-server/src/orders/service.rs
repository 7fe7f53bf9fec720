//! Order lifecycle service
//!
//! Single entry point for every order operation. Each mutation follows the
//! same shape: role check, validation against the persisted record,
//! conditional commit, then event emission. Events go out only after the
//! commit succeeded, so subscribers never observe a state the store does
//! not hold.
//!
//! Commit and emission happen under one guard: without it a second writer
//! could commit and send between another writer's commit and send, putting
//! notices for the same order out of commit order.

use crate::auth::require_role;
use crate::orders::claim::ClaimArbiter;
use crate::orders::state;
use crate::orders::store::{OrderStore, StoreError};
use crate::services::{AgentDirectory, CatalogLookup};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{Actor, Order, OrderItem, OrderStatus, Role, UserProfile};
use shared::order::OrderEvent;
use shared::{AppError, AppResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// One cart line in a create request, prices deliberately absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Admin view over the whole system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub orders: Vec<Order>,
    pub delivery_partners: Vec<UserProfile>,
}

/// Order lifecycle operations
pub struct OrderService {
    store: OrderStore,
    catalog: Arc<dyn CatalogLookup>,
    directory: Arc<dyn AgentDirectory>,
    arbiter: ClaimArbiter,
    event_tx: broadcast::Sender<OrderEvent>,
    emit_lock: Mutex<()>,
}

impl OrderService {
    pub fn new(
        store: OrderStore,
        catalog: Arc<dyn CatalogLookup>,
        directory: Arc<dyn AgentDirectory>,
        event_tx: broadcast::Sender<OrderEvent>,
    ) -> Self {
        let arbiter = ClaimArbiter::new(store.clone());
        Self {
            store,
            catalog,
            directory,
            arbiter,
            event_tx,
            emit_lock: Mutex::new(()),
        }
    }

    /// Serialize commit and emission so notices leave in commit order
    fn commit_guard(&self) -> MutexGuard<'_, ()> {
        self.emit_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ========== Lifecycle Operations ==========

    /// Create an order from the customer's cart
    ///
    /// Every product is resolved against the catalog before anything is
    /// written; an unknown product aborts the whole request. Resolved
    /// prices are frozen into the order and never re-read.
    pub async fn create_order(
        &self,
        actor: &Actor,
        items: Vec<CreateOrderItem>,
    ) -> AppResult<Order> {
        require_role(actor, &[Role::Customer])?;

        if items.is_empty() {
            return Err(AppError::invalid_request("Your cart is empty."));
        }

        let mut resolved = Vec::with_capacity(items.len());
        let mut total = Decimal::ZERO;
        for item in &items {
            if item.quantity == 0 {
                return Err(AppError::invalid_request("Item quantity must be at least 1.")
                    .with_detail("product_id", item.product_id.clone()));
            }
            let product = self.catalog.product(&item.product_id).await?;
            let line_total = product.price * Decimal::from(item.quantity);
            total += line_total;
            resolved.push(OrderItem {
                product_id: product.id,
                name: product.name,
                unit_price: product.price,
                quantity: item.quantity,
            });
        }

        let order = Order::new(&actor.id, resolved, total);
        {
            let _commit = self.commit_guard();
            self.store.insert(&order)?;
            self.emit(OrderEvent::created(order.clone()));
        }

        info!(
            order_id = %order.id,
            customer_id = %actor.id,
            total = %order.total_price,
            "order created"
        );
        Ok(order)
    }

    /// Claim a pending order for the calling delivery partner
    pub fn accept_order(&self, actor: &Actor, order_id: &str) -> AppResult<Order> {
        require_role(actor, &[Role::DeliveryPartner])?;

        let _commit = self.commit_guard();
        let order = self.arbiter.claim(order_id, &actor.id)?;
        self.emit(OrderEvent::accepted(order.clone()));
        Ok(order)
    }

    /// Advance an accepted order along the delivery path
    ///
    /// Accepting goes through [`Self::accept_order`]; asking for the
    /// accepted status here is rejected outright so the assignment can
    /// never be skipped.
    pub fn update_status(
        &self,
        actor: &Actor,
        order_id: &str,
        new_status: OrderStatus,
    ) -> AppResult<Order> {
        require_role(actor, &[Role::DeliveryPartner])?;

        if new_status == OrderStatus::Accepted {
            return Err(AppError::invalid_request(
                "Orders are accepted through the claim operation.",
            ));
        }

        let current = self
            .store
            .get(order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        state::validate_transition(&current, actor, new_status)?;

        let order = {
            let _commit = self.commit_guard();
            let result = self.store.update_conditional(
                order_id,
                current.status,
                Some(current.version),
                |order| {
                    order.status = new_status;
                },
            );

            let order = match result {
                Ok(order) => order,
                Err(StoreError::PreconditionFailed { order_id, .. }) => {
                    warn!(%order_id, "status update lost to concurrent writer");
                    return Err(AppError::concurrent_modification(order_id));
                }
                Err(other) => return Err(other.into()),
            };
            self.emit(OrderEvent::status_changed(order.clone()));
            order
        };

        info!(order_id = %order.id, status = %order.status, "order status updated");
        Ok(order)
    }

    // ========== Queries ==========

    /// Fetch a single order
    pub fn get_order(&self, order_id: &str) -> AppResult<Order> {
        self.store
            .get(order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))
    }

    /// Pending orders open for claiming, oldest first
    pub fn list_unassigned(&self, actor: &Actor) -> AppResult<Vec<Order>> {
        require_role(actor, &[Role::DeliveryPartner])?;
        Ok(self.store.list_by_status(OrderStatus::Pending)?)
    }

    /// Orders belonging to the calling actor, newest first
    ///
    /// Customers see the orders they placed, delivery partners the orders
    /// assigned to them. Any other role gets an empty list, not an error.
    pub fn list_mine(&self, actor: &Actor) -> AppResult<Vec<Order>> {
        let orders = match actor.role {
            Role::Customer => self.store.list_by_customer(&actor.id)?,
            Role::DeliveryPartner => self.store.list_by_partner(&actor.id)?,
            _ => Vec::new(),
        };
        Ok(orders)
    }

    /// Admin overview: every order plus the delivery partner roster
    pub fn system_snapshot(&self, actor: &Actor) -> AppResult<SystemSnapshot> {
        require_role(actor, &[Role::Admin])?;
        Ok(SystemSnapshot {
            orders: self.store.list_all()?,
            delivery_partners: self.directory.delivery_partners(),
        })
    }

    /// Emit a lifecycle event; no subscribers is not an error
    fn emit(&self, event: OrderEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryCatalog, MemoryDirectory};
    use shared::models::Product;
    use shared::order::EventPayload;
    use shared::ErrorCode;

    fn service() -> (OrderService, broadcast::Receiver<OrderEvent>) {
        let store = OrderStore::open_in_memory().unwrap();

        let catalog = MemoryCatalog::new();
        catalog.insert(Product::new("p-apple", "Apple", Decimal::new(250, 2)));
        catalog.insert(Product::new("p-bread", "Bread", Decimal::new(450, 2)));

        let directory = MemoryDirectory::new();
        directory.insert(UserProfile {
            id: "p1".to_string(),
            username: "rider-one".to_string(),
            email: None,
            role: Role::DeliveryPartner,
        });

        let (event_tx, event_rx) = broadcast::channel(64);
        let service = OrderService::new(store, Arc::new(catalog), Arc::new(directory), event_tx);
        (service, event_rx)
    }

    fn cart() -> Vec<CreateOrderItem> {
        vec![
            CreateOrderItem {
                product_id: "p-apple".to_string(),
                quantity: 2,
            },
            CreateOrderItem {
                product_id: "p-bread".to_string(),
                quantity: 1,
            },
        ]
    }

    #[tokio::test]
    async fn test_create_order_freezes_prices() {
        let (service, mut events) = service();
        let customer = Actor::customer("c1");

        let order = service.create_order(&customer, cart()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, Decimal::new(950, 2));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].unit_price, Decimal::new(250, 2));

        let event = events.try_recv().unwrap();
        assert!(matches!(event.payload, EventPayload::OrderCreated { .. }));
    }

    #[tokio::test]
    async fn test_create_order_empty_cart() {
        let (service, _events) = service();
        let err = service
            .create_order(&Actor::customer("c1"), vec![])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.message, "Your cart is empty.");
    }

    #[tokio::test]
    async fn test_create_order_zero_quantity() {
        let (service, _events) = service();
        let err = service
            .create_order(
                &Actor::customer("c1"),
                vec![CreateOrderItem {
                    product_id: "p-apple".to_string(),
                    quantity: 0,
                }],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_create_order_unknown_product_writes_nothing() {
        let (service, mut events) = service();
        let items = vec![
            CreateOrderItem {
                product_id: "p-apple".to_string(),
                quantity: 1,
            },
            CreateOrderItem {
                product_id: "p-ghost".to_string(),
                quantity: 1,
            },
        ];

        let err = service
            .create_order(&Actor::customer("c1"), items)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);

        assert!(service.list_mine(&Actor::customer("c1")).unwrap().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_create_order_requires_customer() {
        let (service, _events) = service();
        let err = service
            .create_order(&Actor::delivery_partner("p1"), cart())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
    }

    #[tokio::test]
    async fn test_price_change_does_not_touch_existing_order() {
        let store = OrderStore::open_in_memory().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert(Product::new("p-apple", "Apple", Decimal::new(250, 2)));
        let (event_tx, _rx) = broadcast::channel(64);
        let service = OrderService::new(
            store,
            catalog.clone(),
            Arc::new(MemoryDirectory::new()),
            event_tx,
        );

        let order = service
            .create_order(
                &Actor::customer("c1"),
                vec![CreateOrderItem {
                    product_id: "p-apple".to_string(),
                    quantity: 2,
                }],
            )
            .await
            .unwrap();
        assert_eq!(order.total_price, Decimal::new(500, 2));

        catalog.set_price("p-apple", Decimal::new(900, 2));

        let reloaded = service.get_order(&order.id).unwrap();
        assert_eq!(reloaded.total_price, Decimal::new(500, 2));
        assert_eq!(reloaded.items[0].unit_price, Decimal::new(250, 2));
    }

    #[tokio::test]
    async fn test_accept_order_and_lost_race() {
        let (service, mut events) = service();
        let order = service
            .create_order(&Actor::customer("c1"), cart())
            .await
            .unwrap();
        let _ = events.try_recv();

        let accepted = service
            .accept_order(&Actor::delivery_partner("p1"), &order.id)
            .unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);
        assert_eq!(accepted.delivery_partner_id.as_deref(), Some("p1"));

        let event = events.try_recv().unwrap();
        assert!(matches!(event.payload, EventPayload::OrderAccepted { .. }));

        let err = service
            .accept_order(&Actor::delivery_partner("p2"), &order.id)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderUnavailable);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_accept_requires_delivery_partner() {
        let (service, _events) = service();
        let order = service
            .create_order(&Actor::customer("c1"), cart())
            .await
            .unwrap();

        let err = service
            .accept_order(&Actor::customer("c1"), &order.id)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
    }

    #[tokio::test]
    async fn test_full_delivery_path() {
        let (service, mut events) = service();
        let partner = Actor::delivery_partner("p1");

        let order = service
            .create_order(&Actor::customer("c1"), cart())
            .await
            .unwrap();
        service.accept_order(&partner, &order.id).unwrap();

        for status in [
            OrderStatus::PickedUp,
            OrderStatus::OnTheWay,
            OrderStatus::Delivered,
        ] {
            let updated = service.update_status(&partner, &order.id, status).unwrap();
            assert_eq!(updated.status, status);
        }

        let payloads: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(payloads.len(), 5);
        assert!(matches!(
            payloads.last().unwrap().payload,
            EventPayload::OrderStatusChanged { .. }
        ));

        // Delivered is terminal
        let err = service
            .update_status(&partner, &order.id, OrderStatus::PickedUp)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_notices_follow_commit_order_under_contention() {
        // A claim and the winner's first status update race; the accepted
        // notice must never arrive after the picked_up notice.
        for _ in 0..25 {
            let (service, mut events) = service();
            let service = Arc::new(service);

            let order = service
                .create_order(&Actor::customer("c1"), cart())
                .await
                .unwrap();

            let accept = {
                let service = service.clone();
                let order_id = order.id.clone();
                tokio::spawn(async move {
                    service
                        .accept_order(&Actor::delivery_partner("p1"), &order_id)
                        .unwrap();
                })
            };
            let advance = {
                let service = service.clone();
                let order_id = order.id.clone();
                tokio::spawn(async move {
                    let partner = Actor::delivery_partner("p1");
                    loop {
                        match service.update_status(&partner, &order_id, OrderStatus::PickedUp) {
                            Ok(_) => break,
                            Err(_) => tokio::task::yield_now().await,
                        }
                    }
                })
            };
            accept.await.unwrap();
            advance.await.unwrap();

            let mut last_version = None;
            while let Ok(event) = events.try_recv() {
                let version = event.order().version;
                if let Some(prev) = last_version {
                    assert!(
                        version > prev,
                        "notice for version {version} arrived after {prev}"
                    );
                }
                last_version = Some(version);
            }
            assert_eq!(last_version, Some(2));
        }
    }

    #[tokio::test]
    async fn test_update_status_rejects_accepted_target() {
        let (service, _events) = service();
        let order = service
            .create_order(&Actor::customer("c1"), cart())
            .await
            .unwrap();

        let err = service
            .update_status(&Actor::delivery_partner("p1"), &order.id, OrderStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_update_status_only_assigned_partner() {
        let (service, _events) = service();
        let order = service
            .create_order(&Actor::customer("c1"), cart())
            .await
            .unwrap();
        service
            .accept_order(&Actor::delivery_partner("p1"), &order.id)
            .unwrap();

        let err = service
            .update_status(&Actor::delivery_partner("p2"), &order.id, OrderStatus::PickedUp)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAssigned);
    }

    #[tokio::test]
    async fn test_list_queries_by_role() {
        let (service, _events) = service();
        let customer = Actor::customer("c1");
        let partner = Actor::delivery_partner("p1");

        let o1 = service.create_order(&customer, cart()).await.unwrap();
        let _o2 = service.create_order(&customer, cart()).await.unwrap();
        service.accept_order(&partner, &o1.id).unwrap();

        assert_eq!(service.list_unassigned(&partner).unwrap().len(), 1);
        assert_eq!(service.list_mine(&customer).unwrap().len(), 2);

        let mine = service.list_mine(&partner).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, o1.id);

        assert!(service.list_mine(&Actor::admin("a1")).unwrap().is_empty());

        let err = service.list_unassigned(&customer).unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
    }

    #[tokio::test]
    async fn test_system_snapshot_admin_only() {
        let (service, _events) = service();
        service
            .create_order(&Actor::customer("c1"), cart())
            .await
            .unwrap();

        let snapshot = service.system_snapshot(&Actor::admin("a1")).unwrap();
        assert_eq!(snapshot.orders.len(), 1);
        assert_eq!(snapshot.delivery_partners.len(), 1);
        assert_eq!(snapshot.delivery_partners[0].id, "p1");

        let err = service
            .system_snapshot(&Actor::customer("c1"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
    }

    #[tokio::test]
    async fn test_get_order_not_found() {
        let (service, _events) = service();
        let err = service.get_order("missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }
}
