//! Order status transition graph
//!
//! ```text
//! pending -> accepted -> picked_up -> on_the_way -> delivered
//!
//! delivered, cancelled: terminal
//! ```
//!
//! Cancelled exists as a status but no edge leads into it: there is no
//! cancellation policy yet (who may cancel, until which stage, refund
//! handling), so every attempt to reach it fails validation. Adding the
//! policy later means adding edges here, nothing else.

use shared::models::{Actor, Order, OrderStatus, Role};
use shared::{AppError, AppResult, ErrorCode};

/// Statuses reachable from `from` in a single step
pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        OrderStatus::Pending => &[OrderStatus::Accepted],
        OrderStatus::Accepted => &[OrderStatus::PickedUp],
        OrderStatus::PickedUp => &[OrderStatus::OnTheWay],
        OrderStatus::OnTheWay => &[OrderStatus::Delivered],
        OrderStatus::Delivered | OrderStatus::Cancelled => &[],
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Validate that `actor` may move `order` to `to`
///
/// Checks transition legality first, then actor rights: claiming a pending
/// order requires the delivery partner role, every later step additionally
/// requires being the assigned partner.
pub fn validate_transition(order: &Order, actor: &Actor, to: OrderStatus) -> AppResult<()> {
    if !can_transition(order.status, to) {
        return Err(AppError::invalid_transition(order.status.as_str(), to.as_str())
            .with_detail("order_id", order.id.clone()));
    }

    if actor.role != Role::DeliveryPartner {
        return Err(AppError::role_required(
            "Access denied. You do not have the required role.",
        ));
    }

    // Beyond the claim itself, only the assigned partner may advance
    if order.status != OrderStatus::Pending && !order.is_assigned_to(&actor.id) {
        return Err(AppError::new(ErrorCode::NotAssigned)
            .with_detail("order_id", order.id.clone())
            .with_detail("actor_id", actor.id.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::OrderItem;

    fn order_with_status(status: OrderStatus, partner: Option<&str>) -> Order {
        let mut order = Order::new(
            "c1",
            vec![OrderItem {
                product_id: "p-1".to_string(),
                name: "Apple".to_string(),
                unit_price: Decimal::new(250, 2),
                quantity: 1,
            }],
            Decimal::new(250, 2),
        );
        order.status = status;
        order.delivery_partner_id = partner.map(str::to_string);
        order
    }

    #[test]
    fn test_transition_graph() {
        use OrderStatus::*;
        let all = [Pending, Accepted, PickedUp, OnTheWay, Delivered, Cancelled];
        let edges = [
            (Pending, Accepted),
            (Accepted, PickedUp),
            (PickedUp, OnTheWay),
            (OnTheWay, Delivered),
        ];

        for from in all {
            for to in all {
                let expected = edges.contains(&(from, to));
                assert_eq!(
                    can_transition(from, to),
                    expected,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_cancelled_unreachable() {
        use OrderStatus::*;
        for from in [Pending, Accepted, PickedUp, OnTheWay, Delivered, Cancelled] {
            assert!(!can_transition(from, Cancelled));
        }
    }

    #[test]
    fn test_validate_assigned_partner_advances() {
        let order = order_with_status(OrderStatus::Accepted, Some("p1"));
        let actor = Actor::delivery_partner("p1");
        assert!(validate_transition(&order, &actor, OrderStatus::PickedUp).is_ok());
    }

    #[test]
    fn test_validate_other_partner_rejected() {
        let order = order_with_status(OrderStatus::Accepted, Some("p1"));
        let actor = Actor::delivery_partner("p2");
        let err = validate_transition(&order, &actor, OrderStatus::PickedUp).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAssigned);
    }

    #[test]
    fn test_validate_illegal_transition_reported_first() {
        // Skipping a stage fails as an invalid transition even for a
        // non-partner actor
        let order = order_with_status(OrderStatus::Accepted, Some("p1"));
        let actor = Actor::customer("c1");
        let err = validate_transition(&order, &actor, OrderStatus::Delivered).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_validate_terminal_frozen() {
        let order = order_with_status(OrderStatus::Delivered, Some("p1"));
        let actor = Actor::delivery_partner("p1");
        for to in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::PickedUp,
            OrderStatus::OnTheWay,
            OrderStatus::Cancelled,
        ] {
            let err = validate_transition(&order, &actor, to).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidTransition);
        }
    }

    #[test]
    fn test_validate_customer_cannot_claim() {
        let order = order_with_status(OrderStatus::Pending, None);
        let actor = Actor::customer("c1");
        let err = validate_transition(&order, &actor, OrderStatus::Accepted).unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);
    }
}
