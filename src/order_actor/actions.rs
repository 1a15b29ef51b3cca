//! Custom actions for the Order actor.
//!
//! An order has exactly one mutation: moving one of its sub-orders along the status graph.
//! It is handled by [`ActorEntity::handle_action`](crate::framework::ActorEntity::handle_action).
//!
//! See [`impl ActorEntity for Order`](crate::model::Order#impl-ActorEntity-for-Order) for the
//! implementation details.

use crate::model::{OrderEvent, OrderStatus, SubOrder, SubOrderId, SubOrderStatus};

/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves one sub-order to `target`.
    ///
    /// # Errors
    /// - `NotFound` if the sub-order does not belong to this order
    /// - `Conflict` if `expected` is set and differs from the committed status
    /// - `InvalidTransition` if the status graph forbids the move
    Transition {
        sub_order_id: SubOrderId,
        target: SubOrderStatus,
        expected: Option<SubOrderStatus>,
    },
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    Transition(TransitionOutcome),
}

/// What an accepted transition committed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub sub_order: SubOrder,
    /// The event already published on the bus.
    pub event: OrderEvent,
    /// Derived status of the whole order after the change.
    pub order_status: OrderStatus,
}
