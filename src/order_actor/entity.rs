//! Entity trait implementation for the Order domain type.
//!
//! This module contains the [`ActorEntity`] trait implementation that enables [`Order`] to be
//! managed by the generic [`ResourceActor`](crate::framework::ResourceActor).
//!
//! The actor is the only writer of its order: it validates a transition, commits it, bumps
//! the order's event sequence and publishes the event before answering. Because publishing
//! happens inside the actor, subscribers see one order's events in sequence order.

use super::actions::{OrderAction, OrderActionResult, TransitionOutcome};
use super::error::OrderError;
use crate::bus::EventBus;
use crate::framework::ActorEntity;
use crate::model::{
    BusEvent, NewOrder, Order, OrderEventKind, OrderId, SubOrder, SubOrderStatus,
};
use crate::transition;
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = NewOrder;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Context = EventBus;
    type Error = OrderError;

    /// Builds the order with every sub-order `pending` and sequence `0`.
    ///
    /// # Validation
    /// - at least one sub-order
    /// - every sub-order has at least one line item
    /// - every line item has a positive quantity
    fn from_create_params(id: OrderId, params: NewOrder) -> Result<Self, OrderError> {
        let NewOrder {
            request,
            sub_order_ids,
            ordered_at,
        } = params;

        if request.sub_orders.is_empty() {
            return Err(OrderError::Validation(
                "an order needs at least one sub-order".to_string(),
            ));
        }
        if sub_order_ids.len() != request.sub_orders.len() {
            return Err(OrderError::Validation(format!(
                "expected {} sub-order ids, got {}",
                request.sub_orders.len(),
                sub_order_ids.len()
            )));
        }

        let mut sub_orders = Vec::with_capacity(request.sub_orders.len());
        for (sub_id, sub) in sub_order_ids.into_iter().zip(request.sub_orders) {
            if sub.items.is_empty() {
                return Err(OrderError::Validation(format!(
                    "sub-order for restaurant {} has no items",
                    sub.restaurant_id
                )));
            }
            if let Some(item) = sub.items.iter().find(|item| item.quantity == 0) {
                return Err(OrderError::Validation(format!(
                    "item {} has zero quantity",
                    item.food_id
                )));
            }
            sub_orders.push(SubOrder {
                id: sub_id,
                order_id: id,
                restaurant_id: sub.restaurant_id,
                items: sub.items,
                status: SubOrderStatus::Pending,
            });
        }

        Ok(Order {
            id,
            customer: request.customer,
            payment_method: request.payment_method,
            delivery_address: request.delivery_address,
            ordered_at,
            sub_orders,
            sequence: 0,
        })
    }

    /// Handles custom actions for the Order entity.
    ///
    /// # Actions
    /// - `Transition`: validates, commits, publishes and returns the outcome
    async fn handle_action(
        &mut self,
        action: OrderAction,
        bus: &EventBus,
    ) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::Transition {
                sub_order_id,
                target,
                expected,
            } => {
                let index = self
                    .sub_orders
                    .iter()
                    .position(|s| s.id == sub_order_id)
                    .ok_or_else(|| {
                        OrderError::NotFound(format!("{} in {}", sub_order_id, self.id))
                    })?;

                let current = self.sub_orders[index].status;
                if let Some(expected) = expected {
                    if expected != current {
                        return Err(OrderError::Conflict {
                            expected,
                            actual: current,
                        });
                    }
                }

                let (updated, mut event) =
                    transition::transition(&self.sub_orders[index], target, self.sequence + 1)?;
                self.sub_orders[index] = updated.clone();
                self.sequence = event.sequence;

                let order_status = self.status();
                if self.is_resolved() {
                    event.kind = OrderEventKind::OrderFullyResolved;
                }
                event.order_status = Some(order_status);

                let report = bus.publish(BusEvent::Order(event.clone()));
                debug!(
                    order_id = %self.id,
                    %sub_order_id,
                    sequence = event.sequence,
                    delivered = report.delivered,
                    "Published transition"
                );

                Ok(OrderActionResult::Transition(TransitionOutcome {
                    sub_order: updated,
                    event,
                    order_status,
                }))
            }
        }
    }
}
