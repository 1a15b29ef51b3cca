//! Messages carried by the [`EventBus`](crate::bus::EventBus).

use crate::model::{
    Notification, NotificationId, OrderId, OrderStatus, RestaurantId, SubOrderId, SubOrderStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    NewOrder,
    SubOrderStatusChanged,
    /// A status change that left every sub-order terminal.
    OrderFullyResolved,
}

/// Something that happened to an order.
///
/// `sequence` is scoped to the order: `0` for `new_order`, then `1, 2, ...` for each accepted
/// transition. Consumers use it to drop duplicates and detect gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order_id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_order_id: Option<SubOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<SubOrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<SubOrderStatus>,
    /// Derived order status right after the change. Set by the owning order actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    /// Sub-orders of a freshly placed order, in creation order. Empty for other kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_order_ids: Vec<SubOrderId>,
    pub sequence: u64,
    pub occurred_at: DateTime<Utc>,
}

impl OrderEvent {
    /// The `new_order` event, sequence `0`.
    pub fn new_order(order_id: OrderId, sub_order_ids: Vec<SubOrderId>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind: OrderEventKind::NewOrder,
            order_id,
            sub_order_id: None,
            restaurant_id: None,
            old_status: None,
            new_status: None,
            order_status: Some(OrderStatus::Pending),
            sub_order_ids,
            sequence: 0,
            occurred_at,
        }
    }
}

/// Changes to the notification inbox.
///
/// Every variant carries the inbox `revision` after the change and the resulting
/// `unread_count`, so a dashboard can update its badge without another read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NotificationEvent {
    Created {
        notification: Notification,
        revision: u64,
        unread_count: usize,
    },
    Read {
        id: NotificationId,
        revision: u64,
        unread_count: usize,
    },
    AllRead {
        marked: usize,
        revision: u64,
        unread_count: usize,
    },
}

impl NotificationEvent {
    pub fn revision(&self) -> u64 {
        match self {
            NotificationEvent::Created { revision, .. }
            | NotificationEvent::Read { revision, .. }
            | NotificationEvent::AllRead { revision, .. } => *revision,
        }
    }

    pub fn unread_count(&self) -> usize {
        match self {
            NotificationEvent::Created { unread_count, .. }
            | NotificationEvent::Read { unread_count, .. }
            | NotificationEvent::AllRead { unread_count, .. } => *unread_count,
        }
    }
}

/// Everything that travels over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BusEvent {
    Order(OrderEvent),
    Notification(NotificationEvent),
}
