//! The cached state behind one owner dashboard.
//!
//! A [`SessionView`] is fed from two directions:
//! - bus events, applied in per-order sequence order
//! - snapshots from the reconciliation poller, which replace stale entries
//!
//! Neither source may move an entry backwards: an entry only ever advances to a higher
//! sequence, and the unread count only follows a higher inbox revision.

use crate::model::{
    NotificationEvent, OrderEvent, OrderEventKind, OrderId, OrderStatus, OrderSummary, Snapshot,
    SubOrderId, SubOrderStatus,
};
use crate::transition::derive_order_status;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// Already seen; nothing changed.
    Duplicate,
    /// Events are missing in between. The entry is marked stale and waits for reconciliation.
    Gap { expected: u64, received: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Health {
    Live,
    /// The poller has failed this many cycles in a row. Cached data may be old.
    Degraded { consecutive_failures: u32 },
}

/// Cached state of one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub order_id: OrderId,
    pub sub_orders: BTreeMap<SubOrderId, SubOrderStatus>,
    pub status: OrderStatus,
    /// Last applied event sequence.
    pub sequence: u64,
    pub stale: bool,
    /// Highest sequence seen on the bus, applied or not.
    #[serde(skip)]
    seen: u64,
}

impl OrderEntry {
    fn placeholder(order_id: OrderId) -> Self {
        Self {
            order_id,
            sub_orders: BTreeMap::new(),
            status: OrderStatus::Pending,
            sequence: 0,
            stale: true,
            seen: 0,
        }
    }

    fn refresh_status(&mut self) {
        self.status = derive_order_status(self.sub_orders.values().copied());
    }
}

impl From<&OrderSummary> for OrderEntry {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            order_id: summary.order.id,
            sub_orders: summary
                .order
                .sub_orders
                .iter()
                .map(|s| (s.id, s.status))
                .collect(),
            status: summary.status,
            sequence: summary.order.sequence,
            stale: false,
            seen: summary.order.sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    orders: BTreeMap<OrderId, OrderEntry>,
    unread_count: usize,
    notification_revision: u64,
    toasts: VecDeque<Toast>,
    #[serde(skip)]
    toast_capacity: usize,
    health: Health,
}

impl SessionView {
    pub fn new(toast_capacity: usize) -> Self {
        Self {
            orders: BTreeMap::new(),
            unread_count: 0,
            notification_revision: 0,
            toasts: VecDeque::new(),
            toast_capacity,
            health: Health::Live,
        }
    }

    pub fn order(&self, id: OrderId) -> Option<&OrderEntry> {
        self.orders.get(&id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &OrderEntry> {
        self.orders.values()
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn notification_revision(&self) -> u64 {
        self.notification_revision
    }

    /// Orders still waiting for a restaurant to confirm.
    pub fn badge(&self) -> usize {
        self.orders
            .values()
            .filter(|entry| entry.status == OrderStatus::Pending && !entry.sub_orders.is_empty())
            .count()
    }

    /// Oldest first.
    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn has_stale(&self) -> bool {
        self.orders.values().any(|entry| entry.stale)
    }

    pub fn set_health(&mut self, health: Health) {
        self.health = health;
    }

    pub fn apply_order_event(&mut self, event: &OrderEvent) -> Applied {
        let Some(entry) = self.orders.get_mut(&event.order_id) else {
            if event.kind == OrderEventKind::NewOrder {
                let mut entry = OrderEntry::placeholder(event.order_id);
                entry.sub_orders = event
                    .sub_order_ids
                    .iter()
                    .map(|id| (*id, SubOrderStatus::Pending))
                    .collect();
                entry.sequence = event.sequence;
                entry.seen = event.sequence;
                entry.stale = false;
                entry.refresh_status();
                self.orders.insert(event.order_id, entry);
                return Applied::Applied;
            }
            // Subscribed after the order was placed and before the first snapshot arrived.
            let mut placeholder = OrderEntry::placeholder(event.order_id);
            placeholder.seen = event.sequence;
            self.orders.insert(event.order_id, placeholder);
            return Applied::Gap {
                expected: 0,
                received: event.sequence,
            };
        };

        if event.sequence <= entry.sequence {
            return Applied::Duplicate;
        }
        let expected = entry.sequence + 1;
        entry.seen = entry.seen.max(event.sequence);
        if entry.stale || event.sequence != expected {
            entry.stale = true;
            return Applied::Gap {
                expected,
                received: event.sequence,
            };
        }

        if let (Some(sub_order_id), Some(status)) = (event.sub_order_id, event.new_status) {
            entry.sub_orders.insert(sub_order_id, status);
        }
        entry.sequence = event.sequence;
        entry.refresh_status();
        Applied::Applied
    }

    pub fn apply_notification_event(&mut self, event: &NotificationEvent) -> Applied {
        if event.revision() <= self.notification_revision {
            return Applied::Duplicate;
        }
        self.notification_revision = event.revision();
        self.unread_count = event.unread_count();

        if let NotificationEvent::Created { notification, .. } = event {
            self.push_toast(Toast {
                title: notification.title.clone(),
                message: notification.message.clone(),
                at: notification.created_at,
            });
        }
        Applied::Applied
    }

    /// Replaces entries from an authoritative snapshot.
    ///
    /// An entry that has already applied a higher sequence than the snapshot carries is kept.
    /// A stale entry only heals once the snapshot reaches the highest sequence seen on the bus;
    /// an older snapshot is taken over but the entry stays stale.
    /// Returns how many stale entries were healed.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> usize {
        let mut healed = 0;
        for summary in &snapshot.orders {
            let mut fresh = OrderEntry::from(summary);
            match self.orders.get(&fresh.order_id) {
                Some(current) if current.sequence > fresh.sequence => continue,
                Some(current) if current.stale && fresh.sequence < current.seen => {
                    fresh.stale = true;
                    fresh.seen = current.seen;
                }
                Some(current) if current.stale => healed += 1,
                _ => {}
            }
            self.orders.insert(fresh.order_id, fresh);
        }

        if snapshot.notification_revision >= self.notification_revision {
            self.notification_revision = snapshot.notification_revision;
            self.unread_count = snapshot.unread_count;
        }
        healed
    }

    fn push_toast(&mut self, toast: Toast) {
        if self.toast_capacity == 0 {
            return;
        }
        while self.toasts.len() >= self.toast_capacity {
            self.toasts.pop_front();
        }
        self.toasts.push_back(toast);
    }
}
