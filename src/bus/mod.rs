//! # Event Bus
//!
//! In-process fan-out of [`BusEvent`]s to every live subscriber.
//!
//! ```text
//!  order actors ──┐
//!                 ├──▶ EventBus::publish ──try_send──▶ [queue] ──▶ Subscription (session 1)
//!  inbox actor ───┘                       ──try_send──▶ [queue] ──▶ Subscription (session 2)
//!                                         ──try_send──▶ [queue] ──▶ Subscription (consumer)
//! ```
//!
//! # Architecture Note
//! Every subscriber owns its own bounded queue. `publish` never awaits: a full queue drops the
//! *new* event for that subscriber only, so one slow dashboard cannot stall the order actors
//! or the other subscribers. Dropped events surface as sequence gaps, which the
//! [reconciliation poller](crate::poller) heals.
//!
//! The notification consumer is the exception: it subscribes with
//! [`subscribe_lossless`](EventBus::subscribe_lossless), an unbounded queue that never drops.
//! Notifications are not healed by polling, so every order event has to reach it.
//!
//! Events published from one actor land in each queue in publish order.

use crate::model::BusEvent;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

enum QueueSender {
    Bounded(mpsc::Sender<BusEvent>),
    Unbounded(mpsc::UnboundedSender<BusEvent>),
}

impl QueueSender {
    fn try_send(&self, event: BusEvent) -> Result<(), TrySendError<BusEvent>> {
        match self {
            QueueSender::Bounded(sender) => sender.try_send(event),
            QueueSender::Unbounded(sender) => sender
                .send(event)
                .map_err(|e| TrySendError::Closed(e.0)),
        }
    }
}

enum QueueReceiver {
    Bounded(mpsc::Receiver<BusEvent>),
    Unbounded(mpsc::UnboundedReceiver<BusEvent>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<BusEvent> {
        match self {
            QueueReceiver::Bounded(receiver) => receiver.recv().await,
            QueueReceiver::Unbounded(receiver) => receiver.recv().await,
        }
    }

    fn try_recv(&mut self) -> Option<BusEvent> {
        match self {
            QueueReceiver::Bounded(receiver) => receiver.try_recv().ok(),
            QueueReceiver::Unbounded(receiver) => receiver.try_recv().ok(),
        }
    }

    fn close(&mut self) {
        match self {
            QueueReceiver::Bounded(receiver) => receiver.close(),
            QueueReceiver::Unbounded(receiver) => receiver.close(),
        }
    }
}

struct SubscriberSlot {
    sender: QueueSender,
    token: CancellationToken,
    dropped: Arc<AtomicU64>,
}

struct BusInner {
    subscribers: DashMap<u64, SubscriberSlot>,
    next_id: AtomicU64,
    capacity: usize,
}

/// Cheap to clone; all clones share the subscriber registry.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// What a single `publish` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub dropped: usize,
    /// Subscribers found closed and removed.
    pub pruned: usize,
}

impl EventBus {
    /// # Arguments
    /// * `capacity` - Queue length of each subscriber. Must be at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn publish(&self, event: BusEvent) -> PublishReport {
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for entry in self.inner.subscribers.iter() {
            match entry.sender.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    entry.dropped.fetch_add(1, Ordering::Relaxed);
                    report.dropped += 1;
                    warn!(subscriber = *entry.key(), "Subscriber queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // Removal happens after iteration; DashMap shards are still read-locked inside the loop.
        for id in closed {
            if let Some((_, slot)) = self.inner.subscribers.remove(&id) {
                slot.token.cancel();
                report.pruned += 1;
                debug!(subscriber = id, "Pruned closed subscriber");
            }
        }
        report
    }

    /// Subscribes with a bounded queue of the bus capacity. Overflow drops new events.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.capacity);
        self.register(QueueSender::Bounded(sender), QueueReceiver::Bounded(receiver))
    }

    /// Subscribes with an unbounded queue that never drops an event.
    ///
    /// For consumers whose output cannot be rebuilt from a snapshot. The consumer must keep
    /// draining, or the queue grows without limit.
    pub fn subscribe_lossless(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.register(QueueSender::Unbounded(sender), QueueReceiver::Unbounded(receiver))
    }

    fn register(&self, sender: QueueSender, receiver: QueueReceiver) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let dropped = Arc::new(AtomicU64::new(0));

        self.inner.subscribers.insert(
            id,
            SubscriberSlot {
                sender,
                token: token.clone(),
                dropped: dropped.clone(),
            },
        );
        debug!(subscriber = id, "Subscribed");

        Subscription {
            id,
            receiver,
            token,
            dropped,
            bus: self.inner.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Cancels every subscription. Pending `recv` calls return `None`.
    pub fn close(&self) {
        let ids: Vec<u64> = self.inner.subscribers.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, slot)) = self.inner.subscribers.remove(&id) {
                slot.token.cancel();
            }
        }
    }
}

/// Receiving end of one subscriber queue.
///
/// Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    receiver: QueueReceiver,
    token: CancellationToken,
    dropped: Arc<AtomicU64>,
    bus: Arc<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once unsubscribed or the bus is closed.
    pub async fn recv(&mut self) -> Option<BusEvent> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            event = self.receiver.recv() => event,
        }
    }

    /// Next already-queued event, without waiting.
    pub fn try_recv(&mut self) -> Option<BusEvent> {
        if self.token.is_cancelled() {
            return None;
        }
        self.receiver.try_recv()
    }

    /// Deregisters synchronously; later publishes never reach this queue. Idempotent.
    pub fn unsubscribe(&mut self) {
        let removed = self.bus.subscribers.remove(&self.id).is_some();
        self.token.cancel();
        self.receiver.close();
        if removed {
            debug!(subscriber = self.id, "Unsubscribed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Events dropped for this subscriber because its queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderEvent, OrderId};
    use chrono::Utc;

    fn event(order: u32) -> BusEvent {
        BusEvent::Order(OrderEvent::new_order(OrderId(order), vec![], Utc::now()))
    }

    fn order_id(event: BusEvent) -> OrderId {
        match event {
            BusEvent::Order(e) => e.order_id,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_in_publish_order() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        for i in 1..=3 {
            let report = bus.publish(event(i));
            assert_eq!(report.delivered, 2);
        }

        for sub in [&mut a, &mut b] {
            for i in 1..=3 {
                assert_eq!(order_id(sub.recv().await.unwrap()), OrderId(i));
            }
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_new_events_only_for_that_subscriber() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        bus.publish(event(1));
        assert_eq!(order_id(fast.recv().await.unwrap()), OrderId(1));
        bus.publish(event(2));
        assert_eq!(order_id(fast.recv().await.unwrap()), OrderId(2));
        let report = bus.publish(event(3));

        assert_eq!(report, PublishReport { delivered: 1, dropped: 1, pruned: 0 });
        assert_eq!(slow.dropped(), 1);
        assert_eq!(fast.dropped(), 0);
        assert_eq!(order_id(slow.recv().await.unwrap()), OrderId(1));
        assert_eq!(order_id(slow.recv().await.unwrap()), OrderId(2));
        assert!(slow.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lossless_subscriber_keeps_every_event_past_capacity() {
        let bus = EventBus::new(1);
        let mut bounded = bus.subscribe();
        let mut lossless = bus.subscribe_lossless();

        for i in 1..=50 {
            bus.publish(event(i));
        }

        assert_eq!(bounded.dropped(), 49);
        assert_eq!(lossless.dropped(), 0);
        for i in 1..=50 {
            assert_eq!(order_id(lossless.recv().await.unwrap()), OrderId(i));
        }
        assert!(lossless.try_recv().is_none());
        assert_eq!(order_id(bounded.recv().await.unwrap()), OrderId(1));

        lossless.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert!(lossless.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_synchronous_and_idempotent() {
        let bus = EventBus::new(4);
        let mut sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);

        let report = bus.publish(event(1));
        assert_eq!(report.delivered, 0);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = EventBus::new(4);
        let sub = bus.subscribe();
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_wakes_pending_receivers() {
        let bus = EventBus::new(4);
        let mut sub = bus.subscribe();
        let waiter = tokio::spawn(async move { sub.recv().await });
        tokio::task::yield_now().await;

        bus.close();
        assert!(waiter.await.unwrap().is_none());
        assert_eq!(bus.subscriber_count(), 0);
    }
}
