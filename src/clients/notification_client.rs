use crate::bus::Subscription;
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{
    BusEvent, Notification, NotificationDraft, NotificationFilter, NotificationId,
    NotificationInbox, NotificationType, OrderEvent, OrderEventKind, SubOrderStatus,
};
use crate::notification_actor::{NotificationAction, NotificationActionResult, NotificationError};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Client for the notification inbox actor.
#[derive(Clone)]
pub struct NotificationService {
    inner: ResourceClient<NotificationInbox>,
}

impl NotificationService {
    pub fn new(inner: ResourceClient<NotificationInbox>) -> Self {
        Self { inner }
    }

    /// Records a notification on behalf of any collaborator (inventory, feedback, system).
    #[instrument(skip(self))]
    pub async fn notify(&self, draft: NotificationDraft) -> Result<Notification, NotificationError> {
        match self.act(NotificationAction::Record(draft)).await? {
            NotificationActionResult::Record(notification) => Ok(notification),
            other => Err(unexpected(other)),
        }
    }

    /// Marks one notification read. Returns whether it was unread before.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: NotificationId) -> Result<bool, NotificationError> {
        match self.act(NotificationAction::MarkRead(id)).await? {
            NotificationActionResult::MarkRead(changed) => Ok(changed),
            other => Err(unexpected(other)),
        }
    }

    /// Marks every unread notification read. Returns how many changed.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<usize, NotificationError> {
        match self.act(NotificationAction::MarkAllRead).await? {
            NotificationActionResult::MarkAllRead(marked) => Ok(marked),
            other => Err(unexpected(other)),
        }
    }

    /// Newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: NotificationFilter) -> Result<Vec<Notification>, NotificationError> {
        match self.act(NotificationAction::List(filter)).await? {
            NotificationActionResult::List(notifications) => Ok(notifications),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn unread_count(&self) -> Result<usize, NotificationError> {
        match self.act(NotificationAction::UnreadCount).await? {
            NotificationActionResult::UnreadCount(count) => Ok(count),
            other => Err(unexpected(other)),
        }
    }

    /// Turns order events from `subscription` into notifications until `token` is cancelled
    /// or the bus closes.
    pub fn spawn_consumer(&self, mut subscription: Subscription, token: CancellationToken) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            info!("Notification consumer started");
            loop {
                let event = tokio::select! {
                    _ = token.cancelled() => break,
                    event = subscription.recv() => event,
                };
                let Some(event) = event else { break };
                let BusEvent::Order(event) = event else { continue };

                let draft = draft_for(&event);
                if let Err(e) = service.notify(draft).await {
                    warn!(order_id = %event.order_id, sequence = event.sequence, error = %e, "Failed to record notification");
                }
            }
            subscription.unsubscribe();
            info!("Notification consumer stopped");
        })
    }
}

fn unexpected(result: NotificationActionResult) -> NotificationError {
    NotificationError::Unavailable(format!("unexpected actor reply: {:?}", result))
}

/// The notification an order event produces.
pub fn draft_for(event: &OrderEvent) -> NotificationDraft {
    let order = event.order_id;
    let sub = event
        .sub_order_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    let old = event.old_status.map(SubOrderStatus::as_str).unwrap_or("?");

    let (title, message) = match event.kind {
        OrderEventKind::NewOrder => (
            "New order",
            format!(
                "{} was placed with {} restaurant(s)",
                order,
                event.sub_order_ids.len()
            ),
        ),
        OrderEventKind::SubOrderStatusChanged
            if event.new_status == Some(SubOrderStatus::Cancelled) =>
        {
            let restaurant = event
                .restaurant_id
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default();
            ("Order cancelled", format!("{} at {}: {} -> cancelled", sub, restaurant, old))
        }
        OrderEventKind::SubOrderStatusChanged => {
            let new = event.new_status.map(SubOrderStatus::as_str).unwrap_or("?");
            ("Order update", format!("{} of {}: {} -> {}", sub, order, old, new))
        }
        OrderEventKind::OrderFullyResolved => {
            let aggregate = event.order_status.map(|s| s.as_str()).unwrap_or("resolved");
            ("Order resolved", format!("{} finished as {}", order, aggregate))
        }
    };
    debug!(%order, title, "Drafted notification");

    NotificationDraft::new(NotificationType::Order, title, message).related_to(order.to_string())
}

#[async_trait]
impl ActorClient<NotificationInbox> for NotificationService {
    type Error = NotificationError;

    fn inner(&self) -> &ResourceClient<NotificationInbox> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        e.downcast_entity::<NotificationError>()
            .unwrap_or_else(|e| NotificationError::Unavailable(e.to_string()))
    }
}
