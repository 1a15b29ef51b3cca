//! Entity trait implementation for the [`NotificationInbox`].
//!
//! Every effective mutation publishes a [`NotificationEvent`] carrying the new inbox revision
//! and unread count. Idempotent no-ops (marking an already-read notification) publish nothing.

use super::actions::{NotificationAction, NotificationActionResult};
use super::error::NotificationError;
use crate::bus::EventBus;
use crate::framework::ActorEntity;
use crate::model::{BusEvent, InboxId, NotificationEvent, NotificationInbox};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

#[async_trait]
impl ActorEntity for NotificationInbox {
    type Id = InboxId;
    type Create = ();
    type Action = NotificationAction;
    type ActionResult = NotificationActionResult;
    type Context = EventBus;
    type Error = NotificationError;

    fn from_create_params(id: InboxId, _params: ()) -> Result<Self, NotificationError> {
        Ok(NotificationInbox::new(id))
    }

    async fn handle_action(
        &mut self,
        action: NotificationAction,
        bus: &EventBus,
    ) -> Result<NotificationActionResult, NotificationError> {
        match action {
            NotificationAction::Record(draft) => {
                let notification = self.record(draft, Utc::now());
                info!(id = %notification.id, title = %notification.title, "Notification recorded");
                bus.publish(BusEvent::Notification(NotificationEvent::Created {
                    notification: notification.clone(),
                    revision: self.revision(),
                    unread_count: self.unread_count(),
                }));
                Ok(NotificationActionResult::Record(notification))
            }
            NotificationAction::MarkRead(id) => {
                let changed = self.mark_read(id).ok_or(NotificationError::NotFound(id))?;
                if changed {
                    bus.publish(BusEvent::Notification(NotificationEvent::Read {
                        id,
                        revision: self.revision(),
                        unread_count: self.unread_count(),
                    }));
                } else {
                    debug!(%id, "Already read");
                }
                Ok(NotificationActionResult::MarkRead(changed))
            }
            NotificationAction::MarkAllRead => {
                let marked = self.mark_all_read();
                if marked > 0 {
                    bus.publish(BusEvent::Notification(NotificationEvent::AllRead {
                        marked,
                        revision: self.revision(),
                        unread_count: self.unread_count(),
                    }));
                }
                debug!(marked, "Marked all read");
                Ok(NotificationActionResult::MarkAllRead(marked))
            }
            NotificationAction::List(filter) => Ok(NotificationActionResult::List(self.list(&filter))),
            NotificationAction::UnreadCount => {
                Ok(NotificationActionResult::UnreadCount(self.unread_count()))
            }
        }
    }
}
