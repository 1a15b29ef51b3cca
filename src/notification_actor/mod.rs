//! Notification inbox resource logic.
//!
//! A single inbox actor owns every notification, so read/unread changes are serialized and
//! the revision counter is strictly increasing.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::bus::EventBus;
use crate::clients::NotificationService;
use crate::framework::{FrameworkError, ResourceRegistry};
use crate::model::NotificationInbox;

/// Spawns the inbox actor and wraps its client.
///
/// The returned registry owns the actor task; keep it to shut the inbox down.
pub fn new(
    bus: EventBus,
    mailbox_size: usize,
) -> Result<(ResourceRegistry<NotificationInbox>, NotificationService), FrameworkError> {
    let registry = ResourceRegistry::new(mailbox_size, bus);
    let (_, client) = registry.spawn(())?;
    registry.register(client.clone());
    Ok((registry, NotificationService::new(client)))
}
