//! Custom actions for the notification inbox actor.

use crate::model::{Notification, NotificationDraft, NotificationFilter, NotificationId};

#[derive(Debug, Clone)]
pub enum NotificationAction {
    /// Stores a new unread notification.
    Record(NotificationDraft),
    /// Marks one notification read. Already-read notifications are left alone.
    MarkRead(NotificationId),
    /// Marks every currently-unread notification read.
    MarkAllRead,
    List(NotificationFilter),
    UnreadCount,
}

/// Results from NotificationActions - variants match 1:1 with NotificationAction
#[derive(Debug, Clone)]
pub enum NotificationActionResult {
    Record(Notification),
    /// `true` if the notification was unread before.
    MarkRead(bool),
    /// How many notifications changed.
    MarkAllRead(usize),
    List(Vec<Notification>),
    UnreadCount(usize),
}
