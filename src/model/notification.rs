//! Notification records and the inbox aggregate that owns them.
//!
//! # Actor Framework
//! [`NotificationInbox`] implements the [`ActorEntity`](crate::framework::ActorEntity) trait;
//! a single inbox actor serializes every read/unread mutation.

use crate::model::{InboxId, NotificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Order,
    Inventory,
    Feedback,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    /// Only ever goes from `false` to `true`.
    pub read: bool,
    pub created_at: DateTime<Utc>,
    /// The entity that triggered this notification (e.g. `order_3`).
    pub related_id: Option<String>,
}

/// Everything needed to record a notification; the inbox assigns id, time and read flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub related_id: Option<String>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            related_id: None,
        }
    }

    pub fn related_to(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }
}

/// Query parameters for `GET /notifications`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(default, rename = "type")]
    pub kind: Option<NotificationType>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl NotificationFilter {
    fn matches(&self, notification: &Notification) -> bool {
        if self.unread_only && notification.read {
            return false;
        }
        self.kind.map_or(true, |kind| kind == notification.kind)
    }
}

/// The aggregate behind the notification actor.
#[derive(Debug, Clone)]
pub struct NotificationInbox {
    pub id: InboxId,
    /// In creation order; ids grow with position.
    notifications: Vec<Notification>,
    next_id: u32,
    /// Bumped on every effective mutation.
    revision: u64,
}

impl NotificationInbox {
    pub fn new(id: InboxId) -> Self {
        Self {
            id,
            notifications: Vec::new(),
            next_id: 1,
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn record(&mut self, draft: NotificationDraft, now: DateTime<Utc>) -> Notification {
        let notification = Notification {
            id: NotificationId(self.next_id),
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            read: false,
            created_at: now,
            related_id: draft.related_id,
        };
        self.next_id += 1;
        self.revision += 1;
        self.notifications.push(notification.clone());
        notification
    }

    /// Marks one notification read.
    ///
    /// Returns `Some(true)` if it changed, `Some(false)` if it was already read, `None` if the
    /// id is unknown.
    pub fn mark_read(&mut self, id: NotificationId) -> Option<bool> {
        let notification = self.notifications.iter_mut().find(|n| n.id == id)?;
        if notification.read {
            return Some(false);
        }
        notification.read = true;
        self.revision += 1;
        Some(true)
    }

    /// Marks every currently-unread notification read and returns how many changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut marked = 0;
        for notification in self.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            marked += 1;
        }
        if marked > 0 {
            self.revision += 1;
        }
        marked
    }

    /// Newest first.
    pub fn list(&self, filter: &NotificationFilter) -> Vec<Notification> {
        let matching = self.notifications.iter().rev().filter(|n| filter.matches(n));
        match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbox_with(kinds: &[NotificationType]) -> NotificationInbox {
        let mut inbox = NotificationInbox::new(InboxId(1));
        for (i, kind) in kinds.iter().enumerate() {
            inbox.record(NotificationDraft::new(*kind, format!("t{}", i), "m"), Utc::now());
        }
        inbox
    }

    #[test]
    fn list_is_newest_first_and_filters() {
        let mut inbox = inbox_with(&[
            NotificationType::Order,
            NotificationType::Inventory,
            NotificationType::Order,
        ]);
        inbox.mark_read(NotificationId(3));

        let all = inbox.list(&NotificationFilter::default());
        let ids: Vec<_> = all.iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let unread_orders = inbox.list(&NotificationFilter {
            kind: Some(NotificationType::Order),
            unread_only: true,
            limit: None,
        });
        assert_eq!(unread_orders.len(), 1);
        assert_eq!(unread_orders[0].id, NotificationId(1));
    }

    #[test]
    fn mark_read_is_idempotent_and_monotonic() {
        let mut inbox = inbox_with(&[NotificationType::Order]);
        assert_eq!(inbox.mark_read(NotificationId(1)), Some(true));
        let revision = inbox.revision();
        assert_eq!(inbox.mark_read(NotificationId(1)), Some(false));
        assert_eq!(inbox.revision(), revision);
        assert_eq!(inbox.mark_read(NotificationId(9)), None);
        assert!(inbox.list(&NotificationFilter::default())[0].read);
    }

    #[test]
    fn mark_all_read_twice_changes_nothing_the_second_time() {
        let mut inbox = inbox_with(&[NotificationType::Order, NotificationType::System]);
        assert_eq!(inbox.mark_all_read(), 2);
        let before = inbox.list(&NotificationFilter::default());
        let revision = inbox.revision();

        assert_eq!(inbox.mark_all_read(), 0);
        assert_eq!(inbox.list(&NotificationFilter::default()), before);
        assert_eq!(inbox.revision(), revision);
        assert_eq!(inbox.unread_count(), 0);
    }

    #[test]
    fn notifications_after_mark_all_read_stay_unread() {
        let mut inbox = inbox_with(&[NotificationType::Order]);
        inbox.mark_all_read();
        inbox.record(NotificationDraft::new(NotificationType::Feedback, "late", "m"), Utc::now());
        assert_eq!(inbox.unread_count(), 1);
    }
}
