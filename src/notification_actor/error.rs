//! Error types for the notification inbox actor.

use crate::model::NotificationId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),

    #[error("Notification inbox unavailable: {0}")]
    Unavailable(String),
}

impl From<String> for NotificationError {
    fn from(msg: String) -> Self {
        NotificationError::Unavailable(msg)
    }
}
