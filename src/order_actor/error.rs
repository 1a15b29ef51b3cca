//! Error types for the Order actor.

use crate::model::SubOrderStatus;
use crate::transition::TransitionError;
use thiserror::Error;

/// Errors that can occur during order operations.
///
/// Everything except `Unavailable` is a caller mistake: it is returned synchronously and
/// never retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The checkout payload is malformed.
    #[error("Order validation error: {0}")]
    Validation(String),

    /// The requested order or sub-order was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The status graph has no edge from `current` to `target`.
    #[error("Invalid transition from {current} to {target}")]
    InvalidTransition {
        current: SubOrderStatus,
        target: SubOrderStatus,
    },

    /// The caller's view of the sub-order is out of date.
    #[error("Conflict: expected {expected}, found {actual}")]
    Conflict {
        expected: SubOrderStatus,
        actual: SubOrderStatus,
    },

    /// An error occurred while communicating with the actor system.
    #[error("Order actor unavailable: {0}")]
    Unavailable(String),
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::Unavailable(msg)
    }
}

impl From<TransitionError> for OrderError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { current, target } => {
                OrderError::InvalidTransition { current, target }
            }
        }
    }
}
