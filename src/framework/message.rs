//! # Generic Messages
//!
//! The messages a `ResourceClient` sends to its `ResourceActor`.

use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to an actor.
///
/// Each actor owns exactly one aggregate, so requests carry no id: the mailbox *is* the
/// address.
///
/// - **Get**: Returns a clone of the current aggregate state.
/// - **Action**: Executes an [`ActorEntity::Action`] with exclusive access.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Get {
        respond_to: Response<T>,
    },
    Action {
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
