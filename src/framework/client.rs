//! # Generic Client
//!
//! This module defines the generic client for communicating with an actor.

use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use crate::framework::message::ResourceRequest;
use tokio::sync::{mpsc, oneshot};

/// A type-safe client for interacting with one `ResourceActor`.
///
/// It forwards requests over a Tokio mpsc channel and receives results via oneshot channels.
/// The client holds only a sender, so cloning is cheap and clones can be shared across tasks.
/// The actor stops once every clone is dropped.
pub struct ResourceClient<T: ActorEntity> {
    id: T::Id,
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(id: T::Id, sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { id, sender }
    }

    /// The id of the entity behind this client.
    pub fn id(&self) -> &T::Id {
        &self.id
    }

    pub async fn get(&self) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Get { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn perform_action(&self, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Action { action, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}
