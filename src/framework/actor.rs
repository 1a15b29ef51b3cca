//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the single writer of one aggregate. It implements
//! the "Server" side of the Actor Model: messages are processed one at a time, so the
//! aggregate never sees two interleaved mutations.

use crate::framework::client::ResourceClient;
use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use crate::framework::message::ResourceRequest;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that owns a single entity.
///
/// # Architecture Note
/// This struct is the "Server" half of the actor. It owns the entity and the receiver end of
/// the mailbox.
///
/// **Concurrency Model**:
/// There is one `ResourceActor` per aggregate. Requests for the *same* aggregate queue up in
/// its mailbox and are handled strictly in order, so a second status update is validated
/// against the state the first one committed. Requests for *different* aggregates go to
/// different tasks and run in parallel. No `Mutex` guards the entity.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `ResourceActor::new()` to get the `actor` (server) and `client`.
/// 2.  **Wire**: Pass dependencies into `actor.run(context)`.
/// 3.  **Run**: Spawn the run loop in a background task.
///
/// Most callers go through [`ResourceRegistry`](crate::framework::ResourceRegistry), which
/// does all three.
pub struct ResourceActor<T: ActorEntity> {
    id: T::Id,
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    entity: T,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` owning `entity`, and its associated `ResourceClient`.
    ///
    /// # Arguments
    ///
    /// * `id` - The entity's identifier, used for logging and by the client.
    /// * `entity` - The initial aggregate state.
    /// * `buffer_size` - The capacity of the mailbox. If it is full, client calls wait.
    pub fn new(id: T::Id, entity: T, buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            id: id.clone(),
            receiver,
            entity,
        };
        let client = ResourceClient::new(id, sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    ///
    /// # Context Injection
    /// The `context` argument is passed to every action handler. This allows entities to reach
    /// shared services (like the event bus) that were created independently of the actor.
    pub async fn run(mut self, context: T::Context) {
        // Extract just the type name (e.g., "Order" instead of "order_sync::model::order::Order")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let id = self.id.clone();
        debug!(entity_type, %id, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Get { respond_to } => {
                    debug!(entity_type, %id, "Get");
                    let _ = respond_to.send(Ok(self.entity.clone()));
                }
                ResourceRequest::Action { action, respond_to } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let result = self
                        .entity
                        .handle_action(action, &context)
                        .await
                        .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                    match &result {
                        Ok(_) => debug!(entity_type, %id, "Action ok"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, %id, "Shutdown");
    }
}
