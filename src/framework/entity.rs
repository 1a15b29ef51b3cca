//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract every aggregate (an [`Order`](crate::model::Order),
//! the [`NotificationInbox`](crate::model::NotificationInbox)) implements to be owned by a
//! [`ResourceActor`](crate::framework::ResourceActor).
//!
//! # Architecture Note
//! The actor loop is written *once* against this trait. The entity only describes how it is
//! built and how it reacts to its own actions; mailboxes, response channels and logging are
//! the framework's job.
//!
//! We use associated types to keep every mailbox strongly typed: an `Order` actor only accepts
//! an [`OrderAction`](crate::order_actor::OrderAction) and answers with an
//! [`OrderActionResult`](crate::order_actor::OrderActionResult).

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any aggregate must implement to be managed by a `ResourceActor`.
///
/// # Async & Context
/// This trait is `#[async_trait]` so that action handlers may await (e.g. publishing to the
/// event bus). The `Context` associated type is injected into every handler at `run()` time,
/// which keeps construction free of dependencies ("late binding").
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    /// Must be convertible from u32 for automatic ID generation.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// Enum representing the entity's operations (e.g. `Transition`).
    type Action: Send + Sync + Debug;

    /// The result type returned by actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity: one enum per actor, covering every action.
    /// The framework boxes it; typed clients downcast it back.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the ID and payload.
    /// Input validation belongs here: nothing is spawned if this fails.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Handle an entity-specific action.
    ///
    /// Runs with exclusive access to the entity: no other action on the same entity can
    /// interleave with it.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
