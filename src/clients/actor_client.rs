use crate::framework::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to share the plumbing calls.
///
/// Implementors only say how to reach the generic client and how to turn a
/// [`FrameworkError`] into their own error type; `snapshot` and `act` come for free.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a copy of the current aggregate state.
    #[tracing::instrument(skip(self), fields(id = %self.inner().id()))]
    async fn snapshot(&self) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get().await.map_err(Self::map_error)
    }

    /// Send an action and wait for the actor's answer.
    #[tracing::instrument(skip(self), fields(id = %self.inner().id()))]
    async fn act(&self, action: T::Action) -> Result<T::ActionResult, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().perform_action(action).await.map_err(Self::map_error)
    }
}
