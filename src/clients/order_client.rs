use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Order, OrderId, SubOrderId, SubOrderStatus};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError, TransitionOutcome};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with one Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    pub fn order_id(&self) -> OrderId {
        *self.inner.id()
    }

    /// Moves a sub-order of this order to `target`.
    ///
    /// With `expected` set, the move only happens if the committed status still equals it.
    #[instrument(skip(self), fields(order_id = %self.inner.id()))]
    pub async fn transition(
        &self,
        sub_order_id: SubOrderId,
        target: SubOrderStatus,
        expected: Option<SubOrderStatus>,
    ) -> Result<TransitionOutcome, OrderError> {
        debug!("Sending transition");
        let OrderActionResult::Transition(outcome) = self
            .act(OrderAction::Transition {
                sub_order_id,
                target,
                expected,
            })
            .await?;
        Ok(outcome)
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        e.downcast_entity::<OrderError>()
            .unwrap_or_else(|e| OrderError::Unavailable(e.to_string()))
    }
}
