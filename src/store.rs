//! # Order Store
//!
//! The canonical collection of orders. Each order lives in its own
//! [`ResourceActor`](crate::framework::ResourceActor); the store allocates ids, spawns the
//! actors and routes sub-order transitions to the actor that owns them.
//!
//! # Architecture Note
//! Two indexes sit in front of the actors:
//! - the registry's `OrderId -> client` map
//! - a `SubOrderId -> OrderId` map for O(1) routing of status updates
//!
//! Both are `DashMap`s. Mutations of one order are serialized by its actor; different orders
//! proceed in parallel.

use crate::bus::EventBus;
use crate::clients::{ActorClient, OrderClient};
use crate::framework::ResourceRegistry;
use crate::model::{
    BusEvent, NewOrder, Order, OrderCreate, OrderEvent, OrderId, SubOrderId, SubOrderStatus,
};
use crate::order_actor::{self, OrderError, TransitionOutcome};
use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct OrderStore {
    registry: ResourceRegistry<Order>,
    sub_orders: Arc<DashMap<SubOrderId, OrderId>>,
    next_sub_order_id: Arc<AtomicU32>,
    bus: EventBus,
}

impl OrderStore {
    pub fn new(bus: EventBus, mailbox_size: usize) -> Self {
        Self {
            registry: order_actor::new(bus.clone(), mailbox_size),
            sub_orders: Arc::new(DashMap::new()),
            next_sub_order_id: Arc::new(AtomicU32::new(1)),
            bus,
        }
    }

    /// Creates an order and all of its sub-orders, every one `pending`.
    ///
    /// The `new_order` event (sequence `0`) is published before any sub-order becomes
    /// routable, so no status change of this order can be observed ahead of it.
    #[instrument(skip(self, request), fields(customer = %request.customer.name))]
    pub async fn create_order(&self, request: OrderCreate) -> Result<Order, OrderError> {
        let sub_order_ids = request
            .sub_orders
            .iter()
            .map(|_| SubOrderId(self.next_sub_order_id.fetch_add(1, Ordering::SeqCst)))
            .collect();
        let params = NewOrder {
            request,
            sub_order_ids,
            ordered_at: Utc::now(),
        };

        let (order, client) = self
            .registry
            .spawn(params)
            .map_err(<OrderClient as ActorClient<Order>>::map_error)?;
        self.registry.register(client);

        self.bus.publish(BusEvent::Order(OrderEvent::new_order(
            order.id,
            order.sub_order_ids(),
            order.ordered_at,
        )));
        for sub in &order.sub_orders {
            self.sub_orders.insert(sub.id, order.id);
        }

        info!(order_id = %order.id, sub_orders = order.sub_orders.len(), "Order created");
        Ok(order)
    }

    /// Validates and commits a sub-order status change, then publishes its event.
    pub async fn apply_transition(
        &self,
        sub_order_id: SubOrderId,
        target: SubOrderStatus,
    ) -> Result<TransitionOutcome, OrderError> {
        self.client_for(sub_order_id)?
            .transition(sub_order_id, target, None)
            .await
    }

    /// Like [`apply_transition`](Self::apply_transition), but fails with
    /// [`OrderError::Conflict`] unless the committed status is still `expected`.
    pub async fn apply_transition_expecting(
        &self,
        sub_order_id: SubOrderId,
        expected: SubOrderStatus,
        target: SubOrderStatus,
    ) -> Result<TransitionOutcome, OrderError> {
        self.client_for(sub_order_id)?
            .transition(sub_order_id, target, Some(expected))
            .await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        match self.registry.client(&id) {
            Ok(client) => OrderClient::new(client).snapshot().await.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Every order, by ascending id.
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        let clients: Vec<OrderClient> = self
            .registry
            .clients()
            .into_iter()
            .map(OrderClient::new)
            .collect();
        let snapshots = join_all(clients.iter().map(|client| client.snapshot())).await;

        let mut orders = snapshots.into_iter().collect::<Result<Vec<_>, _>>()?;
        orders.sort_by_key(|order| order.id);
        Ok(orders)
    }

    /// The order a sub-order belongs to.
    pub fn order_of(&self, sub_order_id: SubOrderId) -> Option<OrderId> {
        self.sub_orders.get(&sub_order_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Stops every order actor.
    pub async fn shutdown(&self) -> Result<(), String> {
        self.sub_orders.clear();
        self.registry.shutdown().await
    }

    fn client_for(&self, sub_order_id: SubOrderId) -> Result<OrderClient, OrderError> {
        let order_id = self
            .order_of(sub_order_id)
            .ok_or_else(|| OrderError::NotFound(sub_order_id.to_string()))?;
        self.registry
            .client(&order_id)
            .map(OrderClient::new)
            .map_err(|_| OrderError::NotFound(order_id.to_string()))
    }
}
