//! # Resource Registry
//!
//! One actor per aggregate means somebody has to remember where the actors are. The
//! `ResourceRegistry` allocates ids, builds entities, spawns their actors and keeps the
//! `id -> client` map that callers use to route requests.
//!
//! The map is a `DashMap`, so lookups for different aggregates never contend on a global
//! lock; all per-aggregate serialization still happens inside the actors.

use crate::framework::actor::ResourceActor;
use crate::framework::client::ResourceClient;
use crate::framework::entity::ActorEntity;
use crate::framework::error::FrameworkError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Spawns and tracks one [`ResourceActor`] per entity.
pub struct ResourceRegistry<T: ActorEntity> {
    actors: Arc<DashMap<T::Id, ResourceClient<T>>>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    next_id: Arc<AtomicU32>,
    buffer_size: usize,
    context: T::Context,
}

impl<T: ActorEntity> Clone for ResourceRegistry<T>
where
    T::Context: Clone,
{
    fn clone(&self) -> Self {
        Self {
            actors: self.actors.clone(),
            handles: self.handles.clone(),
            next_id: self.next_id.clone(),
            buffer_size: self.buffer_size,
            context: self.context.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceRegistry<T>
where
    T::Context: Clone,
{
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `buffer_size` - Mailbox capacity of every spawned actor.
    /// * `context` - Cloned into each actor's `run()`.
    pub fn new(buffer_size: usize, context: T::Context) -> Self {
        Self {
            actors: Arc::new(DashMap::new()),
            handles: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU32::new(1)),
            buffer_size,
            context,
        }
    }

    /// Builds a new entity and starts its actor.
    ///
    /// The entity is *not* yet visible through [`client`](Self::client); the caller decides
    /// when to [`register`](Self::register) it. Returns the initial entity state and the
    /// client of its (already running) actor.
    pub fn spawn(&self, params: T::Create) -> Result<(T, ResourceClient<T>), FrameworkError> {
        let id = T::Id::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        let entity = T::from_create_params(id.clone(), params)
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;

        let (actor, client) = ResourceActor::new(id, entity.clone(), self.buffer_size);
        let handle = tokio::spawn(actor.run(self.context.clone()));
        if let Ok(mut handles) = self.handles.lock() {
            handles.push(handle);
        }
        Ok((entity, client))
    }

    /// Makes a spawned actor reachable by id.
    pub fn register(&self, client: ResourceClient<T>) {
        self.actors.insert(client.id().clone(), client);
    }

    /// Looks up the client for an entity.
    pub fn client(&self, id: &T::Id) -> Result<ResourceClient<T>, FrameworkError> {
        self.actors
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))
    }

    /// Clients of every registered entity.
    pub fn clients(&self) -> Vec<ResourceClient<T>> {
        self.actors.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Stops every actor and waits for them.
    ///
    /// Dropping the registry's clients closes the mailboxes; actors exit once the last
    /// outstanding clone held elsewhere is dropped too.
    pub async fn shutdown(&self) -> Result<(), String> {
        let count = self.actors.len();
        self.actors.clear();

        let handles: Vec<_> = match self.handles.lock() {
            Ok(mut handles) => handles.drain(..).collect(),
            Err(_) => return Err("registry handle list poisoned".to_string()),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }
        info!(count, "Registry shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: u32,
        value: u32,
    }

    #[derive(Debug)]
    struct CounterCreate {
        start: u32,
    }

    #[derive(Debug)]
    enum CounterAction {
        Increment,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counter must start below 100")]
    struct CounterError;

    #[async_trait]
    impl ActorEntity for Counter {
        type Id = u32;
        type Create = CounterCreate;
        type Action = CounterAction;
        type ActionResult = u32;
        type Context = ();
        type Error = CounterError;

        fn from_create_params(id: u32, params: CounterCreate) -> Result<Self, Self::Error> {
            if params.start >= 100 {
                return Err(CounterError);
            }
            Ok(Self {
                id,
                value: params.start,
            })
        }

        async fn handle_action(&mut self, action: CounterAction, _: &()) -> Result<u32, Self::Error> {
            match action {
                CounterAction::Increment => {
                    self.value += 1;
                    Ok(self.value)
                }
            }
        }
    }

    #[tokio::test]
    async fn test_spawn_register_and_act() {
        let registry = ResourceRegistry::<Counter>::new(8, ());

        let (counter, client) = registry.spawn(CounterCreate { start: 5 }).unwrap();
        assert_eq!(counter.id, 1);
        assert!(registry.client(&1).is_err());

        registry.register(client);
        let client = registry.client(&1).unwrap();
        assert_eq!(client.perform_action(CounterAction::Increment).await.unwrap(), 6);
        assert_eq!(client.get().await.unwrap().value, 6);

        drop(client);
        registry.shutdown().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_create_spawns_nothing() {
        let registry = ResourceRegistry::<Counter>::new(8, ());
        let err = registry.spawn(CounterCreate { start: 500 }).err().unwrap();
        assert!(err.downcast_entity::<CounterError>().is_ok());
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let registry = ResourceRegistry::<Counter>::new(8, ());
        assert!(matches!(registry.client(&42), Err(FrameworkError::NotFound(id)) if id == "42"));
    }
}
