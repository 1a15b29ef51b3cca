//! Authoritative snapshots read straight from the actors.

use crate::clients::{ActorClient, NotificationService};
use crate::model::{OrderSummary, Snapshot};
use crate::poller::{SnapshotSource, SourceError};
use crate::store::OrderStore;
use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

/// Reads every order actor and the inbox actor.
///
/// Each order is read from its own actor, so every entry is internally consistent and
/// carries the sequence of the last event that order published.
#[derive(Clone)]
pub struct LiveSnapshotSource {
    store: OrderStore,
    notifications: NotificationService,
}

impl LiveSnapshotSource {
    pub fn new(store: OrderStore, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    #[instrument(skip(self))]
    pub async fn take(&self) -> Result<Snapshot, SourceError> {
        let orders = self
            .store
            .list_orders()
            .await
            .map_err(|e| SourceError::TransientIo(e.to_string()))?;
        let inbox = self
            .notifications
            .snapshot()
            .await
            .map_err(|e| SourceError::TransientIo(e.to_string()))?;

        Ok(Snapshot {
            orders: orders.into_iter().map(OrderSummary::from).collect(),
            unread_count: inbox.unread_count(),
            notification_revision: inbox.revision(),
            taken_at: Utc::now(),
        })
    }
}

#[async_trait]
impl SnapshotSource for LiveSnapshotSource {
    async fn fetch(&self) -> Result<Snapshot, SourceError> {
        self.take().await
    }
}
