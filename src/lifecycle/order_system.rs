use crate::api::{ApiError, OrderApi};
use crate::bus::EventBus;
use crate::clients::NotificationService;
use crate::config::Config;
use crate::framework::{FrameworkError, ResourceRegistry};
use crate::model::{NotificationInbox, Snapshot};
use crate::notification_actor;
use crate::session::DashboardSession;
use crate::store::OrderStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Owns every running part of the service.
///
/// # Example
///
/// ```ignore
/// let system = OrderSystem::new(Config::default())?;
/// let order = system.api().place_order("owner-1", checkout).await?;
/// let mut session = system.open_session();
/// // ...
/// session.close().await;
/// system.shutdown().await?;
/// ```
pub struct OrderSystem {
    bus: EventBus,
    store: OrderStore,
    inbox: ResourceRegistry<NotificationInbox>,
    notifications: NotificationService,
    api: OrderApi,
    consumer: JoinHandle<()>,
    limiter_cleanup: JoinHandle<()>,
    token: CancellationToken,
}

impl OrderSystem {
    /// Starts the bus, the inbox actor, the notification consumer and the rate limiter
    /// cleanup.
    ///
    /// Order actors are spawned on demand by the store, one per placed order.
    pub fn new(config: Config) -> Result<Self, FrameworkError> {
        let config = Arc::new(config);
        let bus = EventBus::new(config.subscriber_buffer);

        let store = OrderStore::new(bus.clone(), config.mailbox_size);
        let (inbox, notifications) = notification_actor::new(bus.clone(), config.mailbox_size)?;

        // Subscribed losslessly before any order can be placed, so every order event
        // becomes exactly one notification.
        let token = CancellationToken::new();
        let consumer =
            notifications.spawn_consumer(bus.subscribe_lossless(), token.child_token());

        let api = OrderApi::new(store.clone(), notifications.clone(), bus.clone(), config);
        let limiter_cleanup = api.rate_limiter().spawn_cleanup(token.child_token());
        info!("Order system started");

        Ok(Self {
            bus,
            store,
            inbox,
            notifications,
            api,
            consumer,
            limiter_cleanup,
            token,
        })
    }

    pub fn api(&self) -> &OrderApi {
        &self.api
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn open_session(&self) -> DashboardSession {
        self.api.subscribe()
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ApiError> {
        self.api.snapshot().await
    }

    /// Gracefully shuts down the whole system.
    ///
    /// Closing the bus ends every open session; the actors stop once the last client is
    /// dropped. Sessions still held by callers keep the inbox alive, so close them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        self.token.cancel();
        if let Err(e) = self.consumer.await {
            error!("Notification consumer failed: {:?}", e);
            return Err(format!("Notification consumer failed: {:?}", e));
        }
        if let Err(e) = self.limiter_cleanup.await {
            error!("Rate limiter cleanup failed: {:?}", e);
            return Err(format!("Rate limiter cleanup failed: {:?}", e));
        }
        self.bus.close();

        drop(self.api);
        drop(self.notifications);

        self.store.shutdown().await?;
        self.inbox.shutdown().await?;

        info!("System shutdown complete.");
        Ok(())
    }
}
