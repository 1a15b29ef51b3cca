//! # API Handlers
//!
//! Transport-agnostic handlers behind the dashboard endpoints. An HTTP layer only has to
//! deserialize the request, call the handler and serialize either the result or
//! [`ApiError::body`] with [`ApiError::http_status`].
//!
//! | Endpoint | Handler |
//! |----------|---------|
//! | `POST /orders` | [`OrderApi::place_order`] |
//! | `GET /orders` | [`OrderApi::list_orders`] |
//! | `PATCH /orders/{o}/subOrders/{s}/status` | [`OrderApi::update_sub_order_status`] |
//! | `GET /notifications` | [`OrderApi::list_notifications`] |
//! | `PATCH /notifications/{id}/read` | [`OrderApi::mark_notification_read`] |
//! | `PATCH /notifications/read-all` | [`OrderApi::mark_all_notifications_read`] |
//! | live updates | [`OrderApi::subscribe`] |
//! | snapshot fallback | [`OrderApi::snapshot`] |

use crate::bus::EventBus;
use crate::clients::NotificationService;
use crate::config::Config;
use crate::model::{
    Notification, NotificationFilter, NotificationId, Order, OrderCreate, OrderId, OrderStatus,
    OrderSummary, Snapshot, SubOrder, SubOrderId, SubOrderStatus,
};
use crate::notification_actor::NotificationError;
use crate::order_actor::{OrderError, TransitionOutcome};
use crate::query::{query_orders, OrderQuery, Page};
use crate::rate_limit::RateLimiter;
use crate::session::DashboardSession;
use crate::snapshot::LiveSnapshotSource;
use crate::store::OrderStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Body of the status update endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: SubOrderStatus,
    /// If set, the update only applies while the sub-order is still in this status.
    #[serde(default)]
    pub expected_status: Option<SubOrderStatus>,
}

/// Response of the status update endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub sub_order: SubOrder,
    pub order_status: OrderStatus,
    pub sequence: u64,
}

impl From<TransitionOutcome> for StatusChange {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            sequence: outcome.event.sequence,
            sub_order: outcome.sub_order,
            order_status: outcome.order_status,
        }
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InvalidTransition,
    Conflict,
    RateLimited,
    Unavailable,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InvalidTransition => 422,
            Self::RateLimited => 429,
            Self::Unavailable => 503,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Order(e) => match e {
                OrderError::Validation(_) => ErrorCode::ValidationError,
                OrderError::NotFound(_) => ErrorCode::NotFound,
                OrderError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
                OrderError::Conflict { .. } => ErrorCode::Conflict,
                OrderError::Unavailable(_) => ErrorCode::Unavailable,
            },
            ApiError::Notification(e) => match e {
                NotificationError::NotFound(_) => ErrorCode::NotFound,
                NotificationError::Unavailable(_) => ErrorCode::Unavailable,
            },
            ApiError::RateLimited { .. } => ErrorCode::RateLimited,
            ApiError::Unavailable(_) => ErrorCode::Unavailable,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct OrderApi {
    store: OrderStore,
    notifications: NotificationService,
    snapshots: LiveSnapshotSource,
    bus: EventBus,
    limiter: RateLimiter,
    config: Arc<Config>,
    next_session_id: Arc<AtomicU64>,
}

impl OrderApi {
    pub fn new(
        store: OrderStore,
        notifications: NotificationService,
        bus: EventBus,
        config: Arc<Config>,
    ) -> Self {
        Self {
            snapshots: LiveSnapshotSource::new(store.clone(), notifications.clone()),
            limiter: RateLimiter::new(&config.rate_limit),
            store,
            notifications,
            bus,
            config,
            next_session_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn admit(&self, caller: &str) -> Result<(), ApiError> {
        if self.limiter.check(caller) {
            return Ok(());
        }
        let retry_after_secs = self.limiter.retry_after(caller);
        warn!(caller, retry_after_secs, "Rate limited");
        Err(ApiError::RateLimited { retry_after_secs })
    }

    /// Checkout.
    #[instrument(skip(self, request))]
    pub async fn place_order(&self, caller: &str, request: OrderCreate) -> Result<Order, ApiError> {
        self.admit(caller)?;
        Ok(self.store.create_order(request).await?)
    }

    pub async fn list_orders(&self, query: OrderQuery) -> Result<Page<OrderSummary>, ApiError> {
        let orders = self.store.list_orders().await?;
        Ok(query_orders(orders, &query))
    }

    #[instrument(skip(self))]
    pub async fn update_sub_order_status(
        &self,
        caller: &str,
        order_id: OrderId,
        sub_order_id: SubOrderId,
        update: StatusUpdate,
    ) -> Result<StatusChange, ApiError> {
        self.admit(caller)?;
        if self.store.order_of(sub_order_id) != Some(order_id) {
            return Err(OrderError::NotFound(format!("{} in {}", sub_order_id, order_id)).into());
        }

        let outcome = match update.expected_status {
            Some(expected) => {
                self.store
                    .apply_transition_expecting(sub_order_id, expected, update.status)
                    .await?
            }
            None => self.store.apply_transition(sub_order_id, update.status).await?,
        };
        info!(
            %order_id,
            %sub_order_id,
            status = %outcome.sub_order.status,
            sequence = outcome.event.sequence,
            "Status updated"
        );
        Ok(outcome.into())
    }

    pub async fn list_notifications(
        &self,
        filter: NotificationFilter,
    ) -> Result<Vec<Notification>, ApiError> {
        Ok(self.notifications.list(filter).await?)
    }

    /// Returns whether the notification was unread before.
    pub async fn mark_notification_read(
        &self,
        caller: &str,
        id: NotificationId,
    ) -> Result<bool, ApiError> {
        self.admit(caller)?;
        Ok(self.notifications.mark_read(id).await?)
    }

    /// Returns how many notifications were marked.
    pub async fn mark_all_notifications_read(&self, caller: &str) -> Result<usize, ApiError> {
        self.admit(caller)?;
        Ok(self.notifications.mark_all_read().await?)
    }

    /// Opens a live dashboard session.
    pub fn subscribe(&self) -> DashboardSession {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        DashboardSession::open(
            id,
            &self.bus,
            Arc::new(self.snapshots.clone()),
            &self.config,
        )
    }

    /// One-shot authoritative read for clients that cannot hold a session open.
    pub async fn snapshot(&self) -> Result<Snapshot, ApiError> {
        self.snapshots
            .take()
            .await
            .map_err(|e| ApiError::Unavailable(e.to_string()))
    }
}
