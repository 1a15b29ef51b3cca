use crate::model::OrderSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authoritative read of everything a dashboard shows.
///
/// Served by the snapshot fallback endpoint and fetched by the reconciliation poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Every order with its derived status and event sequence.
    pub orders: Vec<OrderSummary>,
    pub unread_count: usize,
    pub notification_revision: u64,
    pub taken_at: DateTime<Utc>,
}
