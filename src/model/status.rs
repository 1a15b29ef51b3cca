//! Sub-order and order status vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Status of one restaurant's part of an order.
///
/// Variants are declared in fulfilment order; [`SubOrderStatus::progress`] exposes that order
/// for the least-advanced rule in [`derive_order_status`](crate::transition::derive_order_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubOrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl SubOrderStatus {
    /// Every status, in declaration order.
    pub const ALL: [SubOrderStatus; 7] = [
        SubOrderStatus::Pending,
        SubOrderStatus::Confirmed,
        SubOrderStatus::Preparing,
        SubOrderStatus::Ready,
        SubOrderStatus::OnTheWay,
        SubOrderStatus::Delivered,
        SubOrderStatus::Cancelled,
    ];

    /// `delivered` and `cancelled` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, SubOrderStatus::Delivered | SubOrderStatus::Cancelled)
    }

    /// Position along the fulfilment path. Only meaningful for non-terminal statuses.
    pub fn progress(self) -> u8 {
        match self {
            SubOrderStatus::Pending => 0,
            SubOrderStatus::Confirmed => 1,
            SubOrderStatus::Preparing => 2,
            SubOrderStatus::Ready => 3,
            SubOrderStatus::OnTheWay => 4,
            SubOrderStatus::Delivered => 5,
            SubOrderStatus::Cancelled => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubOrderStatus::Pending => "pending",
            SubOrderStatus::Confirmed => "confirmed",
            SubOrderStatus::Preparing => "preparing",
            SubOrderStatus::Ready => "ready",
            SubOrderStatus::OnTheWay => "on_the_way",
            SubOrderStatus::Delivered => "delivered",
            SubOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for SubOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer-facing status of a whole order.
///
/// Always derived from the sub-order statuses, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OnTheWay,
    Delivered,
    Cancelled,
    /// Every sub-order is terminal, some delivered and some cancelled.
    PartiallyFulfilled,
}

impl OrderStatus {
    /// Whether every sub-order has reached a terminal status.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::PartiallyFulfilled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OnTheWay => "on_the_way",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::PartiallyFulfilled => "partially_fulfilled",
        }
    }
}

impl From<SubOrderStatus> for OrderStatus {
    fn from(status: SubOrderStatus) -> Self {
        match status {
            SubOrderStatus::Pending => OrderStatus::Pending,
            SubOrderStatus::Confirmed => OrderStatus::Confirmed,
            SubOrderStatus::Preparing => OrderStatus::Preparing,
            SubOrderStatus::Ready => OrderStatus::Ready,
            SubOrderStatus::OnTheWay => OrderStatus::OnTheWay,
            SubOrderStatus::Delivered => OrderStatus::Delivered,
            SubOrderStatus::Cancelled => OrderStatus::Cancelled,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
