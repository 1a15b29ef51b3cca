//! Type-safe identifiers.
//!
//! Every aggregate gets its own id newtype so an `OrderId` can never be passed where a
//! `SubOrderId` is expected. Ids are allocated from `u32` counters and displayed with a
//! readable prefix (`order_7`, `sub_12`).

use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

typed_id!(
    /// Identifier of a customer checkout.
    OrderId,
    "order"
);
typed_id!(
    /// Identifier of the per-restaurant part of an order.
    SubOrderId,
    "sub"
);
typed_id!(
    /// Identifier of a notification record.
    NotificationId,
    "notif"
);
typed_id!(
    /// Identifier of the notification inbox actor.
    InboxId,
    "inbox"
);

/// Identifier of a restaurant. Owned by the restaurant directory, opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(pub String);

impl RestaurantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
