//! Order-specific resource logic: one single-writer actor per order.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::bus::EventBus;
use crate::framework::ResourceRegistry;
use crate::model::Order;

/// Creates the registry that spawns one Order actor per checkout.
///
/// Every actor receives a clone of `bus` as its context.
pub fn new(bus: EventBus, mailbox_size: usize) -> ResourceRegistry<Order> {
    ResourceRegistry::new(mailbox_size, bus)
}
