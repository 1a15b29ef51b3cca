//! # Order Sync
//!
//! Order lifecycle coordination for a multi-restaurant marketplace, plus real-time
//! notification sync for restaurant owners.
//!
//! A customer checks out once; the checkout becomes one [`Order`](model::Order) split into
//! one [`SubOrder`](model::SubOrder) per restaurant. Each restaurant moves its own sub-order
//! through `pending → confirmed → preparing → ready → delivered` (or `cancelled`), and the
//! parent order's status is derived from its children.
//!
//! ## Core Concepts
//!
//! ### One actor per order
//! Every order lives in its own `ResourceActor<Order>` ([`framework`]). Transitions on one
//! order are applied one at a time, so two owners racing on the same sub-order can never
//! both succeed, while different orders progress in parallel. The validator in
//! [`transition`] is pure and used by the actor for every change.
//!
//! ### Events and sequences
//! Each accepted change is published on the [`EventBus`](bus::EventBus) with a per-order
//! sequence number. Publishing never blocks: a subscriber whose queue is full loses the
//! event and will notice the gap.
//!
//! ### Sessions heal themselves
//! A [`DashboardSession`](session::DashboardSession) applies bus events in order and polls an
//! authoritative [`Snapshot`](model::Snapshot) on a timer (and immediately on a gap). The
//! snapshot always wins for stale entries.
//!
//! ## Module Tour
//!
//! - [`framework`]: the generic resource actor, its client, registry and mocks.
//! - [`transition`]: the status state machine and aggregate derivation.
//! - [`store`] and [`order_actor`]: order creation, lookup and transitions.
//! - [`notification_actor`] and [`clients`]: the owner inbox and the order-event consumer.
//! - [`bus`]: non-blocking fan-out with per-subscriber queues.
//! - [`session`], [`poller`], [`snapshot`]: dashboard views and reconciliation.
//! - [`query`]: filtering and pagination of the order list.
//! - [`api`], [`rate_limit`], [`config`]: the request surface and its settings.
//! - [`lifecycle`]: wiring, shutdown and tracing setup.
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod api;
pub mod bus;
pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod notification_actor;
pub mod order_actor;
pub mod poller;
pub mod query;
pub mod rate_limit;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod transition;
