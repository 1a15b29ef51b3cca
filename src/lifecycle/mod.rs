//! Runtime orchestration and lifecycle management.
//!
//! - [`OrderSystem`] starts the bus, the order and inbox actors and the notification
//!   consumer, and tears them down in order.
//! - [`setup_tracing`] initializes logging.

pub mod order_system;
pub mod tracing;

pub use order_system::*;
pub use tracing::*;
