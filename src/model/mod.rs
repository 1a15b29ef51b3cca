//! Pure data structures: the aggregates owned by actors and the DTOs around them.

pub mod event;
pub mod ids;
pub mod notification;
pub mod order;
pub mod snapshot;
pub mod status;

pub use event::*;
pub use ids::*;
pub use notification::*;
pub use order::*;
pub use snapshot::*;
pub use status::*;
