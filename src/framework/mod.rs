//! Generic single-writer actor framework.
//!
//! This module provides the building blocks every aggregate in the crate runs on: one Tokio
//! task per aggregate, a typed mailbox, and a cheap cloneable client.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that aggregates implement to be owned by an actor
//! - [`ResourceActor`] - The actor loop owning one aggregate
//! - [`ResourceClient`] - Typed handle for sending requests to one actor
//! - [`ResourceRegistry`] - Spawns actors and routes ids to clients
//! - [`FrameworkError`] - Plumbing errors, plus boxed entity errors
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod registry;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
pub use registry::ResourceRegistry;
