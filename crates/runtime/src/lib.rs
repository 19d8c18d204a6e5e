//! Runtime orchestration for the ability-cast simulation.
//!
//! This crate wires the pure per-frame logic of `cast-core` to in-memory
//! backends, a frame scheduler and a worker task. Consumers embed [`Runtime`]
//! to drive heroes and subscribe to events through [`RuntimeHandle`], or use
//! [`Scheduler`] directly to step frames synchronously.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`scheduler`] runs one frame across heroes, targeting and tasks
//! - [`backend`] provides the in-memory world and ability system
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod backend;
pub mod events;
pub mod runtime;
pub mod scheduler;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use backend::{Collider, SimAbilitySystem, SimActor, SimWorld};
pub use events::{
    AttributeChanged, CastNotice, Event, EventBus, TargetingEvent, TaskFinished, Topic,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use scheduler::{Hero, HeroSnapshot, Request, RequestSender, Scheduler, SlotSnapshot};
