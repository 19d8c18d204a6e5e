//! In-memory implementations of the collaborators `cast-core` consumes.
//!
//! [`SimAbilitySystem`] plays the ability-execution, duration-effect and
//! attribute systems for one actor; [`SimWorld`] plays the spatial backend,
//! the targetable registry, the targeting host, actor transforms and
//! navigation for every actor. Both are driven by the frame scheduler and
//! never advance on their own.
mod ability_system;
mod world;

pub use ability_system::SimAbilitySystem;
pub use world::{Collider, SimActor, SimWorld};
