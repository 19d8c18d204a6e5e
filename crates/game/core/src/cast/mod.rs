//! Ability cast lifecycle: the per-actor controller and its cooldown tracker.
mod controller;
mod cooldown;
mod error;

pub use controller::{AbilityCastController, NetRole};
pub use cooldown::{ActiveCooldownWatch, CooldownTracker};
pub use error::{ActivateError, CooldownError};
