//! Per-actor cast state.
//!
//! This module owns the identity newtypes shared by every other module, the
//! gameplay tag containers used to match cooldown effects, and the spell slot
//! records whose state the controller exposes to HUD consumers.
pub mod error;
pub mod ids;
pub mod slot;
pub mod tags;

pub use error::StateError;
pub use ids::{AbilityHandle, AbilityId, ActorId, EffectHandle, SlotIndex, SubscriptionToken};
pub use slot::{SpellSlot, SpellSlots, SpellState};
pub use tags::{Tag, TagSet};
