//! Ability-cast lifecycle, targeting and multi-frame ability tasks.
//!
//! `cast-core` holds the pure per-frame logic: the slot controller and its
//! cooldown tracker, the targeting strategies with the spatial query they
//! drive, and the task runner. It owns no clock and performs no I/O; every
//! external collaborator is reached through the traits in [`env`],
//! [`spatial`] and [`targeting`], and the caller drives everything frame by
//! frame.
pub mod cast;
pub mod config;
pub mod env;
pub mod error;
pub mod events;
pub mod spatial;
pub mod state;
pub mod status;
pub mod targeting;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

pub use cast::{
    AbilityCastController, ActivateError, ActiveCooldownWatch, CooldownError, CooldownTracker,
    NetRole,
};
pub use config::CastConfig;
pub use env::{
    AbilityNotification, AbilitySpecInfo, AbilitySystem, AbilitySystemComponent,
    ActiveEffectInfo, Attribute, AttributeStore, AvatarAccess, CastEnv, EffectQuery, EffectSpec,
    EffectSystem, EnvError, MoveRequestResult, MoveResult, MoveStatus, Navigation,
};
pub use error::{CastError, ErrorContext, ErrorSeverity};
pub use events::{CastEvent, Observers};
pub use spatial::{
    CollisionChannel, HitResult, OverlapHit, Ray, Shape, SpatialBackend, SpatialQuery,
    TargetFilter, Targetable, TargetableRegistry,
};
pub use state::{
    AbilityHandle, AbilityId, ActorId, EffectHandle, SlotIndex, SpellSlot, SpellState,
    StateError, SubscriptionToken, Tag, TagSet,
};
pub use status::{FinishLatch, TaskStatus};
pub use targeting::{
    AoeTargeting, CursorAffordance, GroundPoint, SingleActorPick, TargetOutcome, TargetRequest,
    TargetResult, TargetingContext, TargetingHost, TargetingStrategy, TargetingWorld,
};
pub use tasks::{
    AbilityTask, AsyncTaskHandle, LookAtLocation, MoveNearLocation, TaskContext, TaskEvent,
    TaskRunner, TaskWorld,
};
