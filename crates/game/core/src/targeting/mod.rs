//! Target acquisition strategies.
//!
//! Every strategy follows the same protocol, driven by the frame scheduler:
//!
//! 1. [`TargetingStrategy::start_targeting`] arms it (crosshair, first trace)
//! 2. [`TargetingStrategy::tick`] refreshes previews every frame
//! 3. [`TargetingStrategy::confirm_targeting`] or
//!    [`TargetingStrategy::cancel_targeting`] finishes it
//!
//! A finished strategy holds exactly one [`TargetResult`], taken with
//! [`TargetingStrategy::take_result`]. Single-shot strategies (the AOE family)
//! finish inside `start_targeting`.
mod actor_pick;
mod aoe;
mod ground;

use glam::{Quat, Vec3};

use crate::config::CastConfig;
use crate::spatial::{
    CollisionChannel, Shape, SpatialBackend, SpatialQuery, TargetFilter, TargetableRegistry,
};
use crate::state::ActorId;
use crate::status::TaskStatus;

pub use actor_pick::SingleActorPick;
pub use aoe::AoeTargeting;
pub use ground::GroundPoint;

/// Cursor affordance shown while a strategy is armed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
pub enum CursorAffordance {
    #[default]
    Default,
    Crosshair,
}

/// Presentation side of targeting for the requesting actor.
pub trait TargetingHost {
    /// Aim origin and direction, or `None` when the actor no longer exists.
    fn aim_ray(&self, actor: ActorId) -> Option<(Vec3, Vec3)>;

    fn set_cursor(&mut self, actor: ActorId, cursor: CursorAffordance);

    fn set_highlighted(&mut self, target: ActorId, highlighted: bool);
}

/// Everything a strategy needs from the world.
pub trait TargetingWorld: TargetingHost {
    fn spatial(&self) -> &dyn SpatialBackend;

    fn registry(&self) -> &dyn TargetableRegistry;
}

impl<T: SpatialBackend + TargetableRegistry + TargetingHost> TargetingWorld for T {
    fn spatial(&self) -> &dyn SpatialBackend {
        self
    }

    fn registry(&self) -> &dyn TargetableRegistry {
        self
    }
}

/// Per-call context for targeting strategies.
pub struct TargetingContext<'a> {
    pub requester: ActorId,
    pub config: &'a CastConfig,
    pub world: &'a mut dyn TargetingWorld,
}

impl<'a> TargetingContext<'a> {
    pub fn new(requester: ActorId, config: &'a CastConfig, world: &'a mut dyn TargetingWorld) -> Self {
        Self {
            requester,
            config,
            world,
        }
    }

    pub fn query(&self) -> SpatialQuery<'_> {
        SpatialQuery::new(self.world.spatial(), self.world.registry())
    }

    /// Requester's aim ray clamped to the configured trace range.
    pub fn aim(&self) -> Option<crate::spatial::Ray> {
        self.world
            .aim_ray(self.requester)
            .map(|(origin, dir)| crate::spatial::Ray::new(origin, dir, self.config.trace_range))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetOutcome {
    Confirmed,
    Cancelled,
}

/// Resolved targets of one targeting operation.
///
/// `actors` is ordered and duplicate-free; it may be empty. Point results
/// carry `location`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetResult {
    pub outcome: TargetOutcome,
    pub actors: Vec<ActorId>,
    pub location: Option<Vec3>,
}

impl TargetResult {
    pub fn cancelled() -> Self {
        Self {
            outcome: TargetOutcome::Cancelled,
            actors: Vec::new(),
            location: None,
        }
    }

    pub fn point(location: Vec3) -> Self {
        Self {
            outcome: TargetOutcome::Confirmed,
            actors: Vec::new(),
            location: Some(location),
        }
    }

    pub fn actors(actors: Vec<ActorId>, location: Option<Vec3>) -> Self {
        Self {
            outcome: TargetOutcome::Confirmed,
            actors,
            location,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.outcome == TargetOutcome::Confirmed
    }
}

/// Shape request for single-shot overlap targeting.
#[derive(Clone, Debug)]
pub struct TargetRequest {
    pub location: Vec3,
    pub shape: Shape,
    /// `None` lets the strategy derive it (boxes face away from the requester).
    pub rotation: Option<Quat>,
    pub channel: CollisionChannel,
    pub filter: TargetFilter,
}

/// Whether target data is produced on this machine. Every strategy consults
/// this single function unless it overrides the trait method.
pub fn produce_target_data_locally() -> bool {
    true
}

pub trait TargetingStrategy: Send {
    fn name(&self) -> &'static str;

    fn start_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus;

    fn tick(&mut self, ctx: &mut TargetingContext<'_>, dt: f32) -> TaskStatus;

    /// Finalizes targeting. Calling it on a finished strategy has no effect.
    fn confirm_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus;

    /// Aborts targeting and produces a cancelled empty result. No effect on a
    /// finished strategy.
    fn cancel_targeting(&mut self, ctx: &mut TargetingContext<'_>);

    /// Clears any presentation state. Safe to call more than once.
    fn on_destroy(&mut self, ctx: &mut TargetingContext<'_>);

    fn status(&self) -> TaskStatus;

    fn take_result(&mut self) -> Option<TargetResult>;

    /// Whether the owner should drop the strategy once it is confirmed.
    fn destroy_on_confirmation(&self) -> bool {
        true
    }

    fn should_produce_target_data_locally(&self) -> bool {
        produce_target_data_locally()
    }
}
