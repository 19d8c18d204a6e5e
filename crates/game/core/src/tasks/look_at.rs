use glam::Vec3;
use tracing::trace;

use super::{AbilityTask, TaskContext};
use crate::env::MoveStatus;
use crate::spatial::geom;
use crate::state::ActorId;
use crate::status::{FinishLatch, TaskStatus};

/// Turns the actor in place to face a point.
///
/// The target yaw is fixed at activation; pitch and roll stay zero. The task
/// gives up as soon as the actor starts moving.
#[derive(Debug)]
pub struct LookAtLocation {
    actor: ActorId,
    target: Vec3,
    turn_rate: Option<f32>,
    target_yaw: Option<f32>,
    latch: FinishLatch,
}

impl LookAtLocation {
    pub fn new(actor: ActorId, target: Vec3) -> Self {
        Self {
            actor,
            target,
            turn_rate: None,
            target_yaw: None,
            latch: FinishLatch::new(),
        }
    }

    /// Turn rate in degrees per second.
    pub fn with_turn_rate(mut self, degrees_per_second: f32) -> Self {
        self.turn_rate = Some(degrees_per_second);
        self
    }

    pub fn target_yaw(&self) -> Option<f32> {
        self.target_yaw
    }
}

impl AbilityTask for LookAtLocation {
    fn name(&self) -> &'static str {
        "look_at_location"
    }

    fn actor(&self) -> ActorId {
        self.actor
    }

    fn activate(&mut self, ctx: &mut TaskContext<'_>) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        match ctx.world.location(self.actor) {
            Some(origin) => self.target_yaw = Some(geom::yaw_towards(origin, self.target)),
            None => {
                self.latch.finish(TaskStatus::Cancelled);
            }
        }
        self.latch.status()
    }

    fn tick(&mut self, ctx: &mut TaskContext<'_>, dt: f32) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        let (Some(target_yaw), Some(yaw)) = (self.target_yaw, ctx.world.yaw(self.actor)) else {
            self.latch.finish(TaskStatus::Cancelled);
            return self.latch.status();
        };
        // A missing movement controller cannot be moving.
        let moving = ctx
            .world
            .move_status(self.actor)
            .is_some_and(|status| status != MoveStatus::Idle);
        if moving {
            trace!(target: "cast::tasks", actor = %self.actor, "look-at interrupted by movement");
            self.latch.finish(TaskStatus::Cancelled);
            return self.latch.status();
        }

        let rate = self.turn_rate.unwrap_or(ctx.config.default_turn_rate);
        let step = rate * dt;
        let delta = geom::wrap_degrees(target_yaw - yaw);

        if delta.abs() <= step {
            ctx.world.set_yaw(self.actor, geom::wrap_degrees(target_yaw));
            self.latch.finish(TaskStatus::Completed);
        } else {
            ctx.world
                .set_yaw(self.actor, geom::wrap_degrees(yaw + step * delta.signum()));
        }
        self.latch.status()
    }

    fn cancel(&mut self, _ctx: &mut TaskContext<'_>) {
        self.latch.finish(TaskStatus::Cancelled);
    }

    fn on_destroy(&mut self, _ctx: &mut TaskContext<'_>, forced: bool) {
        if forced {
            self.latch.finish(TaskStatus::Cancelled);
        }
    }

    fn status(&self) -> TaskStatus {
        self.latch.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CastConfig;
    use crate::testing::FakeWorld;

    const ACTOR: ActorId = ActorId(2);

    #[test]
    fn turns_at_fixed_rate_then_snaps() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        let mut task = LookAtLocation::new(ACTOR, Vec3::new(0.0, 0.0, 10.0)).with_turn_rate(45.0);

        let mut ctx = TaskContext::new(&config, &mut world);
        task.activate(&mut ctx);
        assert!((task.target_yaw().unwrap() - 90.0).abs() < 1e-3);

        assert_eq!(task.tick(&mut ctx, 1.0), TaskStatus::Running);
        assert_eq!(task.tick(&mut ctx, 0.5), TaskStatus::Running);
        assert_eq!(task.tick(&mut ctx, 1.0), TaskStatus::Completed);
        assert!((world.yaw - 90.0).abs() < 1e-3);
    }

    #[test]
    fn takes_short_way_across_wraparound() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        world.yaw = 170.0;
        // Facing -170 degrees: 20 degrees away through 180.
        let target = Vec3::new(-10.0, 0.0, -10.0 * 10f32.to_radians().tan());
        let mut task = LookAtLocation::new(ACTOR, target).with_turn_rate(10.0);

        let mut ctx = TaskContext::new(&config, &mut world);
        task.activate(&mut ctx);
        task.tick(&mut ctx, 1.0);

        assert!((world.yaw - 180.0).abs() < 1e-3);
    }

    #[test]
    fn movement_cancels() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        world.status = Some(MoveStatus::Moving);
        let mut task = LookAtLocation::new(ACTOR, Vec3::new(10.0, 0.0, 10.0));

        let mut ctx = TaskContext::new(&config, &mut world);
        task.activate(&mut ctx);
        assert_eq!(task.tick(&mut ctx, 0.1), TaskStatus::Cancelled);
    }

    #[test]
    fn missing_avatar_cancels_on_activate() {
        let config = CastConfig::default();
        let mut world = FakeWorld::default();
        let mut task = LookAtLocation::new(ACTOR, Vec3::X);

        let mut ctx = TaskContext::new(&config, &mut world);
        assert_eq!(task.activate(&mut ctx), TaskStatus::Cancelled);
    }
}
