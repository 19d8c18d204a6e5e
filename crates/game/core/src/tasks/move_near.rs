use glam::Vec3;
use tracing::debug;

use super::{AbilityTask, TaskContext};
use crate::env::{MoveRequestResult, MoveResult};
use crate::state::{ActorId, SubscriptionToken};
use crate::status::{FinishLatch, TaskStatus};

/// Moves the actor to within `acceptance_radius` of a point.
///
/// Blocked and off-path results re-issue the same request, up to
/// `max_move_retries` times.
#[derive(Debug)]
pub struct MoveNearLocation {
    actor: ActorId,
    goal: Vec3,
    acceptance_radius: Option<f32>,
    retries: u32,
    subscription: Option<SubscriptionToken>,
    latch: FinishLatch,
}

impl MoveNearLocation {
    pub fn new(actor: ActorId, goal: Vec3) -> Self {
        Self {
            actor,
            goal,
            acceptance_radius: None,
            retries: 0,
            subscription: None,
            latch: FinishLatch::new(),
        }
    }

    pub fn with_acceptance_radius(mut self, radius: f32) -> Self {
        self.acceptance_radius = Some(radius);
        self
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn issue(&mut self, ctx: &mut TaskContext<'_>) {
        let radius = self
            .acceptance_radius
            .unwrap_or(ctx.config.default_acceptance_radius);
        match ctx.world.move_to_location(self.actor, self.goal, radius) {
            MoveRequestResult::AlreadyAtGoal => self.finish(ctx, TaskStatus::Completed),
            MoveRequestResult::Failed => {
                debug!(target: "cast::tasks", actor = %self.actor, "move request failed");
                self.finish(ctx, TaskStatus::Cancelled);
            }
            MoveRequestResult::RequestSuccessful => {
                if self.subscription.is_none() {
                    self.subscription = ctx.world.subscribe_move_completed(self.actor);
                }
            }
        }
    }

    fn finish(&mut self, ctx: &mut TaskContext<'_>, status: TaskStatus) {
        if self.latch.finish(status) {
            self.release(ctx);
        }
    }

    fn release(&mut self, ctx: &mut TaskContext<'_>) {
        if let Some(token) = self.subscription.take() {
            ctx.world.unsubscribe_move_completed(self.actor, token);
        }
    }
}

impl AbilityTask for MoveNearLocation {
    fn name(&self) -> &'static str {
        "move_near_location"
    }

    fn actor(&self) -> ActorId {
        self.actor
    }

    fn activate(&mut self, ctx: &mut TaskContext<'_>) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        if ctx.world.location(self.actor).is_none() || !ctx.world.has_controller(self.actor) {
            debug!(target: "cast::tasks", actor = %self.actor, "no avatar or controller");
            self.finish(ctx, TaskStatus::Cancelled);
            return self.latch.status();
        }
        self.issue(ctx);
        self.latch.status()
    }

    fn tick(&mut self, ctx: &mut TaskContext<'_>, _dt: f32) -> TaskStatus {
        if self.latch.status().is_running() && ctx.world.location(self.actor).is_none() {
            self.finish(ctx, TaskStatus::Cancelled);
        }
        self.latch.status()
    }

    fn on_move_completed(&mut self, ctx: &mut TaskContext<'_>, result: MoveResult) -> TaskStatus {
        if self.latch.status().is_finished() || self.subscription.is_none() {
            return self.latch.status();
        }
        match result {
            MoveResult::Success => self.finish(ctx, TaskStatus::Completed),
            MoveResult::Blocked | MoveResult::OffPath => {
                if self.retries < ctx.config.max_move_retries {
                    self.retries += 1;
                    debug!(
                        target: "cast::tasks",
                        actor = %self.actor,
                        %result,
                        attempt = self.retries,
                        "re-issuing move"
                    );
                    self.issue(ctx);
                } else {
                    self.finish(ctx, TaskStatus::Cancelled);
                }
            }
            MoveResult::Aborted | MoveResult::Invalid => self.finish(ctx, TaskStatus::Cancelled),
        }
        self.latch.status()
    }

    fn cancel(&mut self, ctx: &mut TaskContext<'_>) {
        self.finish(ctx, TaskStatus::Cancelled);
    }

    fn on_destroy(&mut self, ctx: &mut TaskContext<'_>, forced: bool) {
        if forced {
            self.latch.finish(TaskStatus::Cancelled);
        }
        self.release(ctx);
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

    const ACTOR: ActorId = ActorId(4);

    #[test]
    fn no_controller_cancels_immediately() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        world.has_controller = false;
        let mut ctx = TaskContext::new(&config, &mut world);
        let mut task = MoveNearLocation::new(ACTOR, Vec3::new(10.0, 0.0, 0.0));

        assert_eq!(task.activate(&mut ctx), TaskStatus::Cancelled);
        assert_eq!(world.move_requests, 0);
    }

    #[test]
    fn already_at_goal_completes_synchronously() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        world.request_result = Some(MoveRequestResult::AlreadyAtGoal);
        let mut ctx = TaskContext::new(&config, &mut world);
        let mut task = MoveNearLocation::new(ACTOR, Vec3::ZERO);

        assert_eq!(task.activate(&mut ctx), TaskStatus::Completed);
        assert_eq!(world.live_subscriptions, 0);
    }

    #[test]
    fn blocked_moves_retry_until_exhausted() {
        let config = CastConfig::default().with_max_move_retries(2);
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        let mut ctx = TaskContext::new(&config, &mut world);
        let mut task = MoveNearLocation::new(ACTOR, Vec3::new(100.0, 0.0, 0.0));

        assert_eq!(task.activate(&mut ctx), TaskStatus::Running);
        assert_eq!(task.on_move_completed(&mut ctx, MoveResult::Blocked), TaskStatus::Running);
        assert_eq!(task.on_move_completed(&mut ctx, MoveResult::OffPath), TaskStatus::Running);
        assert_eq!(
            task.on_move_completed(&mut ctx, MoveResult::Blocked),
            TaskStatus::Cancelled
        );

        assert_eq!(task.retries(), 2);
        assert_eq!(world.move_requests, 3);
        assert_eq!(world.live_subscriptions, 0);
    }

    #[test]
    fn success_after_retry_completes() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        let mut ctx = TaskContext::new(&config, &mut world);
        let mut task = MoveNearLocation::new(ACTOR, Vec3::new(100.0, 0.0, 0.0));

        task.activate(&mut ctx);
        task.on_move_completed(&mut ctx, MoveResult::Blocked);
        assert_eq!(task.on_move_completed(&mut ctx, MoveResult::Success), TaskStatus::Completed);
        // Late callbacks and cancels are absorbed.
        task.cancel(&mut ctx);
        assert_eq!(task.on_move_completed(&mut ctx, MoveResult::Aborted), TaskStatus::Completed);
    }

    #[test]
    fn forced_destroy_releases_subscription() {
        let config = CastConfig::default();
        let mut world = FakeWorld::with_avatar(Vec3::ZERO);
        let mut ctx = TaskContext::new(&config, &mut world);
        let mut task = MoveNearLocation::new(ACTOR, Vec3::new(100.0, 0.0, 0.0));

        task.activate(&mut ctx);
        task.on_destroy(&mut ctx, true);
        task.on_destroy(&mut ctx, true);

        assert_eq!(task.status(), TaskStatus::Cancelled);
        assert_eq!(world.live_subscriptions, 0);
    }
}
