use glam::Vec3;
use tracing::debug;

use super::{CursorAffordance, TargetResult, TargetingContext, TargetingStrategy};
use crate::spatial::CollisionChannel;
use crate::status::{FinishLatch, TaskStatus};

/// Picks a ground point under the requester's aim.
///
/// Each tick traces along the aim ray on the visibility channel. Confirming
/// emits the impact point, or the ray end when nothing blocks the trace.
#[derive(Debug, Default)]
pub struct GroundPoint {
    latch: FinishLatch,
    preview: Option<Vec3>,
    result: Option<TargetResult>,
}

impl GroundPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last previewed point, if any trace has run.
    pub fn preview(&self) -> Option<Vec3> {
        self.preview
    }

    fn trace(&mut self, ctx: &TargetingContext<'_>) -> Option<Vec3> {
        let ray = ctx.aim()?;
        let point = ctx
            .query()
            .line_trace(&ray, CollisionChannel::VISIBILITY)
            .map_or_else(|| ray.end(), |hit| hit.impact_point);
        self.preview = Some(point);
        Some(point)
    }

    fn finish(&mut self, ctx: &mut TargetingContext<'_>, result: TargetResult) {
        let status = if result.is_confirmed() {
            TaskStatus::Completed
        } else {
            TaskStatus::Cancelled
        };
        if self.latch.finish(status) {
            ctx.world.set_cursor(ctx.requester, CursorAffordance::Default);
            self.result = Some(result);
        }
    }
}

impl TargetingStrategy for GroundPoint {
    fn name(&self) -> &'static str {
        "ground_point"
    }

    fn start_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        ctx.world.set_cursor(ctx.requester, CursorAffordance::Crosshair);
        self.trace(ctx);
        self.latch.status()
    }

    fn tick(&mut self, ctx: &mut TargetingContext<'_>, _dt: f32) -> TaskStatus {
        if self.latch.status().is_running() && self.trace(ctx).is_none() {
            debug!(target: "cast::targeting", requester = %ctx.requester, "aim lost");
            self.finish(ctx, TargetResult::cancelled());
        }
        self.latch.status()
    }

    fn confirm_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        let result = match self.trace(ctx) {
            Some(point) => TargetResult::point(point),
            None => TargetResult::cancelled(),
        };
        self.finish(ctx, result);
        self.latch.status()
    }

    fn cancel_targeting(&mut self, ctx: &mut TargetingContext<'_>) {
        self.finish(ctx, TargetResult::cancelled());
    }

    fn on_destroy(&mut self, ctx: &mut TargetingContext<'_>) {
        self.finish(ctx, TargetResult::cancelled());
    }

    fn status(&self) -> TaskStatus {
        self.latch.status()
    }

    fn take_result(&mut self) -> Option<TargetResult> {
        self.result.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CastConfig;
    use crate::state::ActorId;
    use crate::testing::FakeTargetWorld;

    const CASTER: ActorId = ActorId(1);

    #[test]
    fn confirm_without_hit_yields_ray_end() {
        let config = CastConfig::default();
        let mut world = FakeTargetWorld::aiming(Vec3::new(0.0, 10.0, 0.0), Vec3::X);
        let mut ctx = TargetingContext::new(CASTER, &config, &mut world);
        let mut strategy = GroundPoint::new();

        assert_eq!(strategy.start_targeting(&mut ctx), TaskStatus::Running);
        assert_eq!(strategy.confirm_targeting(&mut ctx), TaskStatus::Completed);

        let result = strategy.take_result().unwrap();
        assert!(result.actors.is_empty());
        assert_eq!(result.location, Some(Vec3::new(2000.0, 10.0, 0.0)));
    }

    #[test]
    fn confirm_hits_ground_plane() {
        let config = CastConfig::default();
        let mut world =
            FakeTargetWorld::aiming(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        world.ground_y = Some(0.0);
        let mut ctx = TargetingContext::new(CASTER, &config, &mut world);
        let mut strategy = GroundPoint::new();

        strategy.start_targeting(&mut ctx);
        strategy.confirm_targeting(&mut ctx);

        let point = strategy.take_result().unwrap().location.unwrap();
        assert!((point - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-3);
        assert_eq!(world.cursor, CursorAffordance::Default);
    }

    #[test]
    fn cancel_emits_single_empty_result() {
        let config = CastConfig::default();
        let mut world = FakeTargetWorld::aiming(Vec3::ZERO, Vec3::X);
        let mut ctx = TargetingContext::new(CASTER, &config, &mut world);
        let mut strategy = GroundPoint::new();

        strategy.start_targeting(&mut ctx);
        strategy.cancel_targeting(&mut ctx);
        strategy.cancel_targeting(&mut ctx);
        strategy.confirm_targeting(&mut ctx);

        assert_eq!(strategy.take_result(), Some(TargetResult::cancelled()));
        assert_eq!(strategy.take_result(), None);
        assert_eq!(strategy.status(), TaskStatus::Cancelled);
    }
}
