use glam::Vec3;
use tracing::trace;

use super::{CursorAffordance, TargetResult, TargetingContext, TargetingStrategy};
use crate::spatial::{CollisionChannel, TargetFilter};
use crate::state::ActorId;
use crate::status::{FinishLatch, TaskStatus};

/// Picks the single targetable actor under the requester's aim.
///
/// The candidate under the crosshair is highlighted while targeting runs.
/// Every highlighted actor is unhighlighted exactly once, either when the
/// candidate changes or when the strategy finishes.
#[derive(Debug, Default)]
pub struct SingleActorPick {
    filter: TargetFilter,
    latch: FinishLatch,
    highlighted: Option<ActorId>,
    endpoint: Option<Vec3>,
    result: Option<TargetResult>,
}

impl SingleActorPick {
    pub fn new(filter: TargetFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn highlighted(&self) -> Option<ActorId> {
        self.highlighted
    }

    /// Traces on the targetable channel and swaps the highlight if needed.
    /// Returns false when the requester can no longer aim.
    fn refresh(&mut self, ctx: &mut TargetingContext<'_>) -> bool {
        let Some(ray) = ctx.aim() else {
            return false;
        };
        let query = ctx.query();
        let hit = query.line_trace(&ray, CollisionChannel::TARGETABLE);
        self.endpoint = Some(hit.map_or_else(|| ray.end(), |hit| hit.impact_point));

        let candidate = hit
            .and_then(|hit| hit.actor)
            .filter(|actor| query.targetable(*actor).is_some())
            .filter(|actor| self.filter.accepts(*actor));

        if candidate != self.highlighted {
            self.set_highlight(ctx, candidate);
        }
        true
    }

    fn set_highlight(&mut self, ctx: &mut TargetingContext<'_>, next: Option<ActorId>) {
        if let Some(previous) = self.highlighted.take() {
            ctx.world.set_highlighted(previous, false);
        }
        if let Some(actor) = next {
            ctx.world.set_highlighted(actor, true);
        }
        trace!(target: "cast::targeting", requester = %ctx.requester, highlighted = ?next, "pick candidate");
        self.highlighted = next;
    }

    fn finish(&mut self, ctx: &mut TargetingContext<'_>, result: TargetResult) {
        let status = if result.is_confirmed() {
            TaskStatus::Completed
        } else {
            TaskStatus::Cancelled
        };
        if self.latch.finish(status) {
            self.set_highlight(ctx, None);
            ctx.world.set_cursor(ctx.requester, CursorAffordance::Default);
            self.result = Some(result);
        }
    }
}

impl TargetingStrategy for SingleActorPick {
    fn name(&self) -> &'static str {
        "single_actor_pick"
    }

    fn start_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus {
        if self.latch.status().is_running() {
            ctx.world.set_cursor(ctx.requester, CursorAffordance::Crosshair);
            self.refresh(ctx);
        }
        self.latch.status()
    }

    fn tick(&mut self, ctx: &mut TargetingContext<'_>, _dt: f32) -> TaskStatus {
        if self.latch.status().is_running() && !self.refresh(ctx) {
            self.finish(ctx, TargetResult::cancelled());
        }
        self.latch.status()
    }

    fn confirm_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        if !self.refresh(ctx) {
            self.finish(ctx, TargetResult::cancelled());
            return self.latch.status();
        }
        let query = ctx.query();
        let result = match self.highlighted.and_then(|actor| query.targetable(actor)) {
            Some(target) => TargetResult::actors(vec![target.actor], Some(target.location)),
            // Nothing pickable: fall back to the trace endpoint.
            None => match self.endpoint {
                Some(point) => TargetResult::point(point),
                None => TargetResult::cancelled(),
            },
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

    fn destroy_on_confirmation(&self) -> bool {
        false
    }
}
