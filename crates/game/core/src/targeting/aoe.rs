use glam::{Quat, Vec3};
use tracing::debug;

use super::{TargetRequest, TargetResult, TargetingContext, TargetingStrategy};
use crate::spatial::{CollisionChannel, Shape, TargetFilter, geom};
use crate::status::{FinishLatch, TaskStatus};

/// Single-shot overlap targeting: sphere, box or capsule.
///
/// The overlap runs once in `start_targeting` and the result is available
/// right after it returns.
#[derive(Debug)]
pub struct AoeTargeting {
    request: TargetRequest,
    half_height_from_config: bool,
    latch: FinishLatch,
    result: Option<TargetResult>,
}

impl AoeTargeting {
    pub fn new(request: TargetRequest) -> Self {
        Self {
            request,
            half_height_from_config: false,
            latch: FinishLatch::new(),
            result: None,
        }
    }

    pub fn sphere(location: Vec3, radius: f32, filter: TargetFilter) -> Self {
        Self::new(TargetRequest {
            location,
            shape: Shape::Sphere { radius },
            rotation: Some(Quat::IDENTITY),
            channel: CollisionChannel::PAWN,
            filter,
        })
    }

    /// Box oriented along the look-at from the requester to `location`.
    pub fn boxed(location: Vec3, half_extents: Vec3, filter: TargetFilter) -> Self {
        Self::new(TargetRequest {
            location,
            shape: Shape::Box { half_extents },
            rotation: None,
            channel: CollisionChannel::PAWN,
            filter,
        })
    }

    /// Upright capsule; `half_height` falls back to the configured default.
    pub fn capsule(
        location: Vec3,
        radius: f32,
        half_height: Option<f32>,
        filter: TargetFilter,
    ) -> Self {
        Self {
            half_height_from_config: half_height.is_none(),
            ..Self::new(TargetRequest {
                location,
                shape: Shape::Capsule {
                    radius,
                    half_height: half_height.unwrap_or_default(),
                },
                rotation: Some(Quat::IDENTITY),
                channel: CollisionChannel::PAWN,
                filter,
            })
        }
    }

    pub fn request(&self) -> &TargetRequest {
        &self.request
    }

    fn resolve_shape(&self, ctx: &TargetingContext<'_>) -> Shape {
        match self.request.shape {
            Shape::Capsule { radius, .. } if self.half_height_from_config => Shape::Capsule {
                radius,
                half_height: ctx.config.capsule_half_height,
            },
            shape => shape,
        }
    }

    fn resolve_rotation(&self, ctx: &TargetingContext<'_>) -> Quat {
        if let Some(rotation) = self.request.rotation {
            return rotation;
        }
        match ctx.world.aim_ray(ctx.requester) {
            Some((origin, _)) => geom::look_at_rotation(origin, self.request.location),
            None => Quat::IDENTITY,
        }
    }
}

impl TargetingStrategy for AoeTargeting {
    fn name(&self) -> &'static str {
        match self.request.shape {
            Shape::Sphere { .. } => "sphere_aoe",
            Shape::Box { .. } => "box_aoe",
            Shape::Capsule { .. } => "capsule_aoe",
        }
    }

    fn start_targeting(&mut self, ctx: &mut TargetingContext<'_>) -> TaskStatus {
        if self.latch.status().is_finished() {
            return self.latch.status();
        }
        let shape = self.resolve_shape(ctx);
        let rotation = self.resolve_rotation(ctx);
        let actors = ctx.query().overlap_actors(
            &shape,
            self.request.location,
            rotation,
            self.request.channel,
            &self.request.filter,
        );
        debug!(
            target: "cast::targeting",
            requester = %ctx.requester,
            strategy = self.name(),
            targets = actors.len(),
            "aoe resolved"
        );
        if self.latch.finish(TaskStatus::Completed) {
            self.result = Some(TargetResult::actors(actors, Some(self.request.location)));
        }
        self.latch.status()
    }

    fn tick(&mut self, _ctx: &mut TargetingContext<'_>, _dt: f32) -> TaskStatus {
        self.latch.status()
    }

    fn confirm_targeting(&mut self, _ctx: &mut TargetingContext<'_>) -> TaskStatus {
        self.latch.status()
    }

    fn cancel_targeting(&mut self, _ctx: &mut TargetingContext<'_>) {
        if self.latch.finish(TaskStatus::Cancelled) {
            self.result = Some(TargetResult::cancelled());
        }
    }

    fn on_destroy(&mut self, ctx: &mut TargetingContext<'_>) {
        self.cancel_targeting(ctx);
    }

    fn status(&self) -> TaskStatus {
        self.latch.status()
    }

    fn take_result(&mut self) -> Option<TargetResult> {
        self.result.take()
    }
}
