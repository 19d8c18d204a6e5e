use glam::{Quat, Vec3};
use tracing::trace;

use super::{CollisionChannel, HitResult, Ray, Shape, SpatialBackend, TargetFilter, TargetableRegistry};
use crate::state::ActorId;

/// Targeting view over a spatial backend and the targetable registry.
///
/// Stateless: every call is a pure function of world state and arguments.
#[derive(Clone, Copy)]
pub struct SpatialQuery<'a> {
    backend: &'a dyn SpatialBackend,
    registry: &'a dyn TargetableRegistry,
}

impl<'a> SpatialQuery<'a> {
    pub fn new(backend: &'a dyn SpatialBackend, registry: &'a dyn TargetableRegistry) -> Self {
        Self { backend, registry }
    }

    pub fn line_trace(&self, ray: &Ray, channel: CollisionChannel) -> Option<HitResult> {
        self.backend.line_trace(ray, channel)
    }

    /// Resolves `actor` if it is a valid target.
    pub fn targetable(&self, actor: ActorId) -> Option<super::Targetable> {
        self.registry.try_get_targetable(actor)
    }

    /// Overlaps `shape` and returns eligible, filtered actors.
    ///
    /// The result keeps first-seen order and holds each actor once, however
    /// many of its primitives overlapped. The filter sees deduplicated actors
    /// only.
    pub fn overlap_actors(
        &self,
        shape: &Shape,
        center: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
        filter: &TargetFilter,
    ) -> Vec<ActorId> {
        let hits = self.backend.overlap(shape, center, rotation, channel);
        let raw = hits.len();

        let mut unique: Vec<ActorId> = Vec::with_capacity(raw);
        for hit in hits {
            if !unique.contains(&hit.actor) {
                unique.push(hit.actor);
            }
        }

        let actors: Vec<ActorId> = unique
            .into_iter()
            .filter(|actor| self.registry.try_get_targetable(*actor).is_some())
            .filter(|actor| filter.accepts(*actor))
            .collect();

        trace!(
            target: "cast::targeting",
            ?shape,
            raw,
            kept = actors.len(),
            "overlap resolved"
        );
        actors
    }
}
