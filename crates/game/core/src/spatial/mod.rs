//! Shape and ray queries against the world.
//!
//! The world itself lives behind [`SpatialBackend`]. [`SpatialQuery`] layers
//! the targeting rules on top: deduplicate by actor identity, keep actors the
//! [`TargetableRegistry`] knows, then apply the caller's [`TargetFilter`].
mod filter;
pub mod geom;
mod query;

use glam::{Quat, Vec3};

use crate::state::ActorId;

pub use filter::TargetFilter;
pub use query::SpatialQuery;

bitflags::bitflags! {
    /// Collision channels a primitive responds to.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionChannel: u8 {
        const VISIBILITY   = 0b0000_0001;
        const WORLD_STATIC = 0b0000_0010;
        const PAWN         = 0b0000_0100;
        const TARGETABLE   = 0b0000_1000;
    }
}

/// Overlap volume. Orientation is supplied separately.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    /// Axis along local +Y; `half_height` includes the caps.
    Capsule { radius: f32, half_height: f32 },
}

impl Shape {
    /// True if a sphere primitive touches this shape placed at
    /// `center`/`rotation`.
    pub fn touches_sphere(
        &self,
        center: Vec3,
        rotation: Quat,
        sphere_center: Vec3,
        sphere_radius: f32,
    ) -> bool {
        match *self {
            Shape::Sphere { radius } => {
                let reach = radius + sphere_radius;
                center.distance_squared(sphere_center) <= reach * reach
            }
            Shape::Box { half_extents } => {
                geom::obb_touches_sphere(center, rotation, half_extents, sphere_center, sphere_radius)
            }
            Shape::Capsule {
                radius,
                half_height,
            } => geom::capsule_touches_sphere(
                center,
                rotation,
                radius,
                half_height,
                sphere_center,
                sphere_radius,
            ),
        }
    }
}

/// Normalized ray with a maximum length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
        }
    }

    /// Point at `max_distance` along the ray.
    pub fn end(&self) -> Vec3 {
        self.at(self.max_distance)
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Blocking hit returned by a line trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitResult {
    /// Actor owning the hit primitive; `None` for world geometry.
    pub actor: Option<ActorId>,
    pub impact_point: Vec3,
    pub distance: f32,
}

/// One primitive overlapping a query shape. An actor with several primitives
/// can appear more than once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapHit {
    pub actor: ActorId,
    pub primitive: u32,
}

/// World-side collision queries.
pub trait SpatialBackend {
    /// Nearest blocking hit along `ray` on `channel`.
    fn line_trace(&self, ray: &Ray, channel: CollisionChannel) -> Option<HitResult>;

    /// Every primitive on `channel` touching `shape`, in backend order.
    fn overlap(
        &self,
        shape: &Shape,
        center: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
    ) -> Vec<OverlapHit>;
}

/// Capability view of an actor that can be targeted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Targetable {
    pub actor: ActorId,
    pub location: Vec3,
}

/// Resolves actors to their targetable capability.
pub trait TargetableRegistry {
    fn try_get_targetable(&self, actor: ActorId) -> Option<Targetable>;
}
