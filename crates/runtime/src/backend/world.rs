//! In-memory world: actor transforms, sphere colliders, a ground plane and
//! straight-line movement controllers.
//!
//! Actors collide as one or more spheres. Movement ignores obstacles; a
//! blocked or off-path outcome can be scripted per actor with
//! [`SimWorld::script_move_result`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use cast_core::spatial::geom;
use cast_core::{
    ActorId, AvatarAccess, CollisionChannel, CursorAffordance, HitResult, MoveRequestResult,
    MoveResult, MoveStatus, Navigation, OverlapHit, Ray, Shape, SpatialBackend, SubscriptionToken,
    Targetable, TargetableRegistry, TargetingHost,
};
use glam::{Quat, Vec3};
use tracing::{debug, trace};

/// Sphere collider attached to an actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub offset: Vec3,
    pub radius: f32,
}

#[derive(Clone, Debug)]
struct Mover {
    speed: f32,
    status: MoveStatus,
    goal: Option<(Vec3, f32)>,
    subscribers: BTreeSet<SubscriptionToken>,
    scripted: VecDeque<MoveResult>,
}

impl Mover {
    fn new(speed: f32) -> Self {
        Self {
            speed,
            status: MoveStatus::Idle,
            goal: None,
            subscribers: BTreeSet::new(),
            scripted: VecDeque::new(),
        }
    }

    fn stop(&mut self) {
        self.status = MoveStatus::Idle;
        self.goal = None;
    }
}

/// One actor placed in a [`SimWorld`].
#[derive(Clone, Debug)]
pub struct SimActor {
    location: Vec3,
    yaw: f32,
    eye_height: f32,
    colliders: Vec<Collider>,
    channels: CollisionChannel,
    targetable: bool,
    mover: Option<Mover>,
    aim: Option<Vec3>,
    cursor: CursorAffordance,
    highlighted: bool,
}

impl SimActor {
    pub fn new(location: Vec3) -> Self {
        Self {
            location,
            yaw: 0.0,
            eye_height: 0.0,
            colliders: Vec::new(),
            channels: CollisionChannel::VISIBILITY | CollisionChannel::PAWN,
            targetable: false,
            mover: None,
            aim: None,
            cursor: CursorAffordance::Default,
            highlighted: false,
        }
    }

    /// Targetable pawn with a single body sphere.
    pub fn pawn(location: Vec3, radius: f32) -> Self {
        Self::new(location).with_collider(Vec3::ZERO, radius).targetable()
    }

    pub fn with_collider(mut self, offset: Vec3, radius: f32) -> Self {
        self.colliders.push(Collider { offset, radius });
        self
    }

    pub fn targetable(mut self) -> Self {
        self.targetable = true;
        self.channels |= CollisionChannel::TARGETABLE;
        self
    }

    pub fn with_channels(mut self, channels: CollisionChannel) -> Self {
        self.channels = channels;
        self
    }

    /// Gives the actor a movement controller moving at `speed` units per second.
    pub fn with_mover(mut self, speed: f32) -> Self {
        self.mover = Some(Mover::new(speed));
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = geom::wrap_degrees(yaw);
        self
    }

    pub fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn cursor(&self) -> CursorAffordance {
        self.cursor
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_targetable(&self) -> bool {
        self.targetable
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.cos(), 0.0, yaw.sin())
    }
}

/// World backend shared by targeting and tasks.
#[derive(Debug, Default)]
pub struct SimWorld {
    actors: BTreeMap<ActorId, SimActor>,
    next_actor: u32,
    next_token: u64,
    ground_height: Option<f32>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an infinite ground plane at `y = height`, blocking visibility and
    /// world-static traces.
    pub fn with_ground(mut self, height: f32) -> Self {
        self.ground_height = Some(height);
        self
    }

    pub fn spawn(&mut self, actor: SimActor) -> ActorId {
        self.next_actor += 1;
        let id = ActorId(self.next_actor);
        trace!(target: "runtime::world", actor = %id, location = ?actor.location, "actor spawned");
        self.actors.insert(id, actor);
        id
    }

    pub fn despawn(&mut self, actor: ActorId) -> bool {
        self.actors.remove(&actor).is_some()
    }

    pub fn actor(&self, actor: ActorId) -> Option<&SimActor> {
        self.actors.get(&actor)
    }

    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    pub fn set_location(&mut self, actor: ActorId, location: Vec3) -> bool {
        match self.actors.get_mut(&actor) {
            Some(entry) => {
                entry.location = location;
                true
            }
            None => false,
        }
    }

    /// Overrides the aim direction; `None` aims along the actor's yaw.
    pub fn set_aim(&mut self, actor: ActorId, direction: Option<Vec3>) -> bool {
        match self.actors.get_mut(&actor) {
            Some(entry) => {
                entry.aim = direction.and_then(Vec3::try_normalize);
                true
            }
            None => false,
        }
    }

    /// Queues the outcome of the actor's next move completion instead of
    /// letting it walk to the goal.
    pub fn script_move_result(&mut self, actor: ActorId, result: MoveResult) -> bool {
        match self.mover_mut(actor) {
            Some(mover) => {
                mover.scripted.push_back(result);
                true
            }
            None => false,
        }
    }

    /// Number of live move-completed subscriptions for `actor`.
    /// Changes how fast the actor's mover travels. Returns false for actors
    /// without a mover.
    pub fn set_move_speed(&mut self, actor: ActorId, speed: f32) -> bool {
        match self.mover_mut(actor) {
            Some(mover) => {
                mover.speed = speed.max(0.0);
                true
            }
            None => false,
        }
    }

    pub fn move_speed(&self, actor: ActorId) -> Option<f32> {
        self.actors
            .get(&actor)
            .and_then(|entry| entry.mover.as_ref())
            .map(|mover| mover.speed)
    }

    pub fn move_subscriptions(&self, actor: ActorId) -> usize {
        self.actors
            .get(&actor)
            .and_then(|entry| entry.mover.as_ref())
            .map_or(0, |mover| mover.subscribers.len())
    }

    /// Advances every moving actor by `dt` and returns the completed moves
    /// of actors with at least one subscriber.
    pub fn advance(&mut self, dt: f32) -> Vec<(ActorId, MoveResult)> {
        let mut completed = Vec::new();
        for (id, entry) in &mut self.actors {
            let Some(mover) = entry.mover.as_mut() else {
                continue;
            };
            let Some((goal, radius)) = mover.goal else {
                continue;
            };

            let result = match mover.scripted.pop_front() {
                Some(result) => Some(result),
                None => {
                    let to_goal = horizontal(goal - entry.location);
                    let distance = to_goal.length();
                    let step = mover.speed * dt;
                    if distance - step <= radius {
                        let travel = (distance - radius).max(0.0);
                        entry.location += to_goal.normalize_or_zero() * travel;
                        Some(MoveResult::Success)
                    } else {
                        entry.location += to_goal.normalize_or_zero() * step;
                        None
                    }
                }
            };

            if let Some(result) = result {
                mover.stop();
                debug!(target: "runtime::world", actor = %id, %result, "move completed");
                if !mover.subscribers.is_empty() {
                    completed.push((*id, result));
                }
            }
        }
        completed
    }

    fn mover_mut(&mut self, actor: ActorId) -> Option<&mut Mover> {
        self.actors
            .get_mut(&actor)
            .and_then(|entry| entry.mover.as_mut())
    }
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

impl AvatarAccess for SimWorld {
    fn location(&self, actor: ActorId) -> Option<Vec3> {
        self.actors.get(&actor).map(|entry| entry.location)
    }

    fn yaw(&self, actor: ActorId) -> Option<f32> {
        self.actors.get(&actor).map(|entry| entry.yaw)
    }

    fn set_yaw(&mut self, actor: ActorId, yaw: f32) -> bool {
        match self.actors.get_mut(&actor) {
            Some(entry) => {
                entry.yaw = geom::wrap_degrees(yaw);
                true
            }
            None => false,
        }
    }
}

impl Navigation for SimWorld {
    fn has_controller(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|entry| entry.mover.is_some())
    }

    fn move_to_location(
        &mut self,
        actor: ActorId,
        goal: Vec3,
        acceptance_radius: f32,
    ) -> MoveRequestResult {
        let Some(entry) = self.actors.get_mut(&actor) else {
            return MoveRequestResult::Failed;
        };
        let location = entry.location;
        let Some(mover) = entry.mover.as_mut() else {
            return MoveRequestResult::Failed;
        };
        let acceptance_radius = acceptance_radius.max(0.0);
        if horizontal(goal - location).length() <= acceptance_radius {
            mover.stop();
            return MoveRequestResult::AlreadyAtGoal;
        }
        mover.goal = Some((goal, acceptance_radius));
        mover.status = MoveStatus::Moving;
        MoveRequestResult::RequestSuccessful
    }

    fn subscribe_move_completed(&mut self, actor: ActorId) -> Option<SubscriptionToken> {
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        let mover = self.mover_mut(actor)?;
        mover.subscribers.insert(token);
        Some(token)
    }

    fn unsubscribe_move_completed(&mut self, actor: ActorId, token: SubscriptionToken) -> bool {
        self.mover_mut(actor)
            .is_some_and(|mover| mover.subscribers.remove(&token))
    }

    fn move_status(&self, actor: ActorId) -> Option<MoveStatus> {
        self.actors
            .get(&actor)
            .and_then(|entry| entry.mover.as_ref())
            .map(|mover| mover.status)
    }
}

impl SpatialBackend for SimWorld {
    /// Nearest hit among actor colliders and the ground plane. Colliders
    /// containing the ray origin are skipped so an actor never hits itself.
    fn line_trace(&self, ray: &Ray, channel: CollisionChannel) -> Option<HitResult> {
        let mut best: Option<HitResult> = None;
        let mut consider = |hit: HitResult| {
            if best.is_none_or(|current| hit.distance < current.distance) {
                best = Some(hit);
            }
        };

        for (id, entry) in &self.actors {
            if !entry.channels.intersects(channel) {
                continue;
            }
            for collider in &entry.colliders {
                let center = entry.location + collider.offset;
                if center.distance_squared(ray.origin) <= collider.radius * collider.radius {
                    continue;
                }
                if let Some(distance) = geom::ray_sphere(
                    ray.origin,
                    ray.direction,
                    ray.max_distance,
                    center,
                    collider.radius,
                ) {
                    consider(HitResult {
                        actor: Some(*id),
                        impact_point: ray.at(distance),
                        distance,
                    });
                }
            }
        }

        if let Some(height) = self.ground_height
            && channel.intersects(CollisionChannel::VISIBILITY | CollisionChannel::WORLD_STATIC)
            && let Some(distance) =
                geom::ray_plane_y(ray.origin, ray.direction, ray.max_distance, height)
        {
            consider(HitResult {
                actor: None,
                impact_point: ray.at(distance),
                distance,
            });
        }

        best
    }

    fn overlap(
        &self,
        shape: &Shape,
        center: Vec3,
        rotation: Quat,
        channel: CollisionChannel,
    ) -> Vec<OverlapHit> {
        let mut hits = Vec::new();
        for (id, entry) in &self.actors {
            if !entry.channels.intersects(channel) {
                continue;
            }
            for (primitive, collider) in entry.colliders.iter().enumerate() {
                let sphere = entry.location + collider.offset;
                if shape.touches_sphere(center, rotation, sphere, collider.radius) {
                    hits.push(OverlapHit {
                        actor: *id,
                        primitive: primitive as u32,
                    });
                }
            }
        }
        hits
    }
}

impl TargetableRegistry for SimWorld {
    fn try_get_targetable(&self, actor: ActorId) -> Option<Targetable> {
        self.actors
            .get(&actor)
            .filter(|entry| entry.targetable)
            .map(|entry| Targetable {
                actor,
                location: entry.location,
            })
    }
}

impl TargetingHost for SimWorld {
    fn aim_ray(&self, actor: ActorId) -> Option<(Vec3, Vec3)> {
        self.actors.get(&actor).map(|entry| {
            let origin = entry.location + Vec3::Y * entry.eye_height;
            (origin, entry.aim.unwrap_or_else(|| entry.forward()))
        })
    }

    fn set_cursor(&mut self, actor: ActorId, cursor: CursorAffordance) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.cursor = cursor;
        }
    }

    fn set_highlighted(&mut self, target: ActorId, highlighted: bool) {
        if let Some(entry) = self.actors.get_mut(&target) {
            entry.highlighted = highlighted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_prefers_nearest_and_skips_own_body() {
        let mut world = SimWorld::new().with_ground(0.0);
        let hero = world.spawn(SimActor::pawn(Vec3::new(0.0, 10.0, 0.0), 40.0));
        let near = world.spawn(SimActor::pawn(Vec3::new(200.0, 10.0, 0.0), 20.0));
        world.spawn(SimActor::pawn(Vec3::new(400.0, 10.0, 0.0), 20.0));

        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::X, 2000.0);
        let hit = world.line_trace(&ray, CollisionChannel::TARGETABLE).unwrap();

        assert_eq!(hit.actor, Some(near));
        assert!((hit.distance - 180.0).abs() < 1e-3);
        assert_ne!(hit.actor, Some(hero));
    }

    #[test]
    fn ground_blocks_visibility_but_not_targetable_traces() {
        let world = SimWorld::new().with_ground(0.0);
        let ray = Ray::new(Vec3::new(0.0, 100.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 2000.0);

        let ground = world.line_trace(&ray, CollisionChannel::VISIBILITY).unwrap();
        assert_eq!(ground.actor, None);
        assert!(ground.impact_point.y.abs() < 1e-3);
        assert!(world.line_trace(&ray, CollisionChannel::TARGETABLE).is_none());
    }

    #[test]
    fn overlap_reports_every_primitive() {
        let mut world = SimWorld::new();
        let ogre = world.spawn(
            SimActor::pawn(Vec3::new(50.0, 0.0, 0.0), 30.0).with_collider(Vec3::Y * 40.0, 30.0),
        );

        let hits = world.overlap(
            &Shape::Sphere { radius: 100.0 },
            Vec3::ZERO,
            Quat::IDENTITY,
            CollisionChannel::PAWN,
        );

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.actor == ogre));
    }

    #[test]
    fn mover_walks_to_goal_and_reports_to_subscribers() {
        let mut world = SimWorld::new();
        let runner = world.spawn(SimActor::new(Vec3::ZERO).with_mover(100.0));
        let goal = Vec3::new(250.0, 0.0, 0.0);

        assert_eq!(
            world.move_to_location(runner, goal, 50.0),
            MoveRequestResult::RequestSuccessful
        );
        world.subscribe_move_completed(runner);
        assert_eq!(world.move_status(runner), Some(MoveStatus::Moving));

        assert!(world.advance(1.0).is_empty());
        assert_eq!(world.advance(1.0), vec![(runner, MoveResult::Success)]);
        assert_eq!(world.move_status(runner), Some(MoveStatus::Idle));
        assert!((world.location(runner).unwrap().x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn scripted_result_replaces_walking() {
        let mut world = SimWorld::new();
        let runner = world.spawn(SimActor::new(Vec3::ZERO).with_mover(100.0));
        world.script_move_result(runner, MoveResult::Blocked);
        world.move_to_location(runner, Vec3::new(500.0, 0.0, 0.0), 10.0);
        world.subscribe_move_completed(runner);

        assert_eq!(world.advance(0.1), vec![(runner, MoveResult::Blocked)]);
        assert_eq!(world.location(runner), Some(Vec3::ZERO));
    }

    #[test]
    fn actors_without_mover_cannot_move() {
        let mut world = SimWorld::new();
        let statue = world.spawn(SimActor::pawn(Vec3::ZERO, 10.0));

        assert!(!world.has_controller(statue));
        assert_eq!(
            world.move_to_location(statue, Vec3::X * 100.0, 5.0),
            MoveRequestResult::Failed
        );
        assert!(world.subscribe_move_completed(statue).is_none());
        assert_eq!(world.move_status(statue), None);
    }

    #[test]
    fn negative_acceptance_radius_still_walks_to_the_goal() {
        let mut world = SimWorld::new();
        let runner = world.spawn(SimActor::new(Vec3::ZERO).with_mover(60.0));
        let goal = Vec3::new(100.0, 0.0, 0.0);

        assert_eq!(
            world.move_to_location(runner, Vec3::ZERO, -5.0),
            MoveRequestResult::AlreadyAtGoal
        );
        world.move_to_location(runner, goal, -5.0);
        world.subscribe_move_completed(runner);

        assert!(world.advance(1.0).is_empty());
        assert_eq!(world.advance(1.0), vec![(runner, MoveResult::Success)]);
        let location = world.location(runner).unwrap();
        assert!(location.is_finite());
        assert!((location.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn move_speed_can_change_mid_walk() {
        let mut world = SimWorld::new();
        let runner = world.spawn(SimActor::new(Vec3::ZERO).with_mover(10.0));
        world.move_to_location(runner, Vec3::new(1000.0, 0.0, 0.0), 0.0);

        world.advance(1.0);
        assert!(world.set_move_speed(runner, 100.0));
        world.advance(1.0);

        assert_eq!(world.move_speed(runner), Some(100.0));
        assert!((world.location(runner).unwrap().x - 110.0).abs() < 1e-3);
        let statue = world.spawn(SimActor::pawn(Vec3::ZERO, 10.0));
        assert!(!world.set_move_speed(statue, 50.0));
    }
}
