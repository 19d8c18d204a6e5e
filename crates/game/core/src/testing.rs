//! In-crate fakes for unit tests.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec3};

use crate::env::{
    AbilityNotification, AbilitySpecInfo, AbilitySystem, ActiveEffectInfo, AvatarAccess,
    EffectQuery, EffectSystem, MoveRequestResult, MoveStatus, Navigation,
};
use crate::spatial::{
    CollisionChannel, HitResult, OverlapHit, Ray, Shape, SpatialBackend, Targetable,
    TargetableRegistry, geom,
};
use crate::state::{
    AbilityHandle, AbilityId, ActorId, EffectHandle, SubscriptionToken, Tag, TagSet,
};
use crate::targeting::{CursorAffordance, TargetingHost};

#[derive(Debug)]
struct FakeEffect {
    tags: TagSet,
    seq: u64,
    duration: f32,
    remaining: f32,
}

/// Ability system whose cooldown state is derived from manually applied
/// effects.
#[derive(Debug, Default)]
pub struct FakeAbilitySystem {
    next_id: u64,
    abilities: BTreeMap<AbilityHandle, TagSet>,
    effects: BTreeMap<EffectHandle, FakeEffect>,
    subscriptions: BTreeMap<SubscriptionToken, EffectHandle>,
    active: BTreeSet<AbilityHandle>,
    forced_cooldown: BTreeSet<AbilityHandle>,
    pub reject_activation: bool,
    pub notifications: Vec<AbilityNotification>,
}

impl FakeAbilitySystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn grant_with_cooldown_tags(&mut self, tags: TagSet) -> AbilityHandle {
        let handle = AbilityHandle(self.next());
        self.abilities.insert(handle, tags);
        handle
    }

    pub fn set_cooldown_tags(&mut self, handle: AbilityHandle, tags: TagSet) {
        self.abilities.insert(handle, tags);
    }

    /// Reports `handle` as on cooldown even when no effect matches.
    pub fn force_on_cooldown(&mut self, handle: AbilityHandle) {
        self.forced_cooldown.insert(handle);
    }

    pub fn apply_effect(&mut self, tag: &str, duration: f32) -> EffectHandle {
        let seq = self.next();
        let handle = EffectHandle(seq);
        self.effects.insert(
            handle,
            FakeEffect {
                tags: TagSet::single(Tag::new(tag)),
                seq,
                duration,
                remaining: duration,
            },
        );
        handle
    }

    /// Removes an effect and queues its removal notification.
    pub fn remove_effect(&mut self, effect: EffectHandle) {
        if self.effects.remove(&effect).is_some() {
            self.notifications
                .push(AbilityNotification::EffectRemoved { handle: effect });
        }
    }

    pub fn end(&mut self, handle: AbilityHandle) {
        self.active.remove(&handle);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn cooldown_effects(&self, handle: AbilityHandle) -> Vec<&FakeEffect> {
        let Some(tags) = self.abilities.get(&handle) else {
            return Vec::new();
        };
        let query = EffectQuery::matching_any(tags.clone());
        self.effects
            .values()
            .filter(|effect| query.matches(&effect.tags))
            .collect()
    }
}

impl AbilitySystem for FakeAbilitySystem {
    fn give_ability(&mut self, _ability: AbilityId, _level: u32) -> Option<AbilityHandle> {
        Some(self.grant_with_cooldown_tags(TagSet::new()))
    }

    fn try_activate(&mut self, handle: AbilityHandle, _allow_remote: bool) -> bool {
        if self.reject_activation || !self.abilities.contains_key(&handle) {
            return false;
        }
        self.active.insert(handle);
        true
    }

    fn is_active(&self, handle: AbilityHandle) -> bool {
        self.active.contains(&handle)
    }

    fn ability_spec(&self, handle: AbilityHandle) -> Option<AbilitySpecInfo> {
        self.abilities.get(&handle).map(|tags| AbilitySpecInfo {
            ability: AbilityId(handle.0 as u32),
            level: 1,
            cooldown_tags: tags.clone(),
        })
    }

    fn is_on_cooldown(&self, handle: AbilityHandle) -> bool {
        self.forced_cooldown.contains(&handle) || !self.cooldown_effects(handle).is_empty()
    }

    fn cooldown_remaining_and_duration(&self, handle: AbilityHandle) -> (f32, f32) {
        self.cooldown_effects(handle)
            .into_iter()
            .map(|effect| (effect.remaining, effect.duration))
            .fold((0.0, 0.0), |best, next| if next.0 > best.0 { next } else { best })
    }

    fn drain_notifications(&mut self) -> Vec<AbilityNotification> {
        std::mem::take(&mut self.notifications)
    }
}

impl EffectSystem for FakeAbilitySystem {
    fn active_effects(&self, query: &EffectQuery) -> Vec<ActiveEffectInfo> {
        self.effects
            .iter()
            .filter(|(_, effect)| query.matches(&effect.tags))
            .map(|(handle, effect)| ActiveEffectInfo {
                handle: *handle,
                tags: effect.tags.clone(),
                applied_seq: effect.seq,
                duration: effect.duration,
                remaining: effect.remaining,
            })
            .collect()
    }

    fn subscribe_removal(&mut self, effect: EffectHandle) -> Option<SubscriptionToken> {
        if !self.effects.contains_key(&effect) {
            return None;
        }
        let token = SubscriptionToken(self.next());
        self.subscriptions.insert(token, effect);
        Some(token)
    }

    fn unsubscribe_removal(&mut self, effect: EffectHandle, token: SubscriptionToken) -> bool {
        match self.subscriptions.get(&token) {
            Some(watched) if *watched == effect => {
                self.subscriptions.remove(&token);
                true
            }
            _ => false,
        }
    }
}

/// Single-actor world with scripted navigation.
#[derive(Debug, Default)]
pub struct FakeWorld {
    pub location: Option<Vec3>,
    pub yaw: f32,
    pub has_controller: bool,
    pub status: Option<MoveStatus>,
    pub request_result: Option<MoveRequestResult>,
    pub move_requests: usize,
    next_token: u64,
    pub live_subscriptions: usize,
}

impl FakeWorld {
    pub fn with_avatar(location: Vec3) -> Self {
        Self {
            location: Some(location),
            has_controller: true,
            status: Some(MoveStatus::Idle),
            request_result: Some(MoveRequestResult::RequestSuccessful),
            ..Self::default()
        }
    }
}

impl AvatarAccess for FakeWorld {
    fn location(&self, _actor: ActorId) -> Option<Vec3> {
        self.location
    }

    fn yaw(&self, _actor: ActorId) -> Option<f32> {
        self.location.map(|_| self.yaw)
    }

    fn set_yaw(&mut self, _actor: ActorId, yaw: f32) -> bool {
        if self.location.is_none() {
            return false;
        }
        self.yaw = yaw;
        true
    }
}

impl Navigation for FakeWorld {
    fn has_controller(&self, _actor: ActorId) -> bool {
        self.has_controller
    }

    fn move_to_location(
        &mut self,
        _actor: ActorId,
        _goal: Vec3,
        _acceptance_radius: f32,
    ) -> MoveRequestResult {
        self.move_requests += 1;
        if !self.has_controller {
            return MoveRequestResult::Failed;
        }
        self.request_result.unwrap_or(MoveRequestResult::Failed)
    }

    fn subscribe_move_completed(&mut self, _actor: ActorId) -> Option<SubscriptionToken> {
        if !self.has_controller {
            return None;
        }
        self.next_token += 1;
        self.live_subscriptions += 1;
        Some(SubscriptionToken(self.next_token))
    }

    fn unsubscribe_move_completed(&mut self, _actor: ActorId, _token: SubscriptionToken) -> bool {
        if self.live_subscriptions == 0 {
            return false;
        }
        self.live_subscriptions -= 1;
        true
    }

    fn move_status(&self, _actor: ActorId) -> Option<MoveStatus> {
        if self.has_controller { self.status } else { None }
    }
}

#[derive(Debug, Clone, Copy)]
struct FakePrimitive {
    actor: ActorId,
    center: Vec3,
    radius: f32,
    targetable: bool,
}

/// Sphere-primitive world with an optional ground plane.
#[derive(Debug, Default)]
pub struct FakeTargetWorld {
    pub aim: Option<(Vec3, Vec3)>,
    pub ground_y: Option<f32>,
    pub cursor: CursorAffordance,
    pub highlighted: BTreeSet<ActorId>,
    highlight_on: BTreeMap<ActorId, u32>,
    highlight_off: BTreeMap<ActorId, u32>,
    primitives: Vec<FakePrimitive>,
}

impl FakeTargetWorld {
    pub fn aiming(origin: Vec3, direction: Vec3) -> Self {
        Self {
            aim: Some((origin, direction)),
            ..Self::default()
        }
    }

    /// Adds one sphere primitive; repeated ids give multi-primitive actors.
    pub fn add_actor(&mut self, actor: ActorId, center: Vec3, radius: f32, targetable: bool) {
        self.primitives.push(FakePrimitive {
            actor,
            center,
            radius,
            targetable,
        });
    }

    /// `(highlighted, unhighlighted)` call counts for `actor`.
    pub fn highlight_count(&self, actor: ActorId) -> (u32, u32) {
        (
            self.highlight_on.get(&actor).copied().unwrap_or(0),
            self.highlight_off.get(&actor).copied().unwrap_or(0),
        )
    }
}

impl SpatialBackend for FakeTargetWorld {
    fn line_trace(&self, ray: &Ray, channel: CollisionChannel) -> Option<HitResult> {
        let mut best: Option<HitResult> = None;
        for primitive in &self.primitives {
            if let Some(t) = geom::ray_sphere(
                ray.origin,
                ray.direction,
                ray.max_distance,
                primitive.center,
                primitive.radius,
            ) && best.is_none_or(|b| t < b.distance)
            {
                best = Some(HitResult {
                    actor: Some(primitive.actor),
                    impact_point: ray.at(t),
                    distance: t,
                });
            }
        }
        if channel.contains(CollisionChannel::VISIBILITY)
            && let Some(height) = self.ground_y
            && let Some(t) = geom::ray_plane_y(ray.origin, ray.direction, ray.max_distance, height)
            && best.is_none_or(|b| t < b.distance)
        {
            best = Some(HitResult {
                actor: None,
                impact_point: ray.at(t),
                distance: t,
            });
        }
        best
    }

    fn overlap(
        &self,
        shape: &Shape,
        center: Vec3,
        rotation: Quat,
        _channel: CollisionChannel,
    ) -> Vec<OverlapHit> {
        self.primitives
            .iter()
            .enumerate()
            .filter(|(_, p)| shape.touches_sphere(center, rotation, p.center, p.radius))
            .map(|(index, p)| OverlapHit {
                actor: p.actor,
                primitive: index as u32,
            })
            .collect()
    }
}

impl TargetableRegistry for FakeTargetWorld {
    fn try_get_targetable(&self, actor: ActorId) -> Option<Targetable> {
        self.primitives
            .iter()
            .find(|p| p.actor == actor && p.targetable)
            .map(|p| Targetable {
                actor,
                location: p.center,
            })
    }
}

impl TargetingHost for FakeTargetWorld {
    fn aim_ray(&self, _actor: ActorId) -> Option<(Vec3, Vec3)> {
        self.aim
    }

    fn set_cursor(&mut self, _actor: ActorId, cursor: CursorAffordance) {
        self.cursor = cursor;
    }

    fn set_highlighted(&mut self, target: ActorId, highlighted: bool) {
        if highlighted {
            *self.highlight_on.entry(target).or_default() += 1;
            self.highlighted.insert(target);
        } else {
            *self.highlight_off.entry(target).or_default() += 1;
            self.highlighted.remove(&target);
        }
    }
}
