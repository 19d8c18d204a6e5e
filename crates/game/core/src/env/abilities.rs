//! Ability-execution and duration-effect system interfaces.

use crate::state::{AbilityHandle, AbilityId, ActorId, EffectHandle, SubscriptionToken, TagSet};

/// Notification queued by the ability system for its owner.
///
/// The execution system never calls back into the controller directly; the
/// frame scheduler drains these and forwards them in order.
#[derive(Clone, Debug, PartialEq)]
pub enum AbilityNotification {
    /// The ability instance started running.
    Activated(AbilityHandle),
    /// The ability consumed its cost and cooldown.
    Committed(AbilityHandle),
    /// The ability instance finished, normally or by cancellation.
    Ended {
        handle: AbilityHandle,
        cancelled: bool,
    },
    /// A duration or instant effect landed on the owner.
    EffectApplied {
        source: Option<ActorId>,
        spec: EffectSpec,
        handle: EffectHandle,
    },
    /// An active effect left the owner. Removal subscribers are notified
    /// through this same notification.
    EffectRemoved { handle: EffectHandle },
}

/// Static description of the granted ability behind a handle.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilitySpecInfo {
    pub ability: AbilityId,
    pub level: u32,
    /// Tags carried by the cooldown effect this ability applies on commit.
    pub cooldown_tags: TagSet,
}

/// Description of an effect as it was applied.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub name: String,
    pub tags: TagSet,
    /// Zero for instant effects.
    pub duration: f32,
}

/// Snapshot of one active duration effect.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveEffectInfo {
    pub handle: EffectHandle,
    pub tags: TagSet,
    /// Monotonic application order; larger means applied later.
    pub applied_seq: u64,
    pub duration: f32,
    pub remaining: f32,
}

/// Query over active effects by owned tags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectQuery {
    any_owning_tags: TagSet,
}

impl EffectQuery {
    /// Matches effects owning any tag nested under one of `tags`.
    pub fn matching_any(tags: TagSet) -> Self {
        Self {
            any_owning_tags: tags,
        }
    }

    pub fn matches(&self, effect_tags: &TagSet) -> bool {
        effect_tags.matches_any(&self.any_owning_tags)
    }
}

/// Ability-execution system consumed by the controller.
pub trait AbilitySystem {
    /// Grants `ability` and returns its handle, or `None` if the ability is
    /// unknown to the system.
    fn give_ability(&mut self, ability: AbilityId, level: u32) -> Option<AbilityHandle>;

    /// Attempts to activate a granted ability.
    ///
    /// A `true` result means the request was accepted; the instance may still
    /// fail later and report that through an `Ended` notification.
    fn try_activate(&mut self, handle: AbilityHandle, allow_remote: bool) -> bool;

    /// Returns true while an instance of the ability is running.
    fn is_active(&self, handle: AbilityHandle) -> bool;

    fn ability_spec(&self, handle: AbilityHandle) -> Option<AbilitySpecInfo>;

    fn is_on_cooldown(&self, handle: AbilityHandle) -> bool;

    /// Returns `(remaining, duration)` of the longest active cooldown, or
    /// `(0.0, 0.0)` when none is active.
    fn cooldown_remaining_and_duration(&self, handle: AbilityHandle) -> (f32, f32);

    /// Takes every notification queued since the last call.
    fn drain_notifications(&mut self) -> Vec<AbilityNotification>;
}

/// Duration-effect system consumed by the cooldown tracker.
pub trait EffectSystem {
    fn active_effects(&self, query: &EffectQuery) -> Vec<ActiveEffectInfo>;

    /// Subscribes to the removal of an active effect.
    ///
    /// Returns `None` if the effect is not active.
    fn subscribe_removal(&mut self, effect: EffectHandle) -> Option<SubscriptionToken>;

    /// Releases a removal subscription. Releasing an unknown or already
    /// released token returns `false` and does nothing else.
    fn unsubscribe_removal(&mut self, effect: EffectHandle, token: SubscriptionToken) -> bool;

    fn time_remaining(&self, query: &EffectQuery) -> Vec<f32> {
        self.active_effects(query)
            .into_iter()
            .map(|effect| effect.remaining)
            .collect()
    }
}

/// Combined component: one object usually implements both systems.
pub trait AbilitySystemComponent: AbilitySystem + EffectSystem {}

impl<T: AbilitySystem + EffectSystem + ?Sized> AbilitySystemComponent for T {}
