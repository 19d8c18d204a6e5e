//! In-memory ability-execution and duration-effect system.
//!
//! Abilities come from the [`AbilityCatalog`]. An accepted activation commits
//! after the definition's cast time, applying a cooldown effect when the
//! definition has one, and then ends. Effects expire on the system's own
//! clock, which only moves in [`SimAbilitySystem::advance`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cast_content::{AbilityCatalog, AbilityDefinition, HeroAttributes};
use cast_core::{
    AbilityHandle, AbilityId, AbilityNotification, AbilitySpecInfo, AbilitySystem,
    ActiveEffectInfo, ActorId, Attribute, AttributeStore, EffectHandle, EffectQuery, EffectSpec,
    EffectSystem, SubscriptionToken, TagSet,
};
use tracing::{debug, trace};

/// Slack applied to clock comparisons so that accumulated frame deltas land
/// on their deadlines.
const CLOCK_EPSILON: f32 = 1e-4;

#[derive(Clone, Debug)]
struct GrantedAbility {
    definition: AbilityDefinition,
    level: u32,
}

#[derive(Clone, Copy, Debug)]
struct RunningInstance {
    commit_at: f32,
}

#[derive(Clone, Debug)]
struct SimEffect {
    tags: TagSet,
    applied_seq: u64,
    duration: f32,
    expires_at: f32,
}

/// Ability system owned by one actor.
#[derive(Debug)]
pub struct SimAbilitySystem {
    owner: ActorId,
    catalog: Arc<AbilityCatalog>,
    clock: f32,
    next_handle: u64,
    next_effect: u64,
    next_token: u64,
    next_seq: u64,
    granted: BTreeMap<AbilityHandle, GrantedAbility>,
    running: BTreeMap<AbilityHandle, RunningInstance>,
    effects: BTreeMap<EffectHandle, SimEffect>,
    removal_watchers: BTreeMap<EffectHandle, BTreeSet<SubscriptionToken>>,
    attributes: HeroAttributes,
    attribute_changes: Vec<(Attribute, f32)>,
    notifications: Vec<AbilityNotification>,
}

impl SimAbilitySystem {
    pub fn new(owner: ActorId, catalog: Arc<AbilityCatalog>, attributes: HeroAttributes) -> Self {
        Self {
            owner,
            catalog,
            clock: 0.0,
            next_handle: 0,
            next_effect: 0,
            next_token: 0,
            next_seq: 0,
            granted: BTreeMap::new(),
            running: BTreeMap::new(),
            effects: BTreeMap::new(),
            removal_watchers: BTreeMap::new(),
            attributes,
            attribute_changes: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Seconds advanced so far.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn definition(&self, handle: AbilityHandle) -> Option<&AbilityDefinition> {
        self.granted.get(&handle).map(|granted| &granted.definition)
    }

    pub fn attributes(&self) -> &HeroAttributes {
        &self.attributes
    }

    /// Writes an attribute. Returns false if the value did not change.
    pub fn set_attribute(&mut self, attribute: Attribute, value: f32) -> bool {
        if self.attributes.get(attribute) == value {
            return false;
        }
        self.attributes.set(attribute, value);
        self.attribute_changes.push((attribute, value));
        true
    }

    /// Takes the attribute writes made since the last call, in order.
    pub fn drain_attribute_changes(&mut self) -> Vec<(Attribute, f32)> {
        std::mem::take(&mut self.attribute_changes)
    }

    /// Applies an effect to the owner.
    ///
    /// Effects with a zero duration are instant: they are announced but never
    /// become active.
    pub fn apply_effect(&mut self, source: Option<ActorId>, spec: EffectSpec) -> EffectHandle {
        self.next_effect += 1;
        let handle = EffectHandle(self.next_effect);

        if spec.duration > 0.0 {
            self.next_seq += 1;
            self.effects.insert(
                handle,
                SimEffect {
                    tags: spec.tags.clone(),
                    applied_seq: self.next_seq,
                    duration: spec.duration,
                    expires_at: self.clock + spec.duration,
                },
            );
        }

        trace!(
            target: "runtime::abilities",
            owner = %self.owner,
            %handle,
            effect = %spec.name,
            duration = spec.duration,
            "effect applied"
        );
        self.notifications.push(AbilityNotification::EffectApplied {
            source,
            spec,
            handle,
        });
        handle
    }

    /// Removes an active effect before it expires.
    pub fn remove_effect(&mut self, handle: EffectHandle) -> bool {
        if self.effects.remove(&handle).is_none() {
            return false;
        }
        self.removal_watchers.remove(&handle);
        self.notifications
            .push(AbilityNotification::EffectRemoved { handle });
        true
    }

    /// Cancels a running instance that has not committed yet.
    pub fn cancel_ability(&mut self, handle: AbilityHandle) -> bool {
        if self.running.remove(&handle).is_none() {
            return false;
        }
        debug!(target: "runtime::abilities", owner = %self.owner, %handle, "ability cancelled");
        self.notifications.push(AbilityNotification::Ended {
            handle,
            cancelled: true,
        });
        true
    }

    /// Moves the clock forward: commits instances whose cast time elapsed,
    /// then expires effects whose duration ran out.
    pub fn advance(&mut self, dt: f32) {
        self.clock += dt;
        let now = self.clock + CLOCK_EPSILON;

        let due: Vec<AbilityHandle> = self
            .running
            .iter()
            .filter(|(_, instance)| instance.commit_at <= now)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in due {
            self.running.remove(&handle);
            self.commit(handle);
        }

        let mut expired: Vec<(f32, EffectHandle)> = self
            .effects
            .iter()
            .filter(|(_, effect)| effect.expires_at <= now)
            .map(|(handle, effect)| (effect.expires_at, *handle))
            .collect();
        expired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, handle) in expired {
            trace!(target: "runtime::abilities", owner = %self.owner, %handle, "effect expired");
            self.remove_effect(handle);
        }
    }

    pub fn removal_subscriptions(&self) -> usize {
        self.removal_watchers.values().map(BTreeSet::len).sum()
    }

    fn commit(&mut self, handle: AbilityHandle) {
        let Some(definition) = self.definition(handle).cloned() else {
            return;
        };
        if definition.has_cooldown() {
            self.apply_effect(
                Some(self.owner),
                EffectSpec {
                    name: format!("{} Cooldown", definition.name),
                    tags: definition.cooldown_tags(),
                    duration: definition.cooldown,
                },
            );
        }
        debug!(
            target: "runtime::abilities",
            owner = %self.owner,
            %handle,
            ability = %definition.id,
            cooldown = definition.cooldown,
            "ability committed"
        );
        self.notifications.push(AbilityNotification::Committed(handle));
        self.notifications.push(AbilityNotification::Ended {
            handle,
            cancelled: false,
        });
    }

    fn cooldown_effects(&self, handle: AbilityHandle) -> impl Iterator<Item = &SimEffect> {
        let tags = self
            .granted
            .get(&handle)
            .map(|granted| granted.definition.cooldown_tags())
            .unwrap_or_default();
        let query = EffectQuery::matching_any(tags);
        self.effects
            .values()
            .filter(move |effect| query.matches(&effect.tags))
    }

    fn remaining(&self, effect: &SimEffect) -> f32 {
        (effect.expires_at - self.clock).max(0.0)
    }
}

impl AbilitySystem for SimAbilitySystem {
    fn give_ability(&mut self, ability: AbilityId, level: u32) -> Option<AbilityHandle> {
        let definition = self.catalog.get(ability)?.clone();
        self.next_handle += 1;
        let handle = AbilityHandle(self.next_handle);
        self.granted
            .insert(handle, GrantedAbility { definition, level });
        Some(handle)
    }

    /// Every ability runs locally here, so `allow_remote` changes nothing.
    fn try_activate(&mut self, handle: AbilityHandle, _allow_remote: bool) -> bool {
        let Some(definition) = self.definition(handle).cloned() else {
            return false;
        };
        if self.running.contains_key(&handle) || self.is_on_cooldown(handle) {
            return false;
        }
        let mana = self.attributes.mana;
        if definition.mana_cost > mana {
            debug!(
                target: "runtime::abilities",
                owner = %self.owner,
                %handle,
                cost = definition.mana_cost,
                mana,
                "not enough mana"
            );
            return false;
        }
        if definition.mana_cost > 0.0 {
            self.set_attribute(Attribute::Mana, mana - definition.mana_cost);
        }

        self.notifications.push(AbilityNotification::Activated(handle));
        if definition.cast_time <= 0.0 {
            self.commit(handle);
        } else {
            self.running.insert(
                handle,
                RunningInstance {
                    commit_at: self.clock + definition.cast_time,
                },
            );
        }
        true
    }

    fn is_active(&self, handle: AbilityHandle) -> bool {
        self.running.contains_key(&handle)
    }

    fn ability_spec(&self, handle: AbilityHandle) -> Option<AbilitySpecInfo> {
        self.granted.get(&handle).map(|granted| AbilitySpecInfo {
            ability: granted.definition.id,
            level: granted.level,
            cooldown_tags: granted.definition.cooldown_tags(),
        })
    }

    fn is_on_cooldown(&self, handle: AbilityHandle) -> bool {
        self.cooldown_effects(handle).next().is_some()
    }

    fn cooldown_remaining_and_duration(&self, handle: AbilityHandle) -> (f32, f32) {
        self.cooldown_effects(handle)
            .map(|effect| (self.remaining(effect), effect.duration))
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, 0.0))
    }

    fn drain_notifications(&mut self) -> Vec<AbilityNotification> {
        std::mem::take(&mut self.notifications)
    }
}

impl EffectSystem for SimAbilitySystem {
    fn active_effects(&self, query: &EffectQuery) -> Vec<ActiveEffectInfo> {
        self.effects
            .iter()
            .filter(|(_, effect)| query.matches(&effect.tags))
            .map(|(handle, effect)| ActiveEffectInfo {
                handle: *handle,
                tags: effect.tags.clone(),
                applied_seq: effect.applied_seq,
                duration: effect.duration,
                remaining: self.remaining(effect),
            })
            .collect()
    }

    fn subscribe_removal(&mut self, effect: EffectHandle) -> Option<SubscriptionToken> {
        if !self.effects.contains_key(&effect) {
            return None;
        }
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.removal_watchers.entry(effect).or_default().insert(token);
        Some(token)
    }

    fn unsubscribe_removal(&mut self, effect: EffectHandle, token: SubscriptionToken) -> bool {
        let Some(tokens) = self.removal_watchers.get_mut(&effect) else {
            return false;
        };
        let removed = tokens.remove(&token);
        if tokens.is_empty() {
            self.removal_watchers.remove(&effect);
        }
        removed
    }
}

impl AttributeStore for SimAbilitySystem {
    fn attribute(&self, attribute: Attribute) -> f32 {
        self.attributes.get(attribute)
    }
}

#[cfg(test)]
mod tests {
    use cast_core::Tag;

    use super::*;

    const OWNER: ActorId = ActorId(1);

    fn system() -> SimAbilitySystem {
        let catalog: AbilityCatalog = [
            AbilityDefinition::new(AbilityId(1), "Jab", 0.0),
            AbilityDefinition::new(AbilityId(2), "Bolt", 2.0)
                .with_cast_time(0.5)
                .with_mana_cost(40.0),
        ]
        .into_iter()
        .collect();
        SimAbilitySystem::new(OWNER, Arc::new(catalog), HeroAttributes::default())
    }

    #[test]
    fn instant_ability_without_cooldown_resolves_in_activation() {
        let mut system = system();
        let jab = system.give_ability(AbilityId(1), 1).unwrap();

        assert!(system.try_activate(jab, false));
        assert_eq!(
            system.drain_notifications(),
            vec![
                AbilityNotification::Activated(jab),
                AbilityNotification::Committed(jab),
                AbilityNotification::Ended {
                    handle: jab,
                    cancelled: false
                },
            ]
        );
        assert!(!system.is_on_cooldown(jab));
    }

    #[test]
    fn cast_time_delays_commit_and_cooldown() {
        let mut system = system();
        let bolt = system.give_ability(AbilityId(2), 1).unwrap();

        assert!(system.try_activate(bolt, false));
        assert!(system.is_active(bolt));
        system.drain_notifications();

        system.advance(0.5);
        assert!(!system.is_active(bolt));
        assert!(system.is_on_cooldown(bolt));
        let (remaining, duration) = system.cooldown_remaining_and_duration(bolt);
        assert!((remaining - 2.0).abs() < 1e-3);
        assert_eq!(duration, 2.0);

        let notifications = system.drain_notifications();
        assert!(matches!(notifications[0], AbilityNotification::EffectApplied { .. }));
        assert_eq!(notifications[1], AbilityNotification::Committed(bolt));
    }

    #[test]
    fn expiry_after_accumulated_frames_removes_cooldown() {
        let mut system = system();
        let bolt = system.give_ability(AbilityId(2), 1).unwrap();
        system.try_activate(bolt, false);
        system.advance(0.5);
        system.drain_notifications();

        for _ in 0..20 {
            system.advance(0.1);
        }

        assert!(!system.is_on_cooldown(bolt));
        assert!(
            system
                .drain_notifications()
                .iter()
                .any(|n| matches!(n, AbilityNotification::EffectRemoved { .. }))
        );
    }

    #[test]
    fn activation_is_refused_while_cooling_down_or_short_on_mana() {
        let mut system = system();
        let bolt = system.give_ability(AbilityId(2), 1).unwrap();
        system.try_activate(bolt, false);
        system.advance(0.5);

        assert!(!system.try_activate(bolt, false));
        system.advance(2.0);
        assert!(system.try_activate(bolt, false));
        assert_eq!(system.attributes().mana, 20.0);
        system.advance(2.5);
        assert!(!system.try_activate(bolt, false), "20 mana left, bolt costs 40");
        assert_eq!(
            system.drain_attribute_changes(),
            vec![(Attribute::Mana, 60.0), (Attribute::Mana, 20.0)]
        );
    }

    #[test]
    fn removal_subscription_is_released_with_the_effect() {
        let mut system = system();
        let effect = system.apply_effect(
            None,
            EffectSpec {
                name: "Slow".into(),
                tags: TagSet::single(Tag::new("Debuff.Slow")),
                duration: 3.0,
            },
        );
        let token = system.subscribe_removal(effect).unwrap();
        assert_eq!(system.removal_subscriptions(), 1);

        assert!(system.remove_effect(effect));
        assert_eq!(system.removal_subscriptions(), 0);
        assert!(!system.unsubscribe_removal(effect, token));
        assert!(system.subscribe_removal(effect).is_none());
    }

    #[test]
    fn time_remaining_lists_every_matching_effect() {
        let mut system = system();
        let slow = TagSet::single(Tag::new("Debuff.Slow"));
        for duration in [3.0, 1.0] {
            system.apply_effect(
                None,
                EffectSpec {
                    name: "Slow".into(),
                    tags: slow.clone(),
                    duration,
                },
            );
        }
        system.advance(0.5);

        let mut remaining = system.time_remaining(&EffectQuery::matching_any(slow));
        remaining.sort_by(f32::total_cmp);
        assert_eq!(remaining.len(), 2);
        assert!((remaining[0] - 0.5).abs() < 1e-3);
        assert!((remaining[1] - 2.5).abs() < 1e-3);

        let none = system.time_remaining(&EffectQuery::matching_any(TagSet::single(Tag::new(
            "Buff.Haste",
        ))));
        assert!(none.is_empty());
    }

    #[test]
    fn cancel_before_commit_ends_cancelled() {
        let mut system = system();
        let bolt = system.give_ability(AbilityId(2), 1).unwrap();
        system.try_activate(bolt, false);
        system.drain_notifications();

        assert!(system.cancel_ability(bolt));
        assert!(!system.cancel_ability(bolt));
        system.advance(1.0);

        assert_eq!(
            system.drain_notifications(),
            vec![AbilityNotification::Ended {
                handle: bolt,
                cancelled: true
            }]
        );
        assert!(!system.is_on_cooldown(bolt));
    }
}
