//! Watches cooldown effects on behalf of spell slots.
//!
//! The tracker owns at most one [`ActiveCooldownWatch`] per slot. A watch
//! pairs the effect handle with the removal subscription taken on it; the
//! subscription is always released when the watch goes away, whether the
//! effect expired, the slot was re-armed, or the actor was destroyed.
use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::error::CooldownError;
use crate::env::{AbilitySystemComponent, EffectQuery};
use crate::state::{AbilityHandle, EffectHandle, SlotIndex, SubscriptionToken};

/// A live removal subscription on the cooldown effect of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveCooldownWatch {
    pub slot: SlotIndex,
    pub effect: EffectHandle,
    pub token: SubscriptionToken,
}

#[derive(Clone, Debug, Default)]
pub struct CooldownTracker {
    watches: BTreeMap<SlotIndex, ActiveCooldownWatch>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a watch on the most recently applied effect matching the cooldown
    /// tags of `ability`.
    ///
    /// Any prior watch on `slot` is released first, even if arming fails.
    ///
    /// # Errors
    ///
    /// - `UnknownAbility` if the system has no spec for `ability`
    /// - `EffectNotFound` if no matching effect is active
    pub fn arm(
        &mut self,
        system: &mut dyn AbilitySystemComponent,
        slot: SlotIndex,
        ability: AbilityHandle,
    ) -> Result<ActiveCooldownWatch, CooldownError> {
        self.release(system, slot);

        let spec = system
            .ability_spec(ability)
            .ok_or_else(|| CooldownError::unknown_ability(slot, ability))?;
        let query = EffectQuery::matching_any(spec.cooldown_tags);

        // max_by_key keeps the last maximum, so equal sequence numbers resolve
        // to the later entry.
        let effect = system
            .active_effects(&query)
            .into_iter()
            .max_by_key(|effect| effect.applied_seq)
            .ok_or_else(|| CooldownError::effect_not_found(slot, ability))?;

        let token = system
            .subscribe_removal(effect.handle)
            .ok_or_else(|| CooldownError::effect_not_found(slot, ability))?;

        let watch = ActiveCooldownWatch {
            slot,
            effect: effect.handle,
            token,
        };
        self.watches.insert(slot, watch);

        debug!(
            target: "cast::cooldown",
            slot,
            effect = %effect.handle,
            remaining = effect.remaining,
            "cooldown watch armed"
        );
        Ok(watch)
    }

    /// Releases the watch on `slot`. Returns false if there was none.
    pub fn release(&mut self, system: &mut dyn AbilitySystemComponent, slot: SlotIndex) -> bool {
        let Some(watch) = self.watches.remove(&slot) else {
            return false;
        };
        // The effect may already be gone; the system then reports false.
        let released = system.unsubscribe_removal(watch.effect, watch.token);
        trace!(
            target: "cast::cooldown",
            slot,
            effect = %watch.effect,
            released,
            "cooldown watch released"
        );
        true
    }

    /// Releases every watch, in slot order.
    pub fn release_all(&mut self, system: &mut dyn AbilitySystemComponent) {
        let slots: Vec<SlotIndex> = self.watches.keys().copied().collect();
        for slot in slots {
            self.release(system, slot);
        }
    }

    pub fn watch(&self, slot: SlotIndex) -> Option<&ActiveCooldownWatch> {
        self.watches.get(&slot)
    }

    /// Slot whose watch observes `effect`, if any.
    pub fn slot_for_effect(&self, effect: EffectHandle) -> Option<SlotIndex> {
        self.watches
            .values()
            .find(|watch| watch.effect == effect)
            .map(|watch| watch.slot)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TagSet;
    use crate::testing::FakeAbilitySystem;

    fn system_with_ability() -> (FakeAbilitySystem, AbilityHandle) {
        let mut system = FakeAbilitySystem::new();
        let handle = system.grant_with_cooldown_tags(TagSet::single("Cooldown.Fireball"));
        (system, handle)
    }

    #[test]
    fn arm_picks_latest_applied_effect() {
        let (mut system, handle) = system_with_ability();
        let older = system.apply_effect("Cooldown.Fireball", 5.0);
        let newer = system.apply_effect("Cooldown.Fireball", 2.0);
        system.apply_effect("Cooldown.Frostbolt", 9.0);

        let mut tracker = CooldownTracker::new();
        let watch = tracker.arm(&mut system, 0, handle).unwrap();

        assert_eq!(watch.effect, newer);
        assert_ne!(watch.effect, older);
        assert_eq!(system.subscription_count(), 1);
    }

    #[test]
    fn arm_without_effect_reports_not_found() {
        let (mut system, handle) = system_with_ability();
        let mut tracker = CooldownTracker::new();

        let err = tracker.arm(&mut system, 3, handle).unwrap_err();

        assert!(matches!(err, CooldownError::EffectNotFound { slot: 3, .. }));
        assert!(tracker.is_empty());
    }

    #[test]
    fn rearming_releases_prior_subscription() {
        let (mut system, handle) = system_with_ability();
        system.apply_effect("Cooldown.Fireball", 5.0);
        let mut tracker = CooldownTracker::new();

        tracker.arm(&mut system, 0, handle).unwrap();
        tracker.arm(&mut system, 0, handle).unwrap();

        assert_eq!(tracker.len(), 1);
        assert_eq!(system.subscription_count(), 1);
    }

    #[test]
    fn release_twice_is_noop() {
        let (mut system, handle) = system_with_ability();
        system.apply_effect("Cooldown.Fireball", 5.0);
        let mut tracker = CooldownTracker::new();
        tracker.arm(&mut system, 1, handle).unwrap();

        assert!(tracker.release(&mut system, 1));
        assert!(!tracker.release(&mut system, 1));
        assert_eq!(system.subscription_count(), 0);
    }
}
