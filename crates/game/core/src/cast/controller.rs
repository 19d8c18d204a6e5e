//! Per-actor spell slots and their cast lifecycle.
//!
//! [`AbilityCastController`] is the only writer of slot state. It forwards
//! activation requests to the external ability system and reacts to the
//! notifications that system queues:
//!
//! ```text
//! Ready ──activate──▶ Casting ──commit (cooldown)──▶ OnCooldown ──expiry──▶ Ready
//!                        │
//!                        └──commit (no cooldown) / end──▶ Ready
//! ```
use tracing::{debug, trace, warn};

use super::cooldown::CooldownTracker;
use super::error::{ActivateError, CooldownError};
use crate::config::CastConfig;
use crate::env::{AbilityNotification, AbilitySystemComponent, CastEnv, EffectSpec};
use crate::error::CastError;
use crate::events::{CastEvent, Observers};
use crate::state::{
    AbilityHandle, AbilityId, ActorId, EffectHandle, SlotIndex, SpellSlot, SpellSlots, SpellState,
    StateError, SubscriptionToken,
};

/// Network role of the controller's owner.
///
/// Only the authoritative copy grants abilities; proxies mirror slot state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetRole {
    #[default]
    Authority,
    AutonomousProxy,
    SimulatedProxy,
}

pub struct AbilityCastController {
    actor: ActorId,
    role: NetRole,
    slots: SpellSlots,
    sealed: bool,
    weapon: Option<AbilityHandle>,
    cooldowns: CooldownTracker,
    events: Observers<CastEvent>,
}

impl AbilityCastController {
    pub fn new(actor: ActorId, role: NetRole) -> Self {
        Self {
            actor,
            role,
            slots: SpellSlots::new(),
            sealed: false,
            weapon: None,
            cooldowns: CooldownTracker::new(),
            events: Observers::new(),
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Grants `ability` into the next free slot.
    ///
    /// Returns `None` without side effects when initialization is sealed, the
    /// owner is not authoritative, the slots are full, or the ability system
    /// is missing or does not know the ability.
    pub fn grant_ability(
        &mut self,
        env: &mut CastEnv<'_>,
        ability: AbilityId,
        level: u32,
    ) -> Option<SlotIndex> {
        if !self.can_grant() {
            return None;
        }
        if self.slots.is_full() {
            let err = StateError::SlotsFull {
                max: CastConfig::MAX_SLOTS,
            };
            warn!(
                target: "cast::controller",
                actor = %self.actor,
                %ability,
                code = err.error_code(),
                "{}", err
            );
            return None;
        }

        let handle = env.system().ok()?.give_ability(ability, level)?;
        let index = self.slots.len();
        self.slots.push(SpellSlot::new(index, handle));

        debug!(
            target: "cast::controller",
            actor = %self.actor,
            %ability,
            %handle,
            slot = index,
            "ability granted"
        );
        Some(index)
    }

    /// Grants the weapon ability, held outside the slot array.
    ///
    /// A second grant replaces the first.
    pub fn grant_weapon_ability(
        &mut self,
        env: &mut CastEnv<'_>,
        ability: AbilityId,
        level: u32,
    ) -> Option<AbilityHandle> {
        if !self.can_grant() {
            return None;
        }
        let handle = env.system().ok()?.give_ability(ability, level)?;
        self.weapon = Some(handle);
        debug!(
            target: "cast::controller",
            actor = %self.actor,
            %ability,
            %handle,
            "weapon ability granted"
        );
        Some(handle)
    }

    /// Stops accepting grants for the rest of the actor's lifetime.
    pub fn seal_initialization(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn can_grant(&self) -> bool {
        if self.sealed {
            debug!(target: "cast::controller", actor = %self.actor, "grant ignored: sealed");
            return false;
        }
        if self.role != NetRole::Authority {
            debug!(
                target: "cast::controller",
                actor = %self.actor,
                role = %self.role,
                "grant ignored: not authoritative"
            );
            return false;
        }
        true
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Requests activation of the ability in `slot`.
    ///
    /// On success the slot moves to Casting and `SpellCast` is raised. Success
    /// only means the ability system accepted the request.
    ///
    /// # Errors
    ///
    /// See [`ActivateError`].
    pub fn try_activate(
        &mut self,
        env: &mut CastEnv<'_>,
        slot: SlotIndex,
        allow_remote: bool,
    ) -> Result<(), ActivateError> {
        let Some(record) = self.slots.get(slot).copied() else {
            return Err(ActivateError::invalid_slot(
                Some(self.actor),
                slot,
                self.slots.len(),
            ));
        };
        let system = env
            .system()
            .map_err(|_| ActivateError::system_unavailable(Some(self.actor)))?;

        if system.is_active(record.ability) {
            return Err(ActivateError::already_active(Some(self.actor), slot));
        }
        if record.state() != SpellState::Ready {
            return Err(ActivateError::not_ready(
                Some(self.actor),
                slot,
                record.state(),
            ));
        }
        if !system.try_activate(record.ability, allow_remote) {
            return Err(ActivateError::rejected(Some(self.actor), slot));
        }

        self.set_state(slot, SpellState::Casting);
        self.emit(CastEvent::SpellCast { slot });
        Ok(())
    }

    /// Boolean form of [`Self::try_activate`]; failures are logged.
    pub fn activate(&mut self, env: &mut CastEnv<'_>, slot: SlotIndex, allow_remote: bool) -> bool {
        match self.try_activate(env, slot, allow_remote) {
            Ok(()) => true,
            Err(err) => {
                debug!(
                    target: "cast::controller",
                    actor = %self.actor,
                    slot,
                    code = err.error_code(),
                    severity = err.severity().as_str(),
                    "activation refused: {}", err
                );
                false
            }
        }
    }

    /// Activates the weapon ability. Slot state is never touched.
    pub fn activate_weapon(&mut self, env: &mut CastEnv<'_>) -> bool {
        let Some(handle) = self.weapon else {
            return false;
        };
        match env.system() {
            Ok(system) => system.try_activate(handle, true),
            Err(_) => false,
        }
    }

    // ========================================================================
    // Ability system notifications
    // ========================================================================

    /// Routes one queued notification to its handler.
    pub fn handle_notification(&mut self, env: &mut CastEnv<'_>, notification: AbilityNotification) {
        match notification {
            AbilityNotification::Activated(handle) => self.on_ability_activated(handle),
            AbilityNotification::Committed(handle) => self.on_ability_committed(env, handle),
            AbilityNotification::Ended { handle, cancelled } => {
                self.on_ability_ended(handle, cancelled)
            }
            AbilityNotification::EffectApplied {
                source,
                spec,
                handle,
            } => self.on_effect_applied_to_self(source, spec, handle),
            AbilityNotification::EffectRemoved { handle } => {
                self.on_effect_removed_from_self(env, handle)
            }
        }
    }

    pub fn on_ability_activated(&mut self, handle: AbilityHandle) {
        trace!(
            target: "cast::controller",
            actor = %self.actor,
            %handle,
            slot = ?self.slot_of(handle),
            "ability activated"
        );
    }

    /// Moves a casting slot to OnCooldown (arming a watch) or back to Ready.
    ///
    /// If the ability reports a cooldown but its effect cannot be found, the
    /// slot stays Casting until the end notification resets it.
    pub fn on_ability_committed(&mut self, env: &mut CastEnv<'_>, handle: AbilityHandle) {
        let Some(slot) = self.slot_of(handle) else {
            return;
        };
        if self.state(slot) != SpellState::Casting {
            trace!(target: "cast::controller", slot, "commit ignored: slot not casting");
            return;
        }
        let Ok(system) = env.system() else {
            return;
        };

        if !system.is_on_cooldown(handle) {
            self.set_state(slot, SpellState::Ready);
            return;
        }

        match self.cooldowns.arm(system, slot, handle) {
            Ok(_) => {
                self.set_state(slot, SpellState::OnCooldown);
                self.emit(CastEvent::SpellGoneCooldown { slot });
            }
            Err(err) => self.log_cooldown_error(&err),
        }
    }

    /// Resets a slot that ended while still Casting.
    pub fn on_ability_ended(&mut self, handle: AbilityHandle, cancelled: bool) {
        let Some(slot) = self.slot_of(handle) else {
            return;
        };
        if self.state(slot) == SpellState::Casting {
            debug!(
                target: "cast::controller",
                actor = %self.actor,
                slot,
                cancelled,
                "ability ended before cooldown"
            );
            self.set_state(slot, SpellState::Ready);
        }
    }

    pub fn on_effect_applied_to_self(
        &mut self,
        source: Option<ActorId>,
        spec: EffectSpec,
        handle: EffectHandle,
    ) {
        self.emit(CastEvent::EffectAppliedToSelf {
            source,
            spec,
            handle,
        });
    }

    /// Raises `EffectRemovedFromSelf` and, if the effect was a watched
    /// cooldown, settles the owning slot.
    pub fn on_effect_removed_from_self(&mut self, env: &mut CastEnv<'_>, effect: EffectHandle) {
        self.emit(CastEvent::EffectRemovedFromSelf { handle: effect });

        let Some(slot) = self.cooldowns.slot_for_effect(effect) else {
            return;
        };
        let Ok(system) = env.system() else {
            return;
        };
        self.cooldowns.release(system, slot);

        let handle = self.slots[slot].ability;
        if !system.is_on_cooldown(handle) {
            self.set_state(slot, SpellState::Ready);
            self.emit(CastEvent::SpellOffCooldown { slot });
            return;
        }

        // Another cooldown instance is still running; follow it.
        if let Err(err) = self.cooldowns.arm(system, slot, handle) {
            self.log_cooldown_error(&err);
        }
    }

    /// Releases every cooldown watch. Called when the actor is destroyed.
    pub fn shutdown(&mut self, env: &mut CastEnv<'_>) {
        if let Ok(system) = env.system() {
            self.cooldowns.release_all(system);
        }
        self.events.clear();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// State of `slot`; `Disabled` for indices that do not exist.
    pub fn state(&self, slot: SlotIndex) -> SpellState {
        self.slots
            .get(slot)
            .map_or(SpellState::Disabled, SpellSlot::state)
    }

    /// Seconds of cooldown left on `slot`, 0 when none is active or the
    /// actor has no ability system.
    pub fn cooldown_remaining(
        &self,
        system: Option<&dyn AbilitySystemComponent>,
        slot: SlotIndex,
    ) -> f32 {
        self.remaining_and_duration(system, slot).0.max(0.0)
    }

    /// Remaining fraction of the cooldown on `slot`, in `[0, 1]`.
    pub fn cooldown_fraction(
        &self,
        system: Option<&dyn AbilitySystemComponent>,
        slot: SlotIndex,
    ) -> f32 {
        let (remaining, duration) = self.remaining_and_duration(system, slot);
        if duration <= 0.0 {
            return 0.0;
        }
        (remaining / duration).clamp(0.0, 1.0)
    }

    fn remaining_and_duration(
        &self,
        system: Option<&dyn AbilitySystemComponent>,
        slot: SlotIndex,
    ) -> (f32, f32) {
        match (self.slots.get(slot), system) {
            (Some(record), Some(system)) => system.cooldown_remaining_and_duration(record.ability),
            _ => (0.0, 0.0),
        }
    }

    pub fn spell_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[SpellSlot] {
        &self.slots
    }

    pub fn slot_of(&self, handle: AbilityHandle) -> Option<SlotIndex> {
        self.slots
            .iter()
            .find(|slot| slot.ability == handle)
            .map(|slot| slot.index)
    }

    pub fn weapon(&self) -> Option<AbilityHandle> {
        self.weapon
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe(&mut self, observer: impl FnMut(&CastEvent) + Send + 'static) -> SubscriptionToken {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }

    fn emit(&mut self, event: CastEvent) {
        trace!(target: "cast::controller", actor = %self.actor, ?event, "cast event");
        self.events.broadcast(&event);
    }

    fn set_state(&mut self, slot: SlotIndex, next: SpellState) {
        match self.slots[slot].transition(next) {
            Ok(previous) => trace!(
                target: "cast::controller",
                actor = %self.actor,
                slot,
                from = %previous,
                to = %next,
                "slot transition"
            ),
            Err(err) => warn!(
                target: "cast::controller",
                actor = %self.actor,
                code = err.error_code(),
                "{}", err
            ),
        }
    }

    fn log_cooldown_error(&self, err: &CooldownError) {
        warn!(
            target: "cast::controller",
            actor = %self.actor,
            code = err.error_code(),
            severity = err.severity().as_str(),
            "{}", err
        );
    }
}

impl std::fmt::Debug for AbilityCastController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityCastController")
            .field("actor", &self.actor)
            .field("role", &self.role)
            .field("slots", &self.slots)
            .field("sealed", &self.sealed)
            .field("weapon", &self.weapon)
            .field("cooldowns", &self.cooldowns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::state::TagSet;
    use crate::testing::FakeAbilitySystem;
    use crate::AbilitySystem;

    const ACTOR: ActorId = ActorId(1);

    struct Fixture {
        system: FakeAbilitySystem,
        controller: AbilityCastController,
        events: Arc<Mutex<Vec<CastEvent>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut controller = AbilityCastController::new(ACTOR, NetRole::Authority);
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            controller.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
            Self {
                system: FakeAbilitySystem::new(),
                controller,
                events,
            }
        }

        /// Grants an ability whose cooldown effects carry `tag`.
        fn grant(&mut self, tag: &str) -> SlotIndex {
            let mut env = CastEnv::with_system(&mut self.system);
            let slot = self.controller.grant_ability(&mut env, AbilityId(7), 1).unwrap();
            let handle = self.controller.slots()[slot].ability;
            // Re-register the handle with cooldown tags.
            self.system.set_cooldown_tags(handle, TagSet::single(tag));
            slot
        }

        fn activate(&mut self, slot: SlotIndex) -> bool {
            let mut env = CastEnv::with_system(&mut self.system);
            self.controller.activate(&mut env, slot, true)
        }

        fn commit(&mut self, slot: SlotIndex) {
            let handle = self.controller.slots()[slot].ability;
            let mut env = CastEnv::with_system(&mut self.system);
            self.controller.on_ability_committed(&mut env, handle);
        }

        fn pump(&mut self) {
            for notification in self.system.drain_notifications() {
                let mut env = CastEnv::with_system(&mut self.system);
                self.controller.handle_notification(&mut env, notification);
            }
        }

        fn events(&self) -> Vec<CastEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[test]
    fn invalid_slot_is_disabled_and_inert() {
        let mut fx = Fixture::new();
        assert_eq!(fx.controller.state(3), SpellState::Disabled);
        assert!(!fx.activate(3));

        let system: &dyn AbilitySystemComponent = &fx.system;
        assert_eq!(fx.controller.cooldown_remaining(Some(system), 3), 0.0);
        assert_eq!(fx.controller.cooldown_fraction(Some(system), 3), 0.0);
        assert_eq!(fx.controller.cooldown_fraction(None, 0), 0.0);
        assert!(fx.events().is_empty());
    }

    #[test]
    fn activation_without_system_fails() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        let mut env = CastEnv::empty();

        let err = fx.controller.try_activate(&mut env, slot, true).unwrap_err();

        assert_eq!(err.error_code(), "ACTIVATE_SYSTEM_UNAVAILABLE");
        assert_eq!(fx.controller.state(slot), SpellState::Ready);
    }

    #[test]
    fn commit_with_cooldown_goes_on_cooldown_then_ready() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");

        assert!(fx.activate(slot));
        assert_eq!(fx.controller.state(slot), SpellState::Casting);

        let effect = fx.system.apply_effect("Cooldown.A", 2.0);
        fx.commit(slot);
        assert_eq!(fx.controller.state(slot), SpellState::OnCooldown);

        fx.system.remove_effect(effect);
        fx.pump();

        assert_eq!(fx.controller.state(slot), SpellState::Ready);
        assert_eq!(
            fx.events(),
            vec![
                CastEvent::SpellCast { slot },
                CastEvent::SpellGoneCooldown { slot },
                CastEvent::EffectRemovedFromSelf { handle: effect },
                CastEvent::SpellOffCooldown { slot },
            ]
        );
        assert_eq!(fx.system.subscription_count(), 0);
    }

    #[test]
    fn commit_without_cooldown_returns_to_ready() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        fx.activate(slot);
        fx.commit(slot);
        assert_eq!(fx.controller.state(slot), SpellState::Ready);
    }

    #[test]
    fn missing_cooldown_effect_leaves_slot_casting_until_end() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        fx.activate(slot);

        // Reported on cooldown while no matching effect is active.
        fx.system.force_on_cooldown(fx.controller.slots()[slot].ability);
        fx.commit(slot);
        assert_eq!(fx.controller.state(slot), SpellState::Casting);

        let handle = fx.controller.slots()[slot].ability;
        fx.controller.on_ability_ended(handle, false);
        assert_eq!(fx.controller.state(slot), SpellState::Ready);
    }

    #[test]
    fn already_active_is_rejected() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        assert!(fx.activate(slot));

        let mut env = CastEnv::with_system(&mut fx.system);
        let err = fx.controller.try_activate(&mut env, slot, true).unwrap_err();
        assert!(matches!(err, ActivateError::AlreadyActive { .. }));
    }

    #[test]
    fn rejection_keeps_slot_ready() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        fx.system.reject_activation = true;

        assert!(!fx.activate(slot));
        assert_eq!(fx.controller.state(slot), SpellState::Ready);
        assert!(fx.events().is_empty());
    }

    #[test]
    fn cooldown_fraction_stays_in_unit_range() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        fx.activate(slot);
        fx.system.apply_effect("Cooldown.A", 4.0);
        fx.commit(slot);

        let system: &dyn AbilitySystemComponent = &fx.system;
        let fraction = fx.controller.cooldown_fraction(Some(system), slot);
        assert!((0.0..=1.0).contains(&fraction));
        assert_eq!(fx.controller.cooldown_remaining(Some(system), slot), 4.0);
    }

    #[test]
    fn expiry_with_second_instance_rearms() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        fx.activate(slot);
        let first = fx.system.apply_effect("Cooldown.A", 2.0);
        let second = fx.system.apply_effect("Cooldown.A.Shared", 5.0);
        fx.commit(slot);
        assert_eq!(fx.controller.cooldowns().watch(slot).unwrap().effect, second);

        fx.system.remove_effect(second);
        fx.pump();
        assert_eq!(fx.controller.state(slot), SpellState::OnCooldown);
        assert_eq!(fx.controller.cooldowns().watch(slot).unwrap().effect, first);

        fx.system.remove_effect(first);
        fx.pump();
        assert_eq!(fx.controller.state(slot), SpellState::Ready);
        let off: Vec<_> = fx
            .events()
            .into_iter()
            .filter(|e| matches!(e, CastEvent::SpellOffCooldown { .. }))
            .collect();
        assert_eq!(off.len(), 1);
    }

    #[test]
    fn grants_are_ignored_after_seal_or_off_authority() {
        let mut fx = Fixture::new();
        fx.controller.seal_initialization();
        let mut env = CastEnv::with_system(&mut fx.system);
        assert!(fx.controller.grant_ability(&mut env, AbilityId(1), 1).is_none());

        let mut proxy = AbilityCastController::new(ACTOR, NetRole::SimulatedProxy);
        assert!(proxy.grant_ability(&mut env, AbilityId(1), 1).is_none());
        assert_eq!(proxy.spell_count(), 0);
    }

    #[test]
    fn weapon_ability_does_not_touch_slots() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        let mut env = CastEnv::with_system(&mut fx.system);
        let weapon = fx
            .controller
            .grant_weapon_ability(&mut env, AbilityId(99), 1)
            .unwrap();

        assert!(fx.controller.activate_weapon(&mut env));
        assert_eq!(fx.controller.weapon(), Some(weapon));
        assert_eq!(fx.controller.slot_of(weapon), None);
        assert_eq!(fx.controller.state(slot), SpellState::Ready);
    }

    #[test]
    fn shutdown_releases_watches() {
        let mut fx = Fixture::new();
        let slot = fx.grant("Cooldown.A");
        fx.activate(slot);
        fx.system.apply_effect("Cooldown.A", 3.0);
        fx.commit(slot);
        assert_eq!(fx.system.subscription_count(), 1);

        let mut env = CastEnv::with_system(&mut fx.system);
        fx.controller.shutdown(&mut env);

        assert!(fx.controller.cooldowns().is_empty());
        assert_eq!(fx.system.subscription_count(), 0);
    }
}
