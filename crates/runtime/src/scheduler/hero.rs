//! Per-hero state owned by the scheduler: the slot controller, the actor's
//! ability system and the targeting strategy in progress.

use cast_core::{
    AbilityCastController, AbilityHandle, AbilityNotification, AbilitySystem, AbilitySystemComponent, ActorId,
    AttributeStore, CastEnv, NetRole, SlotIndex, SpellState, TargetingStrategy,
};
use serde::{Deserialize, Serialize};

use crate::backend::SimAbilitySystem;

pub(crate) struct ActiveTargeting {
    /// Ability that requested the targeting, if any. Ending that ability
    /// cancels the targeting.
    pub(crate) ability: Option<AbilityHandle>,
    pub(crate) strategy: Box<dyn TargetingStrategy>,
}

/// A spawned hero.
pub struct Hero {
    actor: ActorId,
    name: String,
    level: u32,
    pub(crate) controller: AbilityCastController,
    pub(crate) system: Option<SimAbilitySystem>,
    pub(crate) targeting: Option<ActiveTargeting>,
}

impl Hero {
    pub(crate) fn new(
        actor: ActorId,
        name: String,
        level: u32,
        role: NetRole,
        system: Option<SimAbilitySystem>,
    ) -> Self {
        Self {
            actor,
            name,
            level,
            controller: AbilityCastController::new(actor, role),
            system,
            targeting: None,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controller(&self) -> &AbilityCastController {
        &self.controller
    }

    pub fn system(&self) -> Option<&SimAbilitySystem> {
        self.system.as_ref()
    }

    pub fn system_mut(&mut self) -> Option<&mut SimAbilitySystem> {
        self.system.as_mut()
    }

    /// Splits the hero into its controller and a [`CastEnv`] over its
    /// ability system.
    pub(crate) fn parts(&mut self) -> (&mut AbilityCastController, CastEnv<'_>) {
        let env = CastEnv::new(
            self.system
                .as_mut()
                .map(|system| system as &mut dyn AbilitySystemComponent),
        );
        (&mut self.controller, env)
    }

    fn system_component(&self) -> Option<&dyn AbilitySystemComponent> {
        self.system
            .as_ref()
            .map(|system| system as &dyn AbilitySystemComponent)
    }

    /// Forwards queued ability-system notifications to the controller.
    ///
    /// Returns the handles of abilities that ended, in order.
    pub(crate) fn pump_notifications(&mut self) -> Vec<AbilityHandle> {
        let mut ended = Vec::new();
        loop {
            let notifications = match self.system.as_mut() {
                Some(system) => system.drain_notifications(),
                None => return ended,
            };
            if notifications.is_empty() {
                return ended;
            }
            let (controller, mut env) = self.parts();
            for notification in notifications {
                if let AbilityNotification::Ended { handle, .. } = notification {
                    ended.push(handle);
                }
                controller.handle_notification(&mut env, notification);
            }
        }
    }

    // ===== queries exposed to HUD consumers =====

    pub fn character_level(&self) -> u32 {
        self.level
    }

    /// Changes the character level. Zero and the current level are ignored.
    pub fn set_character_level(&mut self, level: u32) -> bool {
        if level == 0 || level == self.level {
            return false;
        }
        self.level = level;
        true
    }

    pub fn spell_count(&self) -> usize {
        self.controller.spell_count()
    }

    pub fn spell_state(&self, slot: SlotIndex) -> SpellState {
        self.controller.state(slot)
    }

    pub fn spell_cooldown(&self, slot: SlotIndex) -> f32 {
        self.controller.cooldown_remaining(self.system_component(), slot)
    }

    pub fn spell_cooldown_fraction(&self, slot: SlotIndex) -> f32 {
        self.controller.cooldown_fraction(self.system_component(), slot)
    }

    pub fn is_targeting(&self) -> bool {
        self.targeting
            .as_ref()
            .is_some_and(|active| active.strategy.status().is_running())
    }

    pub fn attribute_store(&self) -> Option<&dyn AttributeStore> {
        self.system.as_ref().map(|system| system as &dyn AttributeStore)
    }

    pub fn health(&self) -> f32 {
        self.attribute_store().map_or(0.0, |store| store.health())
    }

    pub fn max_health(&self) -> f32 {
        self.attribute_store().map_or(0.0, |store| store.max_health())
    }

    pub fn mana(&self) -> f32 {
        self.attribute_store().map_or(0.0, |store| store.mana())
    }

    pub fn max_mana(&self) -> f32 {
        self.attribute_store().map_or(0.0, |store| store.max_mana())
    }

    pub fn move_speed(&self) -> f32 {
        self.attribute_store().map_or(0.0, |store| store.move_speed())
    }

    pub fn snapshot(&self) -> HeroSnapshot {
        HeroSnapshot {
            actor: self.actor,
            name: self.name.clone(),
            level: self.level,
            slots: self
                .controller
                .slots()
                .iter()
                .enumerate()
                .map(|(slot, record)| SlotSnapshot {
                    slot,
                    ability: record.ability,
                    state: self.spell_state(slot),
                    cooldown: self.spell_cooldown(slot),
                    cooldown_fraction: self.spell_cooldown_fraction(slot),
                })
                .collect(),
            health: self.health(),
            max_health: self.max_health(),
            mana: self.mana(),
            max_mana: self.max_mana(),
            move_speed: self.move_speed(),
            is_targeting: self.is_targeting(),
        }
    }
}

impl std::fmt::Debug for Hero {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hero")
            .field("actor", &self.actor)
            .field("name", &self.name)
            .field("level", &self.level)
            .field("controller", &self.controller)
            .field("has_system", &self.system.is_some())
            .field("weapon", &self.controller.weapon())
            .field("is_targeting", &self.is_targeting())
            .finish()
    }
}

/// Read-only view of one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub slot: SlotIndex,
    pub ability: AbilityHandle,
    pub state: SpellState,
    pub cooldown: f32,
    pub cooldown_fraction: f32,
}

/// Read-only view of a hero, safe to send across tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroSnapshot {
    pub actor: ActorId,
    pub name: String,
    pub level: u32,
    pub slots: Vec<SlotSnapshot>,
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub move_speed: f32,
    pub is_targeting: bool,
}
