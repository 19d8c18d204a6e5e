//! Spell slot records.
//!
//! A slot binds a stable index to a granted ability handle and carries the
//! externally-observable cast state of that ability.

use arrayvec::ArrayVec;

use crate::config::CastConfig;
use crate::state::{AbilityHandle, SlotIndex, StateError};

/// Externally-observable state of one spell slot.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellState {
    /// The ability can be activated.
    Ready,
    /// Activated and waiting for commit or end.
    Casting,
    /// Committed; waiting for the cooldown effect to expire.
    OnCooldown,
    /// Sentinel returned for slot indices that do not exist.
    ///
    /// A granted slot never enters this state.
    Disabled,
}

impl SpellState {
    /// Returns true if the cast cycle allows moving from `self` to `next`.
    ///
    /// Allowed edges: Ready → Casting, Casting → OnCooldown, Casting → Ready,
    /// OnCooldown → Ready.
    pub const fn can_transition_to(self, next: SpellState) -> bool {
        matches!(
            (self, next),
            (SpellState::Ready, SpellState::Casting)
                | (SpellState::Casting, SpellState::OnCooldown)
                | (SpellState::Casting, SpellState::Ready)
                | (SpellState::OnCooldown, SpellState::Ready)
        )
    }
}

/// One granted spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellSlot {
    pub index: SlotIndex,
    pub ability: AbilityHandle,
    state: SpellState,
}

impl SpellSlot {
    pub fn new(index: SlotIndex, ability: AbilityHandle) -> Self {
        Self {
            index,
            ability,
            state: SpellState::Ready,
        }
    }

    #[inline]
    pub fn state(&self) -> SpellState {
        self.state
    }

    /// Moves the slot along the cast cycle.
    ///
    /// # Errors
    ///
    /// Returns `StateError::IllegalTransition` when the edge is not part of the
    /// cycle; the slot is left untouched.
    pub fn transition(&mut self, next: SpellState) -> Result<SpellState, StateError> {
        if !self.state.can_transition_to(next) {
            return Err(StateError::IllegalTransition {
                slot: self.index,
                from: self.state,
                to: next,
            });
        }
        let previous = self.state;
        self.state = next;
        Ok(previous)
    }
}

/// Fixed-capacity slot array owned by one controller.
pub type SpellSlots = ArrayVec<SpellSlot, { CastConfig::MAX_SLOTS }>;
