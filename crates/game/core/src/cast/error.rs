//! Errors raised by the cast controller and the cooldown tracker.

use crate::error::{CastError, ErrorContext, ErrorSeverity};
use crate::state::{AbilityHandle, ActorId, SlotIndex, SpellState};

// ============================================================================
// Activation Errors
// ============================================================================

/// Reasons an activation request was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivateError {
    /// Slot index outside the slot array.
    #[error("slot {slot} out of range (count {count})")]
    InvalidSlot {
        slot: SlotIndex,
        count: usize,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },

    /// The actor has no ability system yet.
    #[error("ability system not available")]
    AbilitySystemUnavailable {
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },

    /// An instance of the slot's ability is already running.
    #[error("ability in slot {slot} is already active")]
    AlreadyActive {
        slot: SlotIndex,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },

    /// The slot is not Ready (casting or cooling down).
    #[error("slot {slot} is {state}, not ready")]
    NotReady {
        slot: SlotIndex,
        state: SpellState,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },

    /// The ability system refused the activation (cost, tags, cooldown).
    #[error("ability system rejected activation of slot {slot}")]
    Rejected {
        slot: SlotIndex,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },
}

impl ActivateError {
    pub fn invalid_slot(actor: Option<ActorId>, slot: SlotIndex, count: usize) -> Self {
        Self::InvalidSlot {
            slot,
            count,
            context: base_context(actor).with_message("slot index out of range"),
        }
    }

    pub fn system_unavailable(actor: Option<ActorId>) -> Self {
        Self::AbilitySystemUnavailable {
            context: base_context(actor),
        }
    }

    pub fn already_active(actor: Option<ActorId>, slot: SlotIndex) -> Self {
        Self::AlreadyActive {
            slot,
            context: base_context(actor).with_slot(slot),
        }
    }

    pub fn not_ready(actor: Option<ActorId>, slot: SlotIndex, state: SpellState) -> Self {
        Self::NotReady {
            slot,
            state,
            context: base_context(actor).with_slot(slot),
        }
    }

    pub fn rejected(actor: Option<ActorId>, slot: SlotIndex) -> Self {
        Self::Rejected {
            slot,
            context: base_context(actor)
                .with_slot(slot)
                .with_message("try_activate returned false"),
        }
    }
}

impl CastError for ActivateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidSlot { .. } => ErrorSeverity::Validation,
            Self::AbilitySystemUnavailable { .. }
            | Self::AlreadyActive { .. }
            | Self::NotReady { .. }
            | Self::Rejected { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::InvalidSlot { context, .. }
            | Self::AbilitySystemUnavailable { context }
            | Self::AlreadyActive { context, .. }
            | Self::NotReady { context, .. }
            | Self::Rejected { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSlot { .. } => "ACTIVATE_INVALID_SLOT",
            Self::AbilitySystemUnavailable { .. } => "ACTIVATE_SYSTEM_UNAVAILABLE",
            Self::AlreadyActive { .. } => "ACTIVATE_ALREADY_ACTIVE",
            Self::NotReady { .. } => "ACTIVATE_NOT_READY",
            Self::Rejected { .. } => "ACTIVATE_REJECTED",
        }
    }
}

// ============================================================================
// Cooldown Errors
// ============================================================================

/// Failures while arming a cooldown watch.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CooldownError {
    /// The ability reports a cooldown but no matching effect is active, or
    /// the effect vanished before the removal subscription was taken.
    #[error("cooldown effect not found for {handle} in slot {slot}")]
    EffectNotFound {
        slot: SlotIndex,
        handle: AbilityHandle,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },

    /// The ability system no longer knows the slot's ability.
    #[error("ability {handle} in slot {slot} is not granted")]
    UnknownAbility {
        slot: SlotIndex,
        handle: AbilityHandle,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: ErrorContext,
    },
}

impl CooldownError {
    pub fn effect_not_found(slot: SlotIndex, handle: AbilityHandle) -> Self {
        Self::EffectNotFound {
            slot,
            handle,
            context: ErrorContext::new()
                .with_slot(slot)
                .with_message("no active effect matches the cooldown tags"),
        }
    }

    pub fn unknown_ability(slot: SlotIndex, handle: AbilityHandle) -> Self {
        Self::UnknownAbility {
            slot,
            handle,
            context: ErrorContext::new().with_slot(slot),
        }
    }
}

impl CastError for CooldownError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::EffectNotFound { context, .. } | Self::UnknownAbility { context, .. } => {
                Some(context)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EffectNotFound { .. } => "COOLDOWN_EFFECT_NOT_FOUND",
            Self::UnknownAbility { .. } => "COOLDOWN_UNKNOWN_ABILITY",
        }
    }
}

fn base_context(actor: Option<ActorId>) -> ErrorContext {
    match actor {
        Some(actor) => ErrorContext::new().with_actor(actor),
        None => ErrorContext::new(),
    }
}
