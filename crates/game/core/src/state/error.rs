//! State management errors.
//!
//! Errors related to slot capacity and slot state transitions.

use crate::error::{CastError, ErrorSeverity};
use crate::state::{SlotIndex, SpellState};

/// Errors that occur while mutating slot records.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    /// Slot array is full (max capacity reached).
    #[error("slot array is full (max: {max})")]
    SlotsFull {
        /// Maximum capacity.
        max: usize,
    },

    /// A transition outside the cast cycle was requested.
    #[error("slot {slot}: illegal transition {from} -> {to}")]
    IllegalTransition {
        slot: SlotIndex,
        from: SpellState,
        to: SpellState,
    },
}

impl CastError for StateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            StateError::SlotsFull { .. } => ErrorSeverity::Validation,
            StateError::IllegalTransition { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StateError::SlotsFull { .. } => "STATE_SLOTS_FULL",
            StateError::IllegalTransition { .. } => "STATE_ILLEGAL_TRANSITION",
        }
    }
}
