//! Common error infrastructure for cast-core.
//!
//! This module provides shared types and traits used across all error types in
//! cast-core. Domain-specific errors (e.g., `ActivateError`, `CooldownError`)
//! are defined in their respective modules alongside the operations that raise
//! them.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each boundary has its own error type with specific variants
//! - **Rich Context**: Errors carry the actor and slot they concern
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **Never Fatal**: No variant in this crate aborts a frame; callers degrade
//!   to a no-op or a cancelled outcome

use crate::state::{ActorId, SlotIndex};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: Temporary conditions that may succeed on retry
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Reserved for collaborators; nothing in this crate uses it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry later.
    ///
    /// Examples: ability already active, actor not initialized yet
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: slot index out of range
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: committed ability whose cooldown effect cannot be found
    Internal,

    /// Fatal error - state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Actor that owns the failing operation (if known).
    pub actor: Option<ActorId>,

    /// Slot the operation targeted (if applicable).
    pub slot: Option<SlotIndex>,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actor: None,
            slot: None,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a slot to this context (builder pattern).
    #[must_use]
    pub const fn with_slot(mut self, slot: SlotIndex) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all cast-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CastError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    ///
    /// This is useful for log fields and for asserting in tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
