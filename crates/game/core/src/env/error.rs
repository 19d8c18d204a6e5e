//! Collaborator access errors.

use crate::error::{CastError, ErrorSeverity};
use crate::state::ActorId;

/// Errors that occur when a required collaborator is missing.
///
/// None of these abort a frame; the caller turns them into a no-op or a
/// cancelled outcome.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvError {
    /// The actor's ability system is not initialized yet.
    #[error("ability system not available")]
    AbilitySystemUnavailable,

    /// The acting actor no longer resolves.
    #[error("avatar {0} not found")]
    AvatarNotFound(ActorId),

    /// The actor has no movement controller.
    #[error("actor {0} has no movement controller")]
    NoController(ActorId),
}

impl CastError for EnvError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            EnvError::AbilitySystemUnavailable => ErrorSeverity::Recoverable,
            EnvError::AvatarNotFound(_) | EnvError::NoController(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EnvError::AbilitySystemUnavailable => "ENV_ABILITY_SYSTEM_UNAVAILABLE",
            EnvError::AvatarNotFound(_) => "ENV_AVATAR_NOT_FOUND",
            EnvError::NoController(_) => "ENV_NO_CONTROLLER",
        }
    }
}
