//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from activation, actor lookup and worker coordination so
//! clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use cast_core::{AbilityId, ActivateError, ActorId, EnvError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("actor {0} does not exist")]
    UnknownActor(ActorId),

    #[error("actor {0} is not a hero")]
    NotAHero(ActorId),

    #[error("hero '{hero}' references unknown {ability}")]
    UnknownAbility { hero: String, ability: AbilityId },

    #[error(transparent)]
    Activate(#[from] ActivateError),

    #[error("actor {actor}: {source}")]
    Env {
        actor: ActorId,
        #[source]
        source: EnvError,
    },

    #[error("actor {0} has no targeting in progress")]
    NoActiveTargeting(ActorId),

    #[error("frame delta must be a positive, finite, non-zero period, got {0}")]
    InvalidFrameDelta(f32),

    #[error("{0} must be at least 1")]
    ZeroBufferSize(&'static str),

    #[error("runtime requires an ability catalog before building")]
    MissingCatalog,

    #[error("frame worker command channel closed")]
    CommandChannelClosed,

    #[error("frame worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("frame worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
