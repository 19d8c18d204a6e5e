//! Event types for different topics.

use cast_core::{ActorId, Attribute, CastEvent, TargetResult, TaskEvent};
use serde::{Deserialize, Serialize};

/// Controller event of one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastNotice {
    pub actor: ActorId,
    pub event: CastEvent,
}

/// Outcome of a targeting operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetingEvent {
    /// A strategy produced confirmed target data.
    TargetDataReady {
        actor: ActorId,
        strategy: String,
        result: TargetResult,
    },
    /// A strategy was cancelled or lost its requester.
    TargetingCancelled { actor: ActorId, strategy: String },
}

impl TargetingEvent {
    pub fn actor(&self) -> ActorId {
        match self {
            TargetingEvent::TargetDataReady { actor, .. }
            | TargetingEvent::TargetingCancelled { actor, .. } => *actor,
        }
    }
}

/// Terminal event of an ability task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskFinished {
    pub actor: ActorId,
    pub event: TaskEvent,
}

/// Attribute write observed on an actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeChanged {
    pub actor: ActorId,
    pub attribute: Attribute,
    pub value: f32,
}
