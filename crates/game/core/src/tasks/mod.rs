//! Multi-frame ability tasks.
//!
//! A task is started with [`AbilityTask::activate`], which never blocks, and
//! is then ticked once per frame by the [`TaskRunner`] until it reports a
//! terminal [`TaskStatus`]. External callbacks (move completion) are routed
//! to the task by the runner within the frame they fire.
mod look_at;
mod move_near;
mod runner;

use crate::config::CastConfig;
use crate::env::{AvatarAccess, MoveResult, Navigation};
use crate::state::{AbilityHandle, ActorId};
use crate::status::TaskStatus;

pub use look_at::LookAtLocation;
pub use move_near::MoveNearLocation;
pub use runner::TaskRunner;

/// World view needed by tasks: actor transforms and movement controllers.
pub trait TaskWorld: AvatarAccess + Navigation {}

impl<T: AvatarAccess + Navigation + ?Sized> TaskWorld for T {}

pub struct TaskContext<'a> {
    pub config: &'a CastConfig,
    pub world: &'a mut dyn TaskWorld,
}

impl<'a> TaskContext<'a> {
    pub fn new(config: &'a CastConfig, world: &'a mut dyn TaskWorld) -> Self {
        Self { config, world }
    }
}

/// Opaque identity of a running task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsyncTaskHandle(pub u64);

impl std::fmt::Display for AsyncTaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task:{}", self.0)
    }
}

/// Terminal event of one task, reported exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskEvent {
    Reached {
        handle: AsyncTaskHandle,
        owner: AbilityHandle,
    },
    Cancelled {
        handle: AsyncTaskHandle,
        owner: AbilityHandle,
    },
}

impl TaskEvent {
    pub fn handle(&self) -> AsyncTaskHandle {
        match self {
            TaskEvent::Reached { handle, .. } | TaskEvent::Cancelled { handle, .. } => *handle,
        }
    }
}

pub trait AbilityTask: Send {
    fn name(&self) -> &'static str;

    /// Acting actor. Resolved through the world every call.
    fn actor(&self) -> ActorId;

    /// Starts the operation. Immediate outcomes resolve here.
    fn activate(&mut self, ctx: &mut TaskContext<'_>) -> TaskStatus;

    fn tick(&mut self, ctx: &mut TaskContext<'_>, dt: f32) -> TaskStatus;

    /// Move-completed callback for this task's actor.
    fn on_move_completed(&mut self, _ctx: &mut TaskContext<'_>, _result: MoveResult) -> TaskStatus {
        self.status()
    }

    /// Cooperative cancel. No effect once finished.
    fn cancel(&mut self, ctx: &mut TaskContext<'_>);

    /// Releases external subscriptions. `forced` is set when the owning
    /// ability ended before the task finished.
    fn on_destroy(&mut self, ctx: &mut TaskContext<'_>, forced: bool);

    fn status(&self) -> TaskStatus;
}
