use std::collections::BTreeMap;

use tracing::debug;

use super::{AbilityTask, AsyncTaskHandle, TaskContext, TaskEvent};
use crate::env::MoveResult;
use crate::state::{AbilityHandle, ActorId};
use crate::status::TaskStatus;

struct TaskEntry {
    owner: AbilityHandle,
    task: Box<dyn AbilityTask>,
}

/// Arena of running tasks, ticked in creation order.
///
/// A task leaves the arena the moment it finishes; its terminal event is
/// queued at that point, so every task reports exactly once.
#[derive(Default)]
pub struct TaskRunner {
    next_handle: u64,
    tasks: BTreeMap<AsyncTaskHandle, TaskEntry>,
    events: Vec<TaskEvent>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `task` on behalf of `owner`.
    ///
    /// Tasks that resolve during activation never enter the arena; their
    /// terminal event is queued right away.
    pub fn spawn(
        &mut self,
        ctx: &mut TaskContext<'_>,
        owner: AbilityHandle,
        mut task: Box<dyn AbilityTask>,
    ) -> AsyncTaskHandle {
        self.next_handle += 1;
        let handle = AsyncTaskHandle(self.next_handle);

        let status = task.activate(ctx);
        debug!(
            target: "cast::tasks",
            %handle,
            %owner,
            task = task.name(),
            actor = %task.actor(),
            %status,
            "task spawned"
        );

        if status.is_finished() {
            self.retire(ctx, handle, TaskEntry { owner, task }, false);
        } else {
            self.tasks.insert(handle, TaskEntry { owner, task });
        }
        handle
    }

    pub fn tick_all(&mut self, ctx: &mut TaskContext<'_>, dt: f32) {
        let handles: Vec<AsyncTaskHandle> = self.tasks.keys().copied().collect();
        for handle in handles {
            let finished = match self.tasks.get_mut(&handle) {
                Some(entry) => entry.task.tick(ctx, dt).is_finished(),
                None => false,
            };
            if finished {
                self.retire_handle(ctx, handle, false);
            }
        }
    }

    /// Routes a move-completed callback to every task acting for `actor`.
    pub fn deliver_move_completed(
        &mut self,
        ctx: &mut TaskContext<'_>,
        actor: ActorId,
        result: MoveResult,
    ) {
        let handles: Vec<AsyncTaskHandle> = self
            .tasks
            .iter()
            .filter(|(_, entry)| entry.task.actor() == actor)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in handles {
            let finished = match self.tasks.get_mut(&handle) {
                Some(entry) => entry.task.on_move_completed(ctx, result).is_finished(),
                None => false,
            };
            if finished {
                self.retire_handle(ctx, handle, false);
            }
        }
    }

    /// Cancels one task. Returns false if it already finished.
    pub fn cancel(&mut self, ctx: &mut TaskContext<'_>, handle: AsyncTaskHandle) -> bool {
        let Some(mut entry) = self.tasks.remove(&handle) else {
            return false;
        };
        entry.task.cancel(ctx);
        self.retire(ctx, handle, entry, false);
        true
    }

    /// Force-cancels every task owned by `owner` (the ability ended).
    pub fn cancel_owned_by(&mut self, ctx: &mut TaskContext<'_>, owner: AbilityHandle) -> usize {
        self.force_cancel_where(ctx, |entry| entry.owner == owner)
    }

    /// Force-cancels every task acting for `actor` (the actor is gone).
    pub fn cancel_for_actor(&mut self, ctx: &mut TaskContext<'_>, actor: ActorId) -> usize {
        self.force_cancel_where(ctx, |entry| entry.task.actor() == actor)
    }

    pub fn cancel_all(&mut self, ctx: &mut TaskContext<'_>) -> usize {
        self.force_cancel_where(ctx, |_| true)
    }

    fn force_cancel_where(
        &mut self,
        ctx: &mut TaskContext<'_>,
        matches: impl Fn(&TaskEntry) -> bool,
    ) -> usize {
        let handles: Vec<AsyncTaskHandle> = self
            .tasks
            .iter()
            .filter(|(_, entry)| matches(entry))
            .map(|(handle, _)| *handle)
            .collect();
        for handle in &handles {
            self.retire_handle(ctx, *handle, true);
        }
        handles.len()
    }

    fn retire_handle(&mut self, ctx: &mut TaskContext<'_>, handle: AsyncTaskHandle, forced: bool) {
        if let Some(entry) = self.tasks.remove(&handle) {
            self.retire(ctx, handle, entry, forced);
        }
    }

    fn retire(
        &mut self,
        ctx: &mut TaskContext<'_>,
        handle: AsyncTaskHandle,
        mut entry: TaskEntry,
        forced: bool,
    ) {
        entry.task.on_destroy(ctx, forced);
        let owner = entry.owner;
        let event = match entry.task.status() {
            TaskStatus::Completed => TaskEvent::Reached { handle, owner },
            TaskStatus::Cancelled | TaskStatus::Running => TaskEvent::Cancelled { handle, owner },
        };
        debug!(target: "cast::tasks", %handle, task = entry.task.name(), ?event, "task finished");
        self.events.push(event);
    }

    pub fn status(&self, handle: AsyncTaskHandle) -> Option<TaskStatus> {
        self.tasks.get(&handle).map(|entry| entry.task.status())
    }

    pub fn contains(&self, handle: AsyncTaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Takes the terminal events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<TaskEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("running", &self.tasks.len())
            .field("queued_events", &self.events.len())
            .finish()
    }
}
