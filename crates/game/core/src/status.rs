//! Status returned by frame-driven units of work.

/// The result of ticking a task or a targeting strategy.
///
/// # Frame Semantics
///
/// Work that spans several frames reports `Running` and is ticked again on the
/// next frame. Once a terminal status is reported it never changes:
/// - `Completed`: the unit reached its goal (target reached, target confirmed)
/// - `Cancelled`: the unit gave up or was cancelled from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskStatus {
    /// Still in progress; tick again next frame.
    Running,

    /// Finished successfully.
    Completed,

    /// Finished without reaching the goal.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, TaskStatus::Running)
    }

    /// Returns `true` for `Completed` and `Cancelled`.
    #[inline]
    pub fn is_finished(self) -> bool {
        !self.is_running()
    }

    /// Returns `true` if this status is `Completed`.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Latch that lets a unit of work enter a terminal status exactly once.
///
/// Tasks and targeting strategies route every finish through
/// [`FinishLatch::finish`], so late cancels or duplicate completion callbacks
/// are absorbed instead of producing a second terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishLatch {
    status: TaskStatus,
}

impl FinishLatch {
    pub const fn new() -> Self {
        Self {
            status: TaskStatus::Running,
        }
    }

    #[inline]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Moves to `status` if still running. Returns `true` only for the call
    /// that performed the transition.
    pub fn finish(&mut self, status: TaskStatus) -> bool {
        if self.status.is_finished() || status.is_running() {
            return false;
        }
        self.status = status;
        true
    }
}

impl Default for FinishLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_accepts_first_terminal_status_only() {
        let mut latch = FinishLatch::new();
        assert!(latch.finish(TaskStatus::Completed));
        assert!(!latch.finish(TaskStatus::Cancelled));
        assert!(!latch.finish(TaskStatus::Completed));
        assert_eq!(latch.status(), TaskStatus::Completed);
    }

    #[test]
    fn latch_ignores_running() {
        let mut latch = FinishLatch::new();
        assert!(!latch.finish(TaskStatus::Running));
        assert!(latch.status().is_running());
    }
}
