use glam::Vec3;

use crate::state::{ActorId, SubscriptionToken};

/// Immediate outcome of a move request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum MoveRequestResult {
    Failed,
    AlreadyAtGoal,
    RequestSuccessful,
}

/// Final outcome of an accepted move request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum MoveResult {
    Success,
    Blocked,
    OffPath,
    Aborted,
    Invalid,
}

/// Path-following status of an actor's movement controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum MoveStatus {
    Idle,
    Waiting,
    Paused,
    Moving,
}

/// Navigation backend driving actor movement controllers.
pub trait Navigation {
    /// Returns true if the actor has a movement controller.
    fn has_controller(&self, actor: ActorId) -> bool;

    /// Requests a move; actors without a controller get `Failed`.
    fn move_to_location(
        &mut self,
        actor: ActorId,
        goal: Vec3,
        acceptance_radius: f32,
    ) -> MoveRequestResult;

    /// Subscribes to move-completed notifications for `actor`.
    fn subscribe_move_completed(&mut self, actor: ActorId) -> Option<SubscriptionToken>;

    fn unsubscribe_move_completed(&mut self, actor: ActorId, token: SubscriptionToken) -> bool;

    /// Returns `None` when the actor has no controller.
    fn move_status(&self, actor: ActorId) -> Option<MoveStatus>;
}
