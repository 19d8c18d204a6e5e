use glam::Vec3;

use crate::state::ActorId;

/// Transform store for acting actors.
///
/// Tasks and targeting strategies only keep an [`ActorId`]; they resolve it
/// through this trait every frame, so a destroyed actor simply stops
/// resolving.
pub trait AvatarAccess {
    fn location(&self, actor: ActorId) -> Option<Vec3>;

    /// Yaw in degrees.
    fn yaw(&self, actor: ActorId) -> Option<f32>;

    /// Returns false if the actor no longer exists.
    fn set_yaw(&mut self, actor: ActorId, yaw: f32) -> bool;
}
