//! Traits describing the external collaborators of the cast subsystem.
//!
//! The ability-execution and duration-effect systems, the navigation backend,
//! the actor transform store and the attribute store are all owned outside of
//! this crate. [`CastEnv`] bundles the collaborators the controller needs for
//! one call so it never holds on to them between frames.
mod abilities;
mod attributes;
mod avatar;
mod error;
mod navigation;

pub use abilities::{
    AbilityNotification, AbilitySpecInfo, AbilitySystem, AbilitySystemComponent, ActiveEffectInfo,
    EffectQuery, EffectSpec, EffectSystem,
};
pub use attributes::{Attribute, AttributeStore};
pub use avatar::AvatarAccess;
pub use error::EnvError;
pub use navigation::{MoveRequestResult, MoveResult, MoveStatus, Navigation};

/// Collaborators borrowed for the duration of one controller call.
///
/// An actor whose ability system has not been created yet is represented by
/// an env without a system; every controller operation then degrades to a
/// no-op.
pub struct CastEnv<'a> {
    system: Option<&'a mut dyn AbilitySystemComponent>,
}

impl<'a> CastEnv<'a> {
    pub fn new(system: Option<&'a mut dyn AbilitySystemComponent>) -> Self {
        Self { system }
    }

    pub fn with_system(system: &'a mut dyn AbilitySystemComponent) -> Self {
        Self::new(Some(system))
    }

    pub fn empty() -> Self {
        Self { system: None }
    }

    /// Returns the ability system, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::AbilitySystemUnavailable` if no system was provided.
    pub fn system(&mut self) -> Result<&mut (dyn AbilitySystemComponent + 'a), EnvError> {
        self.system
            .as_deref_mut()
            .ok_or(EnvError::AbilitySystemUnavailable)
    }
}
