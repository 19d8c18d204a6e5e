//! Data-driven content definitions and loaders.
//!
//! This crate houses static cast content and provides loaders for RON/TOML data files:
//! - Ability catalog (data-driven via RON, with an embedded default)
//! - Hero templates (data-driven via RON)
//! - Cast configuration (data-driven via TOML)
//!
//! Content is consumed by the runtime backends and never changes at runtime.

pub mod abilities;
pub mod heroes;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use abilities::{AbilityCatalog, AbilityDefinition};
pub use heroes::{HeroAttributes, HeroTemplate};

#[cfg(feature = "loaders")]
pub use loaders::{AbilityLoader, ConfigLoader, ContentFactory, HeroLoader};
