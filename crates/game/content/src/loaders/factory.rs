//! Content factory for loading every data file from one directory.

use std::path::{Path, PathBuf};

use cast_core::CastConfig;

use crate::abilities::AbilityCatalog;
use crate::heroes::HeroTemplate;
use crate::loaders::{AbilityLoader, ConfigLoader, HeroLoader, LoadResult};

/// Content factory that loads all cast content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── cast.toml
/// ├── abilities.ron
/// └── heroes.ron
/// ```
///
/// A missing `cast.toml` or `abilities.ron` falls back to the built-in
/// defaults; `heroes.ron` is required.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load cast configuration from `cast.toml`.
    pub fn load_config(&self) -> LoadResult<CastConfig> {
        let path = self.data_dir.join("cast.toml");
        if !path.exists() {
            return Ok(CastConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the ability catalog from `abilities.ron`.
    pub fn load_abilities(&self) -> LoadResult<AbilityCatalog> {
        let path = self.data_dir.join("abilities.ron");
        if !path.exists() {
            return AbilityLoader::embedded();
        }
        AbilityLoader::load(&path)
    }

    /// Load hero templates from `heroes.ron`, checked against `catalog`.
    pub fn load_heroes(&self, catalog: &AbilityCatalog) -> LoadResult<Vec<HeroTemplate>> {
        let path = self.data_dir.join("heroes.ron");
        let heroes = HeroLoader::load(&path)?;
        for hero in &heroes {
            HeroLoader::validate(hero, catalog)?;
        }
        Ok(heroes)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
