//! Hero template loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityCatalog;
use crate::heroes::HeroTemplate;
use crate::loaders::{LoadResult, read_file};

/// Hero roster structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroRosterFile {
    pub heroes: Vec<HeroTemplate>,
}

/// Loader for hero templates from RON files.
pub struct HeroLoader;

impl HeroLoader {
    /// Load hero templates from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<HeroTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<HeroTemplate>> {
        let roster: HeroRosterFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse hero roster RON: {}", e))?;
        Ok(roster.heroes)
    }

    /// Checks that every spell and weapon of `hero` exists in `catalog`.
    pub fn validate(hero: &HeroTemplate, catalog: &AbilityCatalog) -> LoadResult<()> {
        let missing = hero
            .spells
            .iter()
            .chain(hero.weapon.iter())
            .find(|id| !catalog.contains(**id));
        match missing {
            Some(id) => Err(anyhow::anyhow!(
                "hero '{}' references unknown {}",
                hero.name,
                id
            )),
            None => Ok(()),
        }
    }
}
