//! Ability catalog loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityCatalog, AbilityDefinition};
use crate::loaders::{LoadResult, read_file};

const EMBEDDED_CATALOG: &str = include_str!("../../data/abilities.ron");

/// Ability catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityCatalogFile {
    pub abilities: Vec<AbilityDefinition>,
}

/// Loader for the ability catalog from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    /// Load the ability catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<AbilityCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid ability catalog {}: {}", path.display(), e))
    }

    /// The catalog shipped with the crate.
    pub fn embedded() -> LoadResult<AbilityCatalog> {
        Self::parse(EMBEDDED_CATALOG)
    }

    /// Parses and validates a catalog.
    ///
    /// Ids must be unique and cooldowns, cast times and costs non-negative.
    pub fn parse(content: &str) -> LoadResult<AbilityCatalog> {
        let file: AbilityCatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability catalog RON: {}", e))?;

        let mut catalog = AbilityCatalog::new();
        for definition in file.abilities {
            if definition.cooldown < 0.0 || definition.cast_time < 0.0 || definition.mana_cost < 0.0
            {
                anyhow::bail!("ability {} '{}' has a negative value", definition.id, definition.name);
            }
            let id = definition.id;
            if catalog.insert(definition).is_some() {
                anyhow::bail!("duplicate ability id {}", id);
            }
        }

        tracing::debug!(abilities = catalog.len(), "ability catalog loaded");
        Ok(catalog)
    }
}
