//! Content loaded from a data directory.
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use cast_content::{AbilityCatalog, ContentFactory, HeroTemplate};
use cast_core::CastConfig;
use tracing::info;

/// Everything the simulation reads from disk.
#[derive(Debug)]
pub struct Content {
    pub config: CastConfig,
    pub catalog: AbilityCatalog,
    pub heroes: Vec<HeroTemplate>,
}

impl Content {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let factory = ContentFactory::new(data_dir);
        let config = factory
            .load_config()
            .with_context(|| format!("loading cast config from {}", data_dir.display()))?;
        let catalog = factory.load_abilities().context("loading ability catalog")?;
        let heroes = factory.load_heroes(&catalog).context("loading hero roster")?;

        info!(
            data_dir = %data_dir.display(),
            abilities = catalog.len(),
            heroes = heroes.len(),
            "content loaded"
        );
        Ok(Self {
            config,
            catalog,
            heroes,
        })
    }

    /// Looks a hero up by name, ignoring ASCII case.
    pub fn hero(&self, name: &str) -> Result<&HeroTemplate> {
        self.heroes
            .iter()
            .find(|hero| hero.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let known: Vec<&str> = self.heroes.iter().map(|hero| hero.name.as_str()).collect();
                anyhow!("unknown hero '{}' (roster: {})", name, known.join(", "))
            })
    }
}
