//! Cast configuration loader.

use std::path::Path;

use cast_core::CastConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for cast configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys keep their [`CastConfig::default`] values.
    pub fn load(path: &Path) -> LoadResult<CastConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CastConfig> {
        let config: CastConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse cast config TOML: {}", e))?;

        if config.trace_range <= 0.0 {
            anyhow::bail!("trace_range must be positive, got {}", config.trace_range);
        }
        if config.default_turn_rate <= 0.0 {
            anyhow::bail!(
                "default_turn_rate must be positive, got {}",
                config.default_turn_rate
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse("trace_range = 1500.0\nmax_move_retries = 2\n").unwrap();

        assert_eq!(config.trace_range, 1500.0);
        assert_eq!(config.max_move_retries, 2);
        assert_eq!(config.capsule_half_height, CastConfig::DEFAULT_CAPSULE_HALF_HEIGHT);
    }

    #[test]
    fn rejects_non_positive_range() {
        assert!(ConfigLoader::parse("trace_range = 0.0").is_err());
    }
}
