//! Game configuration loader.

use std::path::Path;

use game_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("action_points = 8\ndispel_attempts = 3\n").expect("parse");
        assert_eq!(config.action_points, 8);
        assert_eq!(config.dispel_attempts, 3);
        assert_eq!(config.movement_loop_guard, GameConfig::DEFAULT_MOVEMENT_LOOP_GUARD);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = ConfigLoader::parse("action_points = \"many\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config TOML"));
    }
}
