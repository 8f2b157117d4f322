//! Content factory for building the engine's content registry from data files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use game_core::{ContentRegistry, GameConfig};
use tracing::info;

use crate::abilities::builtin_abilities;
use crate::effects::builtin_templates;
use crate::loaders::{ConfigLoader, LoadResult, TuningCatalog, TuningLoader};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── abilities.ron
/// ```
///
/// Both files are optional: a missing file falls back to the built-in values.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The `data/` directory shipped with this crate.
    pub fn builtin() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load game configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(GameConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load ability tuning overrides from `abilities.ron`.
    pub fn load_tuning(&self) -> LoadResult<TuningCatalog> {
        let path = self.data_dir.join("abilities.ron");
        if !path.exists() {
            return Ok(TuningCatalog::default());
        }
        TuningLoader::load(&path)
    }

    /// Built-in abilities and effect templates with the tuning overrides applied.
    pub fn load_content(&self) -> LoadResult<Arc<ContentRegistry>> {
        let mut abilities = builtin_abilities();
        let tuning = self.load_tuning()?;
        tuning.apply(&mut abilities)?;
        info!(
            target: "game_content::loaders",
            abilities = abilities.len(),
            overrides = tuning.abilities.len(),
            dir = %self.data_dir.display(),
            "content loaded"
        );
        Ok(Arc::new(ContentRegistry::new(abilities, builtin_templates())))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
