//! Ability tuning overrides.
//!
//! Behaviour lives in code, but the numbers designers tweak most (AP cost,
//! cooldowns, spell level, AI priority) can be overridden from a RON catalog
//! without recompiling.

use std::path::Path;

use game_core::AbilityRegistry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

/// Overrides for one ability. Absent fields leave the built-in value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    pub id: String,
    pub ap_cost: Option<u32>,
    pub cooldown_rounds: Option<u32>,
    pub active_rounds: Option<u32>,
    pub spell_level: Option<i32>,
    pub ai_priority: Option<i32>,
}

/// Tuning catalog structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuningCatalog {
    pub abilities: Vec<AbilityTuning>,
}

impl TuningCatalog {
    /// Applies every override. Unknown ids are an error so typos do not go unnoticed.
    pub fn apply(&self, registry: &mut AbilityRegistry) -> LoadResult<()> {
        for tuning in &self.abilities {
            let ability = registry
                .get_mut(&tuning.id)
                .ok_or_else(|| anyhow::anyhow!("Tuning references unknown ability '{}'", tuning.id))?;
            let definition = &mut ability.definition;
            if let Some(ap_cost) = tuning.ap_cost {
                definition.ap_cost = ap_cost;
            }
            if let Some(cooldown) = tuning.cooldown_rounds {
                definition.cooldown_rounds = cooldown;
            }
            if let Some(active) = tuning.active_rounds {
                definition.active_rounds = Some(active);
            }
            if let Some(level) = tuning.spell_level {
                definition.spell_level = level;
            }
            if let Some(priority) = tuning.ai_priority {
                definition.ai_priority = priority;
            }
            debug!(target: "game_content::loaders", ability = %tuning.id, "tuning applied");
        }
        Ok(())
    }
}

/// Loader for ability tuning from RON files.
pub struct TuningLoader;

impl TuningLoader {
    pub fn load(path: &Path) -> LoadResult<TuningCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<TuningCatalog> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse ability tuning RON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{builtin_abilities, ids};

    #[test]
    fn overrides_only_named_fields() {
        let catalog = TuningLoader::parse(
            r#"(abilities: [(id: "fireball", ap_cost: Some(5), ai_priority: Some(10))])"#,
        )
        .expect("parse");
        let mut registry = builtin_abilities();
        let before = registry.get(ids::FIREBALL).expect("fireball").definition.clone();

        catalog.apply(&mut registry).expect("apply");
        let after = &registry.get(ids::FIREBALL).expect("fireball").definition;
        assert_eq!(after.ap_cost, 5);
        assert_eq!(after.ai_priority, 10);
        assert_eq!(after.cooldown_rounds, before.cooldown_rounds);
        assert_eq!(after.spell_level, before.spell_level);
    }

    #[test]
    fn unknown_ability_is_rejected() {
        let catalog = TuningLoader::parse(r#"(abilities: [(id: "meteor_swarm")])"#).expect("parse");
        let err = catalog.apply(&mut builtin_abilities()).unwrap_err();
        assert!(err.to_string().contains("meteor_swarm"));
    }
}
