//! The built-in ability catalog.
//!
//! Each ability is a static [`AbilityDefinition`](game_core::AbilityDefinition)
//! plus the behaviour hooks it needs. Most are assembled from the reusable
//! pieces in [`common`]; the few with bespoke resolution keep their resolver
//! next to the definition.

mod buffs;
pub mod common;
mod offense;
mod support;

use std::sync::Arc;

use game_core::{AbilityRegistry, ContentRegistry};

pub use buffs::{battle_focus, bless, courage_aura, fire_shield, flame_weapon, shield_of_faith, total_defense};
pub use offense::{cone_of_cold, fireball, hold_person, lightning_bolt, venom_strike};
pub use support::{cure_wounds, dispel_magic, freedom, summon_wolf};

/// Stable ability ids, used in slots, tuning files and marks.
pub mod ids {
    pub const BLESS: &str = "bless";
    pub const BATTLE_FOCUS: &str = "battle_focus";
    pub const SHIELD_OF_FAITH: &str = "shield_of_faith";
    pub const TOTAL_DEFENSE: &str = "total_defense";
    pub const COURAGE_AURA: &str = "courage_aura";
    pub const FLAME_WEAPON: &str = "flame_weapon";
    pub const FIRE_SHIELD: &str = "fire_shield";
    pub const HOLD_PERSON: &str = "hold_person";
    pub const FIREBALL: &str = "fireball";
    pub const CONE_OF_COLD: &str = "cone_of_cold";
    pub const LIGHTNING_BOLT: &str = "lightning_bolt";
    pub const VENOM_STRIKE: &str = "venom_strike";
    pub const CURE_WOUNDS: &str = "cure_wounds";
    pub const FREEDOM: &str = "freedom";
    pub const DISPEL_MAGIC: &str = "dispel_magic";
    pub const SUMMON_WOLF: &str = "summon_wolf";
}

pub fn builtin_abilities() -> AbilityRegistry {
    let mut registry = AbilityRegistry::new();
    for ability in [
        bless(),
        battle_focus(),
        shield_of_faith(),
        total_defense(),
        courage_aura(),
        flame_weapon(),
        fire_shield(),
        hold_person(),
        fireball(),
        cone_of_cold(),
        lightning_bolt(),
        venom_strike(),
        cure_wounds(),
        freedom(),
        dispel_magic(),
        summon_wolf(),
    ] {
        registry.register(ability);
    }
    registry
}

/// Abilities and effect templates bundled for a [`GameEngine`](game_core::GameEngine).
pub fn builtin_content() -> Arc<ContentRegistry> {
    Arc::new(ContentRegistry::new(builtin_abilities(), crate::effects::builtin_templates()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_registers_every_id_once() {
        let registry = builtin_abilities();
        assert_eq!(registry.len(), 16);
        for ability in registry.iter() {
            assert_eq!(registry.get(&ability.definition.id).map(|a| a.id()), Some(ability.id()));
        }
    }

    #[test]
    fn templates_referenced_by_abilities_exist() {
        let content = builtin_content();
        for id in [crate::effects::HOLD, crate::effects::POISON, crate::effects::COURAGE] {
            assert!(content.effects.get(id).is_some(), "{id} missing");
        }
    }
}
