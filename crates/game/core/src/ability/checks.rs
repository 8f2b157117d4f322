//! Per-target probabilistic gates: spell failure and saving throws.
//!
//! Both are rolled once per target per cast. A failed gate only stops that
//! target's effect; the activation's AP stays spent.

use tracing::debug;

use super::SlotRef;
use crate::engine::GameEngine;
use crate::env::GameRng;
use crate::events::GameEvent;
use crate::ledger::Attribute;
use crate::state::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SaveKind {
    Fortitude,
    Reflex,
    Will,
}

impl SaveKind {
    pub const fn attribute(self) -> Attribute {
        match self {
            Self::Fortitude => Attribute::Fortitude,
            Self::Reflex => Attribute::Reflex,
            Self::Will => Attribute::Will,
        }
    }
}

impl GameEngine {
    /// `10 + spell level + casting attribute + spell power` for the slot's ability.
    pub fn save_dc(&self, slot: SlotRef) -> i32 {
        let spell_level = self
            .ability_for_slot(slot)
            .map_or(0, |a| a.definition.spell_level);
        let attribute = self
            .creature(slot.owner)
            .map_or(0, |c| c.caster.attribute);
        10 + spell_level + attribute + self.attribute(slot.owner, Attribute::SpellPower)
    }

    /// Rolls d100 against the caster's spell failure chance.
    pub fn spell_fails(&mut self, caster: EntityId, target: EntityId) -> bool {
        let chance = self.attribute(caster, Attribute::SpellFailure);
        if chance <= 0 {
            return false;
        }
        let roll = self.rng.roll_d100();
        let failed = roll <= chance;
        if failed {
            debug!(target: "game_core::checks", %caster, %target, roll, chance, "spell failed");
            self.emit(GameEvent::SpellFailed { caster, target });
        }
        failed
    }

    /// Rolls `d20 + save` for `target`; the save succeeds at or above `dc`.
    pub fn resists(&mut self, target: EntityId, save: SaveKind, dc: i32) -> bool {
        let roll = self.rng.roll_d20() + self.attribute(target, save.attribute());
        let resisted = roll >= dc;
        if resisted {
            debug!(target: "game_core::checks", entity = %target, ?save, roll, dc, "resisted");
            self.emit(GameEvent::Resisted { target, roll, dc });
        }
        resisted
    }

    /// Whether a cast from `slot` lands on `target`: spells may fail, and a
    /// save, when given, is rolled against the slot's DC.
    pub fn affects_target(&mut self, slot: SlotRef, target: EntityId, save: Option<SaveKind>) -> bool {
        let is_spell = self
            .ability_for_slot(slot)
            .is_some_and(|a| a.definition.is_spell);
        if is_spell && self.spell_fails(slot.owner, target) {
            return false;
        }
        match save {
            Some(kind) => {
                let dc = self.save_dc(slot);
                !self.resists(target, kind, dc)
            }
            None => true,
        }
    }
}
