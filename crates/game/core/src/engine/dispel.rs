//! Dispel resolution.
//!
//! A dispel makes independent attempts against up to `max_attempts` of the
//! target's dispellable effects, visited in a freshly shuffled order. Each
//! attempt rolls
//!
//! ```text
//! roll = d(-4..=4) + (2 * dispeller_level + dispeller_attribute)
//!                  - (2 * effect_level + effect_attribute)
//! ```
//!
//! and removes the effect when `roll > 0`. In the level-difference form
//! `(2 * target_level + target_attr) - (2 * caster_level + caster_attr)`, the
//! "target" side is the dispeller and the "caster" side is whoever cast the
//! effect being stripped.

use tracing::debug;

use super::GameEngine;
use crate::env::GameRng;
use crate::events::GameEvent;
use crate::state::{EffectId, EntityId};

/// Die bounds for the dispel roll.
const DISPEL_DIE: (i32, i32) = (-4, 4);

/// The two sides of a dispel attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispelCheck {
    pub dispeller_level: i32,
    pub dispeller_attribute: i32,
    pub effect_level: i32,
    pub effect_attribute: i32,
}

impl DispelCheck {
    /// Total for a given die result.
    pub fn roll(&self, die: i32) -> i32 {
        die + (2 * self.dispeller_level + self.dispeller_attribute)
            - (2 * self.effect_level + self.effect_attribute)
    }

    pub fn succeeds(roll: i32) -> bool {
        roll > 0
    }

    /// Exact probability of success over the uniform die.
    pub fn success_chance(&self) -> f32 {
        let (lo, hi) = DISPEL_DIE;
        let wins = (lo..=hi).filter(|d| Self::succeeds(self.roll(*d))).count();
        wins as f32 / (hi - lo + 1) as f32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispelReport {
    /// `(effect, roll, success)` per attempt, in attempt order.
    pub attempts: Vec<(EffectId, i32, bool)>,
    pub removed: Vec<EffectId>,
}

impl DispelReport {
    pub fn any_removed(&self) -> bool {
        !self.removed.is_empty()
    }
}

impl GameEngine {
    /// Attempts to dispel effects on `target` on behalf of `dispeller`.
    ///
    /// `max_attempts` caps how many effects are tried this casting.
    pub fn dispel(&mut self, dispeller: EntityId, target: EntityId, max_attempts: u32) -> DispelReport {
        let mut report = DispelReport::default();
        let Some(caster) = self.state.creature(dispeller).map(|c| c.caster) else {
            return report;
        };
        let candidates = self.dispellable_effects(target);
        let order = self.rng.shuffle_indices(candidates.len());

        for index in order.into_iter().take(max_attempts as usize) {
            let Some(&effect_id) = candidates.get(index) else {
                continue;
            };
            // An earlier success may have removed this one as someone's child.
            let Some(effect) = self.effects.get(&effect_id).filter(|e| e.is_applied()) else {
                continue;
            };
            let check = DispelCheck {
                dispeller_level: caster.spell_level,
                dispeller_attribute: caster.attribute,
                effect_level: effect.spell_level,
                effect_attribute: effect.caster_attribute,
            };
            let (lo, hi) = DISPEL_DIE;
            let die = self.rng.range(lo, hi);
            let roll = check.roll(die);
            let success = DispelCheck::succeeds(roll);
            debug!(target: "game_core::dispel", effect = %effect_id, roll, success, "dispel attempt");
            self.emit(GameEvent::DispelAttempted {
                effect: effect_id,
                roll,
                success,
            });
            report.attempts.push((effect_id, roll, success));
            if success && self.remove_effect(effect_id) {
                report.removed.push(effect_id);
            }
        }
        report
    }
}
