//! Radius-bound effects that manage one child effect per creature in range.
//!
//! An aura is an ordinary effect applied to its caster with an [`AuraState`]
//! attached. Membership is recomputed after every round tick, every creature
//! movement, spawn and death. The propagator diffs the creatures currently in
//! range against its bookkeeping:
//!
//! - newly inside: a pending child is created, handed to the template's
//!   `on_target_enter` to populate, then applied
//! - newly outside: `on_target_exit` runs, then the child is removed
//!
//! Removing the aura exits every remaining member, so no child outlives it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::ability::SlotRef;
use crate::effect::{EffectError, EffectFlags, EffectTarget};
use crate::engine::GameEngine;
use crate::events::GameEvent;
use crate::state::{EffectId, EntityId};

/// Upper bound on back-to-back refresh passes triggered from inside aura hooks.
const MAX_REFRESH_PASSES: usize = 4;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraState {
    pub max_radius: u32,
    members: BTreeMap<EntityId, EffectId>,
}

impl AuraState {
    pub fn new(max_radius: u32) -> Self {
        Self {
            max_radius,
            members: BTreeMap::new(),
        }
    }

    /// The child effect this aura keeps on `target`.
    pub fn child_for(&self, target: EntityId) -> Option<EffectId> {
        self.members.get(&target).copied()
    }

    pub fn members(&self) -> impl Iterator<Item = (EntityId, EffectId)> + '_ {
        self.members.iter().map(|(t, c)| (*t, *c))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn forget_child(&mut self, child: EffectId) {
        self.members.retain(|_, c| *c != child);
    }
}

impl GameEngine {
    /// Creates a pending aura on `caster` using `template`'s aura handler.
    pub fn create_aura(
        &mut self,
        caster: EntityId,
        source_slot: Option<SlotRef>,
        template: &str,
        max_radius: u32,
    ) -> Result<EffectId, EffectError> {
        let id = self.create_effect(EffectTarget::Creature(caster), source_slot, Some(template))?;
        if let Some(effect) = self.effects.get_mut(&id) {
            effect.aura = Some(AuraState::new(max_radius));
        }
        Ok(id)
    }

    /// Recomputes membership of every applied aura.
    ///
    /// Calls made while a refresh is already running (an aura hook moving a
    /// creature, say) are folded into another pass of the outer refresh.
    pub fn refresh_auras(&mut self) {
        if self.aura_pass_active {
            self.aura_pass_requested = true;
            return;
        }
        self.aura_pass_active = true;
        for _ in 0..MAX_REFRESH_PASSES {
            self.aura_pass_requested = false;
            let auras: Vec<EffectId> = self
                .effects
                .values()
                .filter(|e| e.is_applied() && e.is_aura())
                .map(|e| e.id)
                .collect();
            for aura in auras {
                self.refresh_aura(aura);
            }
            if !self.aura_pass_requested {
                break;
            }
        }
        if self.aura_pass_requested {
            warn!(target: "game_core::aura", "aura refresh did not settle");
            self.aura_pass_requested = false;
        }
        self.aura_pass_active = false;
    }

    fn refresh_aura(&mut self, aura: EffectId) {
        let Some(effect) = self.effects.get(&aura).filter(|e| e.is_applied()) else {
            return;
        };
        let Some(state) = effect.aura.as_ref() else {
            return;
        };
        let source = effect.target.entity();
        let radius = state.max_radius;
        let current = state.members.clone();

        let desired: BTreeSet<EntityId> = match self.state.creature(source) {
            Some(caster) if caster.is_alive() => self
                .state
                .creatures_within(caster.position, radius)
                .map(|c| c.id)
                .collect(),
            _ => BTreeSet::new(),
        };

        let exits: Vec<(EntityId, EffectId)> = current
            .iter()
            .filter(|(target, child)| !desired.contains(target) || !self.is_effect_applied(**child))
            .map(|(t, c)| (*t, *c))
            .collect();
        let enters: Vec<EntityId> = desired
            .iter()
            .copied()
            .filter(|t| {
                current
                    .get(t)
                    .is_none_or(|child| !self.is_effect_applied(*child))
            })
            .collect();

        let handler = self.behavior_of(aura).aura;

        for (target, child) in exits {
            if let Some(state) = self.aura_state_mut(aura) {
                state.members.remove(&target);
            }
            if let Some(handler) = &handler {
                handler.on_target_exit(self, aura, target, child);
            }
            self.remove_effect(child);
            debug!(target: "game_core::aura", %aura, creature = %target, "left aura");
            self.emit(GameEvent::AuraExited { aura, target, child });
        }

        for target in enters {
            if !self.is_effect_applied(aura) {
                break;
            }
            let child = match self.create_child_effect(aura, target) {
                Ok(child) => child,
                Err(error) => {
                    warn!(target: "game_core::aura", %aura, creature = %target, %error, "could not create aura child");
                    continue;
                }
            };
            if let Some(effect) = self.effects.get_mut(&child) {
                effect.flags |= EffectFlags::UNDISPELLABLE;
            }
            if let Some(state) = self.aura_state_mut(aura) {
                state.members.insert(target, child);
            }
            if let Some(handler) = &handler {
                handler.on_target_enter(self, aura, target, child);
            }
            if let Err(error) = self.apply_effect(child) {
                warn!(target: "game_core::aura", %aura, creature = %target, %error, "aura child not applied");
                if let Some(state) = self.aura_state_mut(aura) {
                    state.forget_child(child);
                }
                self.remove_effect(child);
                continue;
            }
            debug!(target: "game_core::aura", %aura, creature = %target, "entered aura");
            self.emit(GameEvent::AuraEntered { aura, target, child });
        }
    }

    /// Exits every member. Runs while the aura itself is being removed.
    pub(crate) fn dissolve_aura(&mut self, aura: EffectId) {
        let members = match self.aura_state_mut(aura) {
            Some(state) => std::mem::take(&mut state.members),
            None => return,
        };
        let handler = self.behavior_of(aura).aura;
        for (target, child) in members {
            if let Some(handler) = &handler {
                handler.on_target_exit(self, aura, target, child);
            }
            self.remove_effect(child);
            self.emit(GameEvent::AuraExited { aura, target, child });
        }
    }

    fn aura_state_mut(&mut self, aura: EffectId) -> Option<&mut AuraState> {
        self.effects.get_mut(&aura).and_then(|e| e.aura.as_mut())
    }
}
