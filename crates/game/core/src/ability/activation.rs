//! Slot activation, target selection and slot timers.

use std::sync::Arc;

use tracing::debug;

use super::{
    Ability, AbilityError, ActivationBlock, SelectionMode, Slot, SlotRef, SlotState, TargetSelection,
    Targeter, TargeterId, TargeterShape, TargetingError, TargetingSpec,
};
use crate::effect::EffectFlags;
use crate::engine::{ContentRegistry, GameEngine};
use crate::events::GameEvent;
use crate::scheduler::CallbackOwner;
use crate::ledger::ConditionFlag;
use crate::state::{EntityId, GameState, Position, Relationship};

/// Result of a successful activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    /// A targeter is open and waiting for a selection.
    Targeting(TargeterId),
    /// Self-targeted ability that resolved immediately.
    Resolved { targets: Vec<EntityId> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    Pending { selected: usize },
    Resolved { targets: Vec<EntityId> },
}

fn lookup<'a>(content: &'a ContentRegistry, state: &GameState, slot: SlotRef) -> Result<&'a Ability, AbilityError> {
    let creature = state
        .creature(slot.owner)
        .ok_or(AbilityError::UnknownCreature(slot.owner))?;
    let bound = creature
        .slots
        .get(slot.index)
        .ok_or(AbilityError::UnknownSlot(slot))?;
    content
        .abilities
        .get(&bound.ability)
        .ok_or_else(|| AbilityError::UnknownAbility(bound.ability.clone()))
}

fn within_reach(spec: &TargetingSpec, origin: Position, max_range: u32, position: Position) -> bool {
    let distance = origin.distance(position);
    match spec.shape {
        TargeterShape::List => distance >= spec.min_range && distance <= max_range,
        TargeterShape::SelfOnly => distance == 0,
        _ => distance <= max_range + spec.shape.extent(),
    }
}

impl GameEngine {
    pub fn ability_for_slot(&self, slot: SlotRef) -> Option<&Ability> {
        lookup(&self.content, &self.state, slot).ok()
    }

    pub fn slot(&self, slot: SlotRef) -> Option<&Slot> {
        self.state.creature(slot.owner)?.slots.get(slot.index)
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Option<&mut Slot> {
        self.state.creature_mut(slot.owner)?.slots.get_mut(slot.index)
    }

    /// Why `slot` cannot be activated, if anything stops it.
    pub fn activation_block(&self, slot: SlotRef) -> Result<(), AbilityError> {
        let ability = lookup(&self.content, &self.state, slot)?;
        let definition = &ability.definition;
        let creature = self
            .state
            .creature(slot.owner)
            .ok_or(AbilityError::UnknownCreature(slot.owner))?;
        let state = creature
            .slots
            .get(slot.index)
            .ok_or(AbilityError::UnknownSlot(slot))?;
        let blocked = |reason| -> Result<(), AbilityError> { Err(AbilityError::Blocked { slot, reason }) };

        if creature.dead {
            return blocked(ActivationBlock::Dead);
        }
        if creature.ledger.prevents_action() {
            return blocked(ActivationBlock::Incapacitated);
        }
        if definition.is_spell && creature.ledger.has(ConditionFlag::Silenced) {
            return blocked(ActivationBlock::Silenced);
        }
        match state.state {
            SlotState::Active => return blocked(ActivationBlock::AlreadyActive),
            SlotState::Targeting(_) | SlotState::Resolving => return blocked(ActivationBlock::Busy),
            SlotState::Inactive => {}
        }
        if state.cooldown_left > 0 {
            return blocked(ActivationBlock::OnCooldown(state.cooldown_left));
        }
        if !creature.ap.can_afford(definition.ap_cost) {
            return blocked(ActivationBlock::InsufficientAp {
                needed: definition.ap_cost,
                available: creature.ap.current,
            });
        }
        if definition
            .requires_weapon
            .is_some_and(|kind| kind != creature.weapon.kind)
        {
            return blocked(ActivationBlock::WrongWeapon);
        }
        if let Some(gate) = &ability.behavior.gate
            && !gate.can_activate(self, slot)
        {
            return blocked(ActivationBlock::ContentRefused);
        }
        Ok(())
    }

    /// Pure activation predicate over state, AP, weapon and the ability's own gate.
    pub fn can_activate(&self, slot: SlotRef) -> bool {
        self.activation_block(slot).is_ok()
    }

    /// Creatures the slot could ever target, ignoring range.
    pub fn potential_targets(&self, slot: SlotRef) -> Vec<EntityId> {
        match lookup(&self.content, &self.state, slot) {
            Ok(ability) if matches!(ability.definition.targeting.shape, TargeterShape::SelfOnly) => {
                vec![slot.owner]
            }
            Ok(ability) => self.eligible_targets(slot, ability, None),
            Err(_) => Vec::new(),
        }
    }

    /// Runs the ability's planner-side check for landing at `target`.
    pub fn ai_target_check(&self, slot: SlotRef, target: Position) -> bool {
        match lookup(&self.content, &self.state, slot) {
            Ok(ability) => ability
                .behavior
                .ai_check
                .as_ref()
                .is_none_or(|check| check.ai_check_target_valid(self, slot, target)),
            Err(_) => false,
        }
    }

    fn eligible_targets(&self, slot: SlotRef, ability: &Ability, reach: Option<(Position, u32)>) -> Vec<EntityId> {
        let spec = &ability.definition.targeting;
        self.state
            .creatures
            .values()
            .filter(|c| c.is_alive())
            .filter(|c| {
                let is_self = c.id == slot.owner;
                let relationship = self.state.relationship(slot.owner, c.id);
                if !spec.relationship.accepts(is_self, relationship) {
                    return false;
                }
                // Hidden creatures can only be picked by their friends.
                is_self || relationship == Relationship::Friendly || !c.ledger.has(ConditionFlag::Hidden)
            })
            .filter(|c| reach.is_none_or(|(origin, range)| within_reach(spec, origin, range, c.position)))
            .filter(|c| {
                ability
                    .behavior
                    .validator
                    .as_ref()
                    .is_none_or(|v| v.is_target_valid(self, slot, c.id))
            })
            .map(|c| c.id)
            .collect()
    }

    fn pay_activation(&mut self, slot: SlotRef, cost: u32) {
        if let Some(creature) = self.state.creature_mut(slot.owner) {
            creature.ap.spend(cost);
        }
    }

    /// Starts an activation.
    ///
    /// Fails without side effects when the slot is blocked or no creature is
    /// eligible. Otherwise the AP cost is paid, `on_activate` runs, and either a
    /// targeter opens or a self-only ability resolves on the spot.
    pub fn activate_slot(&mut self, slot: SlotRef) -> Result<Activation, AbilityError> {
        self.activation_block(slot)?;
        let content = Arc::clone(&self.content);
        let ability = lookup(&content, &self.state, slot)?;
        let definition = &ability.definition;
        let origin = self
            .state
            .creature(slot.owner)
            .map(|c| c.position)
            .ok_or(AbilityError::UnknownCreature(slot.owner))?;

        if matches!(definition.targeting.shape, TargeterShape::SelfOnly) {
            self.pay_activation(slot, definition.ap_cost);
            if let Some(state) = self.slot_mut(slot) {
                state.state = SlotState::Resolving;
            }
            self.emit(GameEvent::AbilityActivated {
                slot,
                ability: definition.id.clone(),
            });
            if let Some(handler) = &ability.behavior.on_activate {
                handler.on_activate(self, slot);
            }
            let targets = vec![slot.owner];
            self.resolve_selection(
                ability,
                TargetSelection {
                    targeter: None,
                    slot,
                    caster: slot.owner,
                    targets: targets.clone(),
                    point: None,
                },
            );
            return Ok(Activation::Resolved { targets });
        }

        let max_range = definition.range.tiles();
        let eligible = self.eligible_targets(slot, ability, Some((origin, max_range)));
        if eligible.is_empty() {
            debug!(target: "game_core::ability", %slot, ability = %definition.id, "no valid targets");
            return Err(AbilityError::NoValidTargets(slot));
        }

        self.pay_activation(slot, definition.ap_cost);
        let id = self.allocate_targeter_id();
        self.targeters.insert(
            id,
            Targeter {
                id,
                slot,
                caster: slot.owner,
                origin,
                spec: definition.targeting,
                max_range,
                eligible,
                selected: Vec::new(),
                point: None,
                ap_spent: definition.ap_cost,
            },
        );
        if let Some(state) = self.slot_mut(slot) {
            state.state = SlotState::Targeting(id);
        }
        debug!(target: "game_core::ability", %slot, ability = %definition.id, targeter = %id, "targeting");
        self.emit(GameEvent::AbilityActivated {
            slot,
            ability: definition.id.clone(),
        });
        if let Some(handler) = &ability.behavior.on_activate {
            handler.on_activate(self, slot);
        }
        Ok(Activation::Targeting(id))
    }

    pub fn targeter(&self, id: TargeterId) -> Option<&Targeter> {
        self.targeters.get(&id)
    }

    /// Picks a creature on a list targeter. Resolves once enough picks are in.
    pub fn select_target(&mut self, id: TargeterId, target: EntityId) -> Result<SelectOutcome, TargetingError> {
        let alive = self.state.creature(target).is_some_and(|c| c.is_alive());
        let targeter = self
            .targeters
            .get_mut(&id)
            .ok_or(TargetingError::UnknownTargeter(id))?;
        if !matches!(targeter.spec.shape, TargeterShape::List) {
            return Err(TargetingError::WrongShape);
        }
        if !alive || !targeter.is_eligible(target) {
            return Err(TargetingError::InvalidTarget(target));
        }
        if matches!(targeter.spec.mode, SelectionMode::UniqueRequired { .. })
            && targeter.selected.contains(&target)
        {
            return Err(TargetingError::AlreadySelected(target));
        }
        targeter.selected.push(target);
        if !targeter.is_complete() {
            return Ok(SelectOutcome::Pending {
                selected: targeter.selected.len(),
            });
        }
        let targets = self.finish_targeter(id, None)?;
        Ok(SelectOutcome::Resolved { targets })
    }

    /// Resolves a list targeter with the picks made so far.
    ///
    /// Multi-select accepts any non-empty selection; unique-required needs the full count.
    pub fn confirm_targeter(&mut self, id: TargeterId) -> Result<Vec<EntityId>, TargetingError> {
        let targeter = self
            .targeters
            .get(&id)
            .ok_or(TargetingError::UnknownTargeter(id))?;
        if !matches!(targeter.spec.shape, TargeterShape::List) {
            return Err(TargetingError::WrongShape);
        }
        let needed = match targeter.spec.mode {
            SelectionMode::UniqueRequired { .. } => targeter.required(),
            _ => 1,
        };
        if targeter.selected.len() < needed {
            return Err(TargetingError::SelectionIncomplete {
                needed,
                selected: targeter.selected.len(),
            });
        }
        self.finish_targeter(id, None)
    }

    /// Aims an area targeter at `point` and resolves against every eligible creature inside.
    ///
    /// An area that catches nobody is rejected and the targeter stays open.
    pub fn select_point(&mut self, id: TargeterId, point: Position) -> Result<Vec<EntityId>, TargetingError> {
        let targeter = self
            .targeters
            .get(&id)
            .ok_or(TargetingError::UnknownTargeter(id))?;
        if !targeter.spec.shape.is_area() {
            return Err(TargetingError::WrongShape);
        }
        if !targeter.accepts_point(point) {
            return Err(TargetingError::OutOfRange(point));
        }
        let caught: Vec<EntityId> = targeter
            .eligible
            .iter()
            .copied()
            .filter(|e| {
                self.state
                    .creature(*e)
                    .is_some_and(|c| c.is_alive() && targeter.covers(point, c.position))
            })
            .collect();
        if caught.is_empty() {
            return Err(TargetingError::NoTargetsInArea(point));
        }
        if let Some(targeter) = self.targeters.get_mut(&id) {
            targeter.selected = caught;
        }
        self.finish_targeter(id, Some(point))
    }

    /// Closes a targeter without resolving it. The activation's AP is refunded.
    pub fn cancel_targeter(&mut self, id: TargeterId) -> Result<(), TargetingError> {
        let targeter = self
            .targeters
            .remove(&id)
            .ok_or(TargetingError::UnknownTargeter(id))?;
        if let Some(creature) = self.state.creature_mut(targeter.caster) {
            creature.ap.refund(targeter.ap_spent);
        }
        self.discard_callbacks_of(CallbackOwner::Ability(targeter.slot));
        let ability = self
            .slot_mut(targeter.slot)
            .map(|s| {
                s.state = SlotState::Inactive;
                s.ability.clone()
            })
            .unwrap_or_default();
        debug!(target: "game_core::ability", slot = %targeter.slot, targeter = %id, "targeter cancelled");
        self.emit(GameEvent::TargeterCancelled {
            slot: targeter.slot,
            ability,
        });
        Ok(())
    }

    fn finish_targeter(&mut self, id: TargeterId, point: Option<Position>) -> Result<Vec<EntityId>, TargetingError> {
        let targeter = self
            .targeters
            .remove(&id)
            .ok_or(TargetingError::UnknownTargeter(id))?;
        let content = Arc::clone(&self.content);
        let targets = targeter.selected.clone();
        match lookup(&content, &self.state, targeter.slot) {
            Ok(ability) => self.resolve_selection(
                ability,
                TargetSelection {
                    targeter: Some(id),
                    slot: targeter.slot,
                    caster: targeter.caster,
                    targets: targets.clone(),
                    point,
                },
            ),
            Err(error) => {
                tracing::warn!(target: "game_core::ability", slot = %targeter.slot, %error, "targeter outlived its ability");
                if let Some(slot) = self.slot_mut(targeter.slot) {
                    slot.state = SlotState::Inactive;
                }
            }
        }
        Ok(targets)
    }

    /// Marks the slot, then hands the selection to the resolver exactly once.
    fn resolve_selection(&mut self, ability: &Ability, selection: TargetSelection) {
        let definition = &ability.definition;
        let slot = selection.slot;
        if let Some(state) = self.slot_mut(slot) {
            match definition.active_rounds {
                Some(rounds) => {
                    state.state = SlotState::Active;
                    state.active_rounds_left = rounds;
                }
                None => state.state = SlotState::Resolving,
            }
        }
        debug!(target: "game_core::ability", %slot, ability = %definition.id, targets = selection.targets.len(), "resolving");
        self.emit(GameEvent::AbilityResolved {
            slot,
            ability: definition.id.clone(),
            targets: selection.targets.clone(),
        });
        if let Some(resolver) = &ability.behavior.resolver {
            resolver.on_target_select(self, &selection);
        }
        if let Some(state) = self.slot_mut(slot) {
            if state.state == SlotState::Resolving {
                state.state = SlotState::Inactive;
            }
            state.cooldown_left = definition.cooldown_rounds;
        }
    }

    /// Counts cooldowns and active rounds down; expired active slots deactivate.
    pub(crate) fn tick_slots(&mut self) {
        let mut expired = Vec::new();
        for creature in self.state.creatures.values_mut() {
            for (index, slot) in creature.slots.iter_mut().enumerate() {
                slot.cooldown_left = slot.cooldown_left.saturating_sub(1);
                if slot.is_active() {
                    slot.active_rounds_left = slot.active_rounds_left.saturating_sub(1);
                    if slot.active_rounds_left == 0 {
                        expired.push(SlotRef::new(creature.id, index));
                    }
                }
            }
        }
        for slot in expired {
            if let Err(error) = self.deactivate_slot(slot) {
                tracing::warn!(target: "game_core::ability", %slot, %error, "could not deactivate expired slot");
            }
        }
    }

    /// Turns an active slot off, removing its remove-on-deactivate effects.
    pub fn deactivate_slot(&mut self, slot: SlotRef) -> Result<(), AbilityError> {
        let content = Arc::clone(&self.content);
        let ability = lookup(&content, &self.state, slot)?;
        let state = self.slot_mut(slot).ok_or(AbilityError::UnknownSlot(slot))?;
        if !state.is_active() {
            return Err(AbilityError::Blocked {
                slot,
                reason: ActivationBlock::NotActive,
            });
        }
        state.state = SlotState::Inactive;
        state.active_rounds_left = 0;

        if let Some(toggle) = &ability.behavior.toggle {
            toggle.on_deactivate(self, slot);
        }
        let doomed: Vec<_> = self
            .effects_created_by_slot(slot)
            .into_iter()
            .filter(|id| {
                self.effect(*id)
                    .is_some_and(|e| e.flags.contains(EffectFlags::REMOVE_ON_DEACTIVATE))
            })
            .collect();
        for effect in doomed {
            self.remove_effect(effect);
        }
        debug!(target: "game_core::ability", %slot, ability = %ability.definition.id, "slot deactivated");
        self.emit(GameEvent::SlotDeactivated {
            slot,
            ability: ability.definition.id.clone(),
        });
        Ok(())
    }

    /// Re-arms an already active slot: its active rounds start over.
    pub fn reactivate_slot(&mut self, slot: SlotRef) -> Result<(), AbilityError> {
        let content = Arc::clone(&self.content);
        let ability = lookup(&content, &self.state, slot)?;
        let state = self.slot_mut(slot).ok_or(AbilityError::UnknownSlot(slot))?;
        if !state.is_active() {
            return Err(AbilityError::Blocked {
                slot,
                reason: ActivationBlock::NotActive,
            });
        }
        state.active_rounds_left = ability.definition.active_rounds.unwrap_or(0);
        if let Some(toggle) = &ability.behavior.toggle {
            toggle.on_reactivate(self, slot);
        }
        Ok(())
    }
}
