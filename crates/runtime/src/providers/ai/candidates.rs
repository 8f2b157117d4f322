//! Which of a creature's slots the planner considers at all.

use game_core::{ActionType, GameEngine, SlotRef};

use super::context::AiContext;
use super::targeting::Aim;

/// A slot queued for the ability phase.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub slot: SlotRef,
    pub priority: i32,
    /// Target fixed by a tactical override; `None` lets the planner choose.
    pub forced: Option<Aim>,
}

impl Candidate {
    pub fn new(slot: SlotRef, priority: i32) -> Self {
        Self {
            slot,
            priority,
            forced: None,
        }
    }

    pub fn forced(slot: SlotRef, aim: Aim) -> Self {
        Self {
            slot,
            priority: i32::MAX,
            forced: Some(aim),
        }
    }
}

/// Action types the planner casts on its own initiative.
fn is_planned(action: ActionType, healing_wanted: bool) -> bool {
    match action {
        ActionType::Buff | ActionType::Debuff | ActionType::Damage | ActionType::Summon => true,
        ActionType::Heal => healing_wanted,
        ActionType::Defensive | ActionType::Utility => false,
    }
}

/// Slots eligible by type, highest AI priority first. Ties keep slot order.
pub fn candidate_slots(engine: &GameEngine, ctx: &AiContext<'_>) -> Vec<Candidate> {
    let Some(creature) = engine.creature(ctx.creature) else {
        return Vec::new();
    };
    let healing_wanted = ctx.friend_needs_healing(engine);
    let mut candidates: Vec<Candidate> = (0..creature.slots.len())
        .map(|index| SlotRef::new(ctx.creature, index))
        .filter_map(|slot| {
            let definition = &engine.ability_for_slot(slot)?.definition;
            is_planned(definition.action_type, healing_wanted)
                .then(|| Candidate::new(slot, definition.ai_priority))
        })
        .collect();
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.slot.index.cmp(&b.slot.index)));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heals_only_when_wanted() {
        assert!(is_planned(ActionType::Damage, false));
        assert!(is_planned(ActionType::Summon, false));
        assert!(!is_planned(ActionType::Heal, false));
        assert!(is_planned(ActionType::Heal, true));
        assert!(!is_planned(ActionType::Utility, true));
        assert!(!is_planned(ActionType::Defensive, true));
    }
}
