//! Picking where an ability should land.

use game_core::{ActionType, EntityId, GameEngine, Position, SlotRef, TargeterShape};

use super::context::AiContext;

/// Where the planner intends to put an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aim {
    Caster,
    Creature(EntityId),
    Point(Position),
}

impl Aim {
    pub fn position(&self, engine: &GameEngine, caster: EntityId) -> Option<Position> {
        match self {
            Self::Caster => engine.creature(caster).map(|c| c.position),
            Self::Creature(id) => engine.creature(*id).map(|c| c.position),
            Self::Point(point) => Some(*point),
        }
    }
}

/// Best aim for `slot`, or `None` when nothing worth targeting is reachable.
///
/// Heals go to the lowest hit point fraction, everything else to the closest
/// valid creature. Buffs and debuffs skip targets already carrying this
/// slot's effect. Area shapes aim at the chosen creature's tile and must pass
/// the ability's own AI check.
pub fn choose_aim(engine: &GameEngine, ctx: &AiContext<'_>, slot: SlotRef) -> Option<Aim> {
    let definition = &engine.ability_for_slot(slot)?.definition;
    let origin = ctx.position(engine)?;
    if matches!(definition.targeting.shape, TargeterShape::SelfOnly) {
        return Some(Aim::Caster);
    }
    let band = definition.range.tiles();
    let skip_applied = matches!(definition.action_type, ActionType::Buff | ActionType::Debuff);
    let is_area = definition.targeting.shape.is_area();

    let mut options: Vec<(EntityId, Position, f32, u32)> = engine
        .potential_targets(slot)
        .into_iter()
        .filter(|id| !(skip_applied && engine.effect_created_by_slot(*id, slot).is_some()))
        .filter_map(|id| {
            let creature = engine.creature(id)?;
            let distance = creature.position.distance(origin);
            let reachable = distance <= band
                || ctx
                    .pathing
                    .path_cost(engine.state(), ctx.creature, origin, creature.position)
                    .is_some();
            reachable.then_some((id, creature.position, engine.state().hp_fraction(id), distance))
        })
        .filter(|(_, position, _, _)| !is_area || engine.ai_target_check(slot, *position))
        .collect();

    if definition.action_type == ActionType::Heal {
        options.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));
    } else {
        options.sort_by(|a, b| a.3.cmp(&b.3).then(a.0.cmp(&b.0)));
    }
    let (id, position, _, _) = options.first().copied()?;
    Some(if is_area { Aim::Point(position) } else { Aim::Creature(id) })
}
