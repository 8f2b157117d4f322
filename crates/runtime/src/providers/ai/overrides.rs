//! Tactical overrides: situational rules that jump the ability queue.

use game_core::{AiTag, EntityId, GameEngine, Relationship, SlotRef};

use super::candidates::Candidate;
use super::context::AiContext;
use super::targeting::Aim;

/// A rule that may force one ability, with its target, to the front of the turn.
pub trait TacticalOverride: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, engine: &GameEngine, ctx: &AiContext<'_>) -> Option<Candidate>;
}

/// First activatable slot carrying `tag`.
fn tagged_slot(engine: &GameEngine, creature: EntityId, tag: AiTag) -> Option<SlotRef> {
    let slots = engine.creature(creature)?.slots.len();
    (0..slots)
        .map(|index| SlotRef::new(creature, index))
        .find(|slot| {
            engine
                .ability_for_slot(*slot)
                .is_some_and(|a| a.definition.has_tag(tag))
                && engine.can_activate(*slot)
        })
}

/// Falls back on total defense when more hostiles are adjacent than the threshold allows.
pub struct TotalDefenseWhenSurrounded;

impl TacticalOverride for TotalDefenseWhenSurrounded {
    fn name(&self) -> &'static str {
        "total_defense_when_surrounded"
    }

    fn evaluate(&self, engine: &GameEngine, ctx: &AiContext<'_>) -> Option<Candidate> {
        if ctx.adjacent_hostiles(engine) <= engine.config().surrounded_threshold {
            return None;
        }
        let slot = tagged_slot(engine, ctx.creature, AiTag::TotalDefense)?;
        Some(Candidate::forced(slot, Aim::Caster))
    }
}

/// Uses a support ability (dispel, renewal) on the closest friend that needs it.
pub struct SupportOverride {
    pub tag: AiTag,
}

impl TacticalOverride for SupportOverride {
    fn name(&self) -> &'static str {
        match self.tag {
            AiTag::Dispel => "dispel_friend",
            AiTag::Renewal => "renew_friend",
            AiTag::TotalDefense => "support",
        }
    }

    fn evaluate(&self, engine: &GameEngine, ctx: &AiContext<'_>) -> Option<Candidate> {
        let slot = tagged_slot(engine, ctx.creature, self.tag)?;
        let origin = ctx.position(engine)?;
        let friend = engine
            .potential_targets(slot)
            .into_iter()
            .filter(|id| *id == ctx.creature || engine.relationship(ctx.creature, *id) == Relationship::Friendly)
            .filter_map(|id| engine.creature(id).map(|c| (c.position.distance(origin), id)))
            .min()?;
        Some(Candidate::forced(slot, Aim::Creature(friend.1)))
    }
}

/// The override battery, evaluated in this order.
pub fn default_overrides() -> Vec<Box<dyn TacticalOverride>> {
    vec![
        Box::new(TotalDefenseWhenSurrounded),
        Box::new(SupportOverride { tag: AiTag::Dispel }),
        Box::new(SupportOverride { tag: AiTag::Renewal }),
    ]
}
