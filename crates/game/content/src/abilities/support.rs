//! Healing, cleansing and summoning.

use std::sync::Arc;

use game_core::{
    Ability, AbilityBehavior, AbilityDefinition, ActionType, AiTag, ConditionFlag, Controller, Creature,
    GameEngine, Mark, MarkScope, RangeBand, RelationshipMask, SelectionMode, TargetResolver,
    TargetSelection, TargetingSpec, WeaponProfile,
};
use tracing::{debug, warn};

use super::common::{Dispel, EffectRecipe, HasCondition, HasDispellable, Heal, OncePerEncounter, Renewal, Wounded};
use super::ids;

pub fn cure_wounds() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::CURE_WOUNDS, "Cure Wounds", ActionType::Heal)
            .spell(1)
            .with_range(RangeBand::Touch)
            .with_targeting(TargetingSpec::list(RelationshipMask::ALLIES, SelectionMode::Single))
            .with_ai_priority(80),
        AbilityBehavior::new()
            .with_validator(Arc::new(Wounded))
            .with_resolver(Arc::new(Heal { roll: (2, 8) })),
    )
}

const BINDING: &[ConditionFlag] = &[ConditionFlag::Immobilized, ConditionFlag::Helpless];

pub fn freedom() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::FREEDOM, "Freedom of Movement", ActionType::Utility)
            .spell(4)
            .with_range(RangeBand::Touch)
            .with_targeting(TargetingSpec::list(RelationshipMask::ALLIES, SelectionMode::Single))
            .with_ai_tag(AiTag::Renewal)
            .with_ai_priority(75),
        AbilityBehavior::new()
            .with_validator(Arc::new(HasCondition(BINDING)))
            .with_resolver(Arc::new(Renewal {
                conditions: BINDING,
                then: EffectRecipe::new()
                    .rounds(3)
                    .condition(ConditionFlag::ImmobilizationImmunity)
                    .icon("freedom"),
            })),
    )
}

pub fn dispel_magic() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::DISPEL_MAGIC, "Dispel Magic", ActionType::Utility)
            .spell(3)
            .with_range(RangeBand::Short)
            .with_targeting(TargetingSpec::list(RelationshipMask::all(), SelectionMode::Single))
            .with_ai_tag(AiTag::Dispel)
            .with_ai_priority(70),
        AbilityBehavior::new()
            .with_validator(Arc::new(HasDispellable))
            .with_resolver(Arc::new(Dispel)),
    )
}

/// Calls a wolf to the first free tile next to the summoner.
struct SummonWolf;

impl SummonWolf {
    const HIT_POINTS: i32 = 13;
}

impl TargetResolver for SummonWolf {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        let Some((faction, position, encounter)) = engine
            .creature(selection.caster)
            .map(|c| (c.faction, c.position, c.encounter))
        else {
            return;
        };
        let Some(tile) = position
            .neighbors()
            .find(|tile| engine.state().occupant(*tile).is_none())
        else {
            warn!(target: "game_content::abilities", caster = %selection.caster, "no room to summon");
            return;
        };

        let id = engine.state_mut().allocate_id();
        let mut wolf = Creature::new(id, "Wolf", faction, tile, Self::HIT_POINTS)
            .with_controller(Controller::Ai)
            .with_weapon(WeaponProfile::melee(6));
        wolf.encounter = encounter;
        wolf.marks.set(Mark::SummonedBy(selection.caster), MarkScope::Encounter);
        let wolf = engine.spawn_creature(wolf);

        if let Some(caster) = engine.state_mut().creature_mut(selection.caster) {
            caster
                .marks
                .set(Mark::AbilityUsed(ids::SUMMON_WOLF.to_string()), MarkScope::Encounter);
        }
        debug!(target: "game_content::abilities", caster = %selection.caster, %wolf, %tile, "wolf summoned");
    }
}

pub fn summon_wolf() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::SUMMON_WOLF, "Summon Wolf", ActionType::Summon)
            .with_ap_cost(4)
            .spell(1)
            .with_ai_priority(55),
        AbilityBehavior::new()
            .with_gate(Arc::new(OncePerEncounter))
            .with_resolver(Arc::new(SummonWolf)),
    )
}
