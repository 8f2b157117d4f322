//! Self and ally enhancements.

use std::sync::Arc;

use game_core::{
    Ability, AbilityBehavior, AbilityDefinition, ActionType, AiTag, Attribute, DamageModifier,
    DamageModifierKind, DamageType, Duration, EffectFlags, GameEngine, RangeBand, RelationshipMask,
    SelectionMode, StackingCategory, TargetResolver, TargetSelection, TargeterShape, TargetingSpec,
};
use tracing::warn;

use super::common::{ApplyRecipe, EffectRecipe};
use super::ids;
use crate::effects;

pub fn bless() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::BLESS, "Bless", ActionType::Buff)
            .spell(1)
            .with_range(RangeBand::Short)
            .with_targeting(TargetingSpec::area(
                TargeterShape::Circle { radius: 2 },
                RelationshipMask::ALLIES,
            ))
            .with_ai_priority(30),
        AbilityBehavior::new().with_resolver(Arc::new(ApplyRecipe::new(
            EffectRecipe::new()
                .rounds(5)
                .bonus(Attribute::Attack, StackingCategory::Morale, 1)
                .bonus(Attribute::Will, StackingCategory::Morale, 1)
                .icon("bless"),
        ))),
    )
}

pub fn battle_focus() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::BATTLE_FOCUS, "Battle Focus", ActionType::Buff)
            .with_ap_cost(2)
            .with_cooldown(3)
            .with_active_rounds(3)
            .with_ai_priority(40),
        AbilityBehavior::new().with_resolver(Arc::new(ApplyRecipe::new(
            EffectRecipe::new()
                .bonus(Attribute::Attack, StackingCategory::Competence, 2)
                .bonus(Attribute::Damage, StackingCategory::Competence, 2)
                .flags(EffectFlags::REMOVE_ON_DEACTIVATE),
        ))),
    )
}

pub fn shield_of_faith() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::SHIELD_OF_FAITH, "Shield of Faith", ActionType::Buff)
            .with_ap_cost(2)
            .spell(1)
            .with_range(RangeBand::Touch)
            .with_targeting(TargetingSpec::list(RelationshipMask::ALLIES, SelectionMode::Single))
            .with_ai_priority(20),
        AbilityBehavior::new().with_resolver(Arc::new(ApplyRecipe::new(
            EffectRecipe::new()
                .rounds(10)
                .bonus(Attribute::ArmorClass, StackingCategory::Deflection, 2)
                .icon("shield_of_faith"),
        ))),
    )
}

pub fn total_defense() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::TOTAL_DEFENSE, "Total Defense", ActionType::Defensive)
            .with_active_rounds(1)
            .with_ai_tag(AiTag::TotalDefense),
        AbilityBehavior::new().with_resolver(Arc::new(ApplyRecipe::new(
            EffectRecipe::new()
                .rounds(1)
                .bonus(Attribute::ArmorClass, StackingCategory::Circumstance, 4)
                .flags(EffectFlags::REMOVE_ON_DEACTIVATE),
        ))),
    )
}

/// Raises the caster's courage aura for as long as the slot stays active.
struct RaiseAura {
    template: &'static str,
    radius: u32,
    rounds: u32,
}

impl TargetResolver for RaiseAura {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        let aura = match engine.create_aura(selection.caster, Some(selection.slot), self.template, self.radius) {
            Ok(aura) => aura,
            Err(error) => {
                warn!(target: "game_content::abilities", slot = %selection.slot, %error, "aura not created");
                return;
            }
        };
        if let Some(effect) = engine.effect_mut(aura) {
            effect
                .set_duration(Duration::Rounds(self.rounds))
                .set_flags(EffectFlags::REMOVE_ON_DEACTIVATE);
        }
        if let Err(error) = engine.apply_effect(aura) {
            warn!(target: "game_content::abilities", slot = %selection.slot, %error, "aura not applied");
        }
    }
}

pub fn courage_aura() -> Ability {
    let rounds = 10;
    Ability::new(
        AbilityDefinition::new(ids::COURAGE_AURA, "Aura of Courage", ActionType::Buff)
            .spell(2)
            .with_active_rounds(rounds)
            .with_ai_priority(50),
        AbilityBehavior::new().with_resolver(Arc::new(RaiseAura {
            template: effects::COURAGE,
            radius: 4,
            rounds,
        })),
    )
}

pub fn flame_weapon() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::FLAME_WEAPON, "Flame Weapon", ActionType::Buff)
            .with_ap_cost(2)
            .spell(2)
            .with_ai_priority(35),
        AbilityBehavior::new().with_resolver(Arc::new(
            ApplyRecipe::new(EffectRecipe::new().template(effects::FLAME_WEAPON).rounds(5)).on_item(),
        )),
    )
}

pub fn fire_shield() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::FIRE_SHIELD, "Fire Shield", ActionType::Buff)
            .spell(4)
            .with_ai_priority(25),
        AbilityBehavior::new().with_resolver(Arc::new(ApplyRecipe::new(
            EffectRecipe::new()
                .template(effects::FIRE_SHIELD)
                .rounds(5)
                .modifier(DamageModifier::new(DamageType::Cold, DamageModifierKind::Resistance(50))),
        ))),
    )
}
