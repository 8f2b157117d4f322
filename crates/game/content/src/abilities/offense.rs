//! Damage and debuffs aimed at enemies.

use std::sync::Arc;

use game_core::{
    Ability, AbilityBehavior, AbilityDefinition, ActionType, Attribute, ConditionFlag, DamageType,
    EffectFlags, EffectTarget, GameEngine, GameRng, RangeBand, RelationshipMask, SaveKind, SelectionMode,
    TargetResolver, TargetSelection, TargeterShape, TargetingSpec, WeaponKind,
};
use tracing::warn;

use super::common::{ApplyRecipe, AreaDamage, AvoidFriendlyFire, EffectRecipe, LacksCondition};
use super::ids;
use crate::effects;

pub fn hold_person() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::HOLD_PERSON, "Hold Person", ActionType::Debuff)
            .spell(2)
            .with_range(RangeBand::Short)
            .with_targeting(TargetingSpec::list(RelationshipMask::HOSTILE, SelectionMode::Single))
            .with_ai_priority(60),
        AbilityBehavior::new()
            .with_validator(Arc::new(LacksCondition(&[ConditionFlag::Helpless])))
            .with_resolver(Arc::new(
                ApplyRecipe::new(
                    EffectRecipe::new()
                        .template(effects::HOLD)
                        .rounds(5)
                        .condition(ConditionFlag::Helpless)
                        .condition(ConditionFlag::Immobilized)
                        .flags(EffectFlags::HARMFUL)
                        .icon("hold"),
                )
                .with_save(SaveKind::Will),
            )),
    )
}

pub fn fireball() -> Ability {
    let radius = 2;
    Ability::new(
        AbilityDefinition::new(ids::FIREBALL, "Fireball", ActionType::Damage)
            .with_ap_cost(4)
            .with_cooldown(2)
            .spell(3)
            .with_range(RangeBand::Long)
            .with_targeting(TargetingSpec::area(
                TargeterShape::Circle { radius },
                RelationshipMask::OTHERS,
            ))
            .with_ai_priority(70),
        AbilityBehavior::new()
            .with_ai_check(Arc::new(AvoidFriendlyFire { radius }))
            .with_resolver(Arc::new(AreaDamage {
                roll: (5, 6),
                damage_type: DamageType::Fire,
                save: Some(SaveKind::Reflex),
                projectile: true,
            })),
    )
}

pub fn cone_of_cold() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::CONE_OF_COLD, "Cone of Cold", ActionType::Damage)
            .with_ap_cost(4)
            .with_cooldown(3)
            .spell(5)
            .with_range(RangeBand::Short)
            .with_targeting(TargetingSpec::area(
                TargeterShape::Cone {
                    length: 4,
                    half_angle_deg: 45.0,
                },
                RelationshipMask::HOSTILE,
            ))
            .with_ai_priority(65),
        AbilityBehavior::new().with_resolver(Arc::new(AreaDamage {
            roll: (6, 6),
            damage_type: DamageType::Cold,
            save: Some(SaveKind::Reflex),
            projectile: false,
        })),
    )
}

pub fn lightning_bolt() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::LIGHTNING_BOLT, "Lightning Bolt", ActionType::Damage)
            .with_ap_cost(4)
            .with_cooldown(2)
            .spell(3)
            .with_range(RangeBand::Short)
            .with_targeting(TargetingSpec::area(
                TargeterShape::Line { length: 6 },
                RelationshipMask::HOSTILE,
            ))
            .with_ai_priority(60),
        AbilityBehavior::new().with_resolver(Arc::new(AreaDamage {
            roll: (5, 6),
            damage_type: DamageType::Electricity,
            save: Some(SaveKind::Reflex),
            projectile: false,
        })),
    )
}

/// A weapon attack that poisons on a hit the victim fails to shrug off.
struct VenomStrike {
    poison: EffectRecipe,
}

impl TargetResolver for VenomStrike {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        let Some(weapon) = engine.creature(selection.caster).map(|c| c.weapon) else {
            return;
        };
        for &target in &selection.targets {
            let rolled = engine.rng().roll_die(weapon.damage_die)
                + engine.attribute(selection.caster, Attribute::Damage);
            let base = rolled.max(0) as u32;
            let outcome = match engine.resolve_attack(selection.caster, target, base, weapon.damage_type) {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(target: "game_content::abilities", creature = %target, %error, "venom strike failed");
                    continue;
                }
            };
            if !outcome.attack.hit || outcome.killed {
                continue;
            }
            if !engine.affects_target(selection.slot, target, Some(SaveKind::Fortitude)) {
                continue;
            }
            if let Err(error) = self
                .poison
                .apply(engine, EffectTarget::Creature(target), Some(selection.slot))
            {
                warn!(target: "game_content::abilities", creature = %target, %error, "poison not applied");
            }
        }
    }
}

pub fn venom_strike() -> Ability {
    Ability::new(
        AbilityDefinition::new(ids::VENOM_STRIKE, "Venom Strike", ActionType::Damage)
            .with_cooldown(2)
            .with_range(RangeBand::Touch)
            .with_weapon(WeaponKind::Melee)
            .with_targeting(TargetingSpec::list(RelationshipMask::HOSTILE, SelectionMode::Single))
            .with_ai_priority(45),
        AbilityBehavior::new().with_resolver(Arc::new(VenomStrike {
            poison: EffectRecipe::new()
                .template(effects::POISON)
                .rounds(3)
                .magnitude(2, DamageType::Poison)
                .flags(EffectFlags::HARMFUL),
        })),
    )
}
