//! Effect templates: hooks shared by every effect created from them.

use std::sync::Arc;

use game_core::{
    Attack, Attribute, AuraHandler, Bonus, CombatHook, Damage, DamageType, EffectBehavior, EffectId,
    EffectTemplate, EffectTemplateRegistry, EntityId, GameEngine, GameRng, Relationship, RoundTickHandler,
    SaveKind, StackingCategory,
};
use tracing::{debug, warn};

pub const HOLD: &str = "hold";
pub const POISON: &str = "poison";
pub const COURAGE: &str = "courage";
pub const FLAME_WEAPON: &str = "flame_weapon";
pub const FIRE_SHIELD: &str = "fire_shield";

/// The held creature fights back with a Will save every round and breaks
/// free on success.
struct HoldSave;

impl RoundTickHandler for HoldSave {
    fn on_round_elapsed(&self, engine: &mut GameEngine, effect: EffectId) {
        let Some((target, dc)) = engine.effect(effect).map(|e| (e.target.entity(), e.params.dc)) else {
            return;
        };
        if engine.resists(target, SaveKind::Will, dc) {
            debug!(target: "game_content::effects", %effect, creature = %target, "broke free");
            engine.remove_effect(effect);
        }
    }
}

/// Deals `params.magnitude` poison damage each round.
struct PoisonTick;

impl RoundTickHandler for PoisonTick {
    fn on_round_elapsed(&self, engine: &mut GameEngine, effect: EffectId) {
        let Some(e) = engine.effect(effect) else {
            return;
        };
        let damage = Damage::new(
            e.caster,
            e.target.entity(),
            e.params.damage_type.unwrap_or(DamageType::Poison),
            e.params.magnitude.max(0) as u32,
        );
        engine.apply_damage(damage);
    }
}

/// Allies gain morale to hit and to Will; enemies lose morale to hit.
struct CourageAura;

impl AuraHandler for CourageAura {
    fn on_target_enter(&self, engine: &mut GameEngine, aura: EffectId, target: EntityId, child: EffectId) {
        let Some(caster) = engine.effect(aura).map(|a| a.target.entity()) else {
            return;
        };
        let bonuses = match engine.relationship(caster, target) {
            Relationship::Friendly => vec![
                Bonus::bonus(Attribute::Attack, StackingCategory::Morale, 1),
                Bonus::bonus(Attribute::Will, StackingCategory::Morale, 2),
            ],
            Relationship::Hostile => vec![Bonus::penalty(Attribute::Attack, StackingCategory::Morale, 1)],
            Relationship::Neutral => Vec::new(),
        };
        for bonus in bonuses {
            if let Err(error) = engine.add_effect_bonus(child, bonus) {
                warn!(target: "game_content::effects", effect = %child, creature = %target, %error, "courage bonus not added");
            }
        }
    }
}

/// Adds a d6 of fire to every hit.
struct FlameWeapon;

impl CombatHook for FlameWeapon {
    fn on_attack_hit(&self, engine: &mut GameEngine, _attack: &Attack, damage: &mut Damage, _effect: EffectId) {
        damage.extra_damage += engine.rng().roll_die(6);
    }
}

/// Burns adjacent attackers for a d6 whenever the bearer takes damage.
struct FireShield;

impl CombatHook for FireShield {
    fn on_damaged(&self, engine: &mut GameEngine, damage: &Damage, _effect: EffectId) {
        let Some(attacker) = damage.source else {
            return;
        };
        let adjacent = match (engine.creature(attacker), engine.creature(damage.target)) {
            (Some(a), Some(d)) => a.position.distance(d.position) <= 1,
            _ => false,
        };
        if adjacent && damage.amount > 0 {
            let burn = engine.rng().roll_die(6).max(0) as u32;
            // Sourceless so two shields cannot bounce damage forever.
            engine.apply_damage(Damage::new(None, attacker, DamageType::Fire, burn));
        }
    }
}

pub fn builtin_templates() -> EffectTemplateRegistry {
    let mut registry = EffectTemplateRegistry::new();
    registry.register(EffectTemplate::new(
        HOLD,
        "Hold Person",
        EffectBehavior::new().with_round(Arc::new(HoldSave)),
    ));
    registry.register(EffectTemplate::new(
        POISON,
        "Poison",
        EffectBehavior::new().with_round(Arc::new(PoisonTick)),
    ));
    registry.register(EffectTemplate::new(
        COURAGE,
        "Aura of Courage",
        EffectBehavior::new().with_aura(Arc::new(CourageAura)),
    ));
    registry.register(EffectTemplate::new(
        FLAME_WEAPON,
        "Flame Weapon",
        EffectBehavior::new().with_combat(Arc::new(FlameWeapon)),
    ));
    registry.register(EffectTemplate::new(
        FIRE_SHIELD,
        "Fire Shield",
        EffectBehavior::new().with_combat(Arc::new(FireShield)),
    ));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_has_hooks() {
        let registry = builtin_templates();
        assert_eq!(registry.len(), 5);
        for id in [HOLD, POISON, COURAGE, FLAME_WEAPON, FIRE_SHIELD] {
            let template = registry.get(id).expect("registered");
            let behavior = &template.behavior;
            assert!(
                behavior.on_round.is_some() || behavior.aura.is_some() || behavior.combat.is_some(),
                "{id} has no hooks"
            );
        }
    }
}
