//! Attack and damage resolution with the effect hook pipeline.
//!
//! An attack flows through
//!
//! ```text
//! on_attack (attacker effects) -> on_defense (defender effects) -> d20 roll
//!   -> hit? on_attack_hit -> on_defense_hit -> mitigation -> on_damaged
//! ```
//!
//! Effects on a creature's equipped item hook in alongside the creature's own.
//! Each hook receives the mutable [`Attack`] or [`Damage`] accumulator.

use std::sync::Arc;

use tracing::{debug, info};

use crate::effect::CombatHook;
use crate::engine::GameEngine;
use crate::env::GameRng;
use crate::error::{ErrorSeverity, GameError};
use crate::events::GameEvent;
use crate::ledger::{Attribute, ConditionFlag, DamageType};
use crate::state::{EffectId, EntityId, Mark, MarkScope};

/// An attack roll in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attack {
    pub attacker: EntityId,
    pub defender: EntityId,
    pub attack_bonus: i32,
    pub armor_class: i32,
    /// Added by hooks on top of `attack_bonus`.
    pub extra_attack: i32,
    pub roll: i32,
    pub hit: bool,
}

impl Attack {
    pub fn total(&self) -> i32 {
        self.roll + self.attack_bonus + self.extra_attack
    }
}

/// Damage about to land, or that just landed (in `on_damaged`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Damage {
    pub source: Option<EntityId>,
    pub target: EntityId,
    pub damage_type: DamageType,
    pub amount: u32,
    /// Added by hooks; may be negative.
    pub extra_damage: i32,
}

impl Damage {
    pub fn new(source: Option<EntityId>, target: EntityId, damage_type: DamageType, amount: u32) -> Self {
        Self {
            source,
            target,
            damage_type,
            amount,
            extra_damage: 0,
        }
    }

    pub fn total(&self) -> u32 {
        (self.amount as i64 + i64::from(self.extra_damage)).max(0) as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackOutcome {
    pub attack: Attack,
    /// Hit points lost, `None` on a miss.
    pub damage_dealt: Option<u32>,
    pub killed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("creature {0} not found")]
    UnknownCreature(EntityId),

    #[error("attacker {0} is dead")]
    AttackerDead(EntityId),

    #[error("defender {0} is already dead")]
    DefenderDead(EntityId),

    #[error("attacker {0} cannot act")]
    Incapacitated(EntityId),

    #[error("not enough action points: need {needed}, have {available}")]
    InsufficientAp { needed: u32, available: u32 },

    #[error("defender {defender} is {distance} tiles away, weapon reaches {reach}")]
    OutOfRange {
        defender: EntityId,
        distance: u32,
        reach: u32,
    },
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownCreature(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCreature(_) => "COMBAT_UNKNOWN_CREATURE",
            Self::AttackerDead(_) => "COMBAT_ATTACKER_DEAD",
            Self::DefenderDead(_) => "COMBAT_DEFENDER_DEAD",
            Self::Incapacitated(_) => "COMBAT_INCAPACITATED",
            Self::InsufficientAp { .. } => "COMBAT_INSUFFICIENT_AP",
            Self::OutOfRange { .. } => "COMBAT_OUT_OF_RANGE",
        }
    }
}

type HookList = Vec<(EffectId, Arc<dyn CombatHook>)>;

impl GameEngine {
    /// Combat hooks of every effect on `creature` and on its equipped item.
    fn combat_hooks(&self, creature: EntityId) -> HookList {
        let Some(c) = self.state.creature(creature) else {
            return Vec::new();
        };
        let item = c
            .equipped
            .and_then(|item| self.state.item(item))
            .map(|item| item.effects.as_slice())
            .unwrap_or_default();
        c.effects
            .iter()
            .chain(item)
            .filter_map(|id| self.behavior_of(*id).combat.map(|hook| (*id, hook)))
            .collect()
    }

    /// A weapon attack costing the configured attack AP.
    pub fn basic_attack(&mut self, attacker: EntityId, defender: EntityId) -> Result<AttackOutcome, CombatError> {
        let cost = self.config.attack_ap_cost;
        let (weapon, from, ap) = {
            let a = self
                .state
                .creature(attacker)
                .ok_or(CombatError::UnknownCreature(attacker))?;
            (a.weapon, a.position, a.ap)
        };
        let to = self
            .state
            .creature(defender)
            .map(|d| d.position)
            .ok_or(CombatError::UnknownCreature(defender))?;
        let distance = from.distance(to);
        if distance > weapon.range {
            return Err(CombatError::OutOfRange {
                defender,
                distance,
                reach: weapon.range,
            });
        }
        if !ap.can_afford(cost) {
            return Err(CombatError::InsufficientAp {
                needed: cost,
                available: ap.current,
            });
        }
        self.check_combatants(attacker, defender)?;
        if let Some(a) = self.state.creature_mut(attacker) {
            a.ap.spend(cost);
        }
        let rolled = self.rng.roll_die(weapon.damage_die) + self.attribute(attacker, Attribute::Damage);
        self.resolve_attack(attacker, defender, rolled.max(0) as u32, weapon.damage_type)
    }

    fn check_combatants(&self, attacker: EntityId, defender: EntityId) -> Result<(), CombatError> {
        let a = self
            .state
            .creature(attacker)
            .ok_or(CombatError::UnknownCreature(attacker))?;
        let d = self
            .state
            .creature(defender)
            .ok_or(CombatError::UnknownCreature(defender))?;
        if a.dead {
            return Err(CombatError::AttackerDead(attacker));
        }
        if d.dead {
            return Err(CombatError::DefenderDead(defender));
        }
        if a.ledger.prevents_action() {
            return Err(CombatError::Incapacitated(attacker));
        }
        Ok(())
    }

    /// Runs an attack through the hook pipeline. No AP is charged here.
    ///
    /// A natural 20 always hits and a natural 1 always misses. Otherwise a
    /// helpless defender is hit automatically.
    pub fn resolve_attack(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
        base_damage: u32,
        damage_type: DamageType,
    ) -> Result<AttackOutcome, CombatError> {
        self.check_combatants(attacker, defender)?;
        let mut attack = Attack {
            attacker,
            defender,
            attack_bonus: self.attribute(attacker, Attribute::Attack),
            armor_class: self.config.base_armor_class + self.attribute(defender, Attribute::ArmorClass),
            extra_attack: 0,
            roll: 0,
            hit: false,
        };
        let attacker_hooks = self.combat_hooks(attacker);
        let defender_hooks = self.combat_hooks(defender);

        for (effect, hook) in &attacker_hooks {
            hook.on_attack(self, &mut attack, *effect);
        }
        for (effect, hook) in &defender_hooks {
            hook.on_defense(self, &mut attack, *effect);
        }

        attack.roll = self.rng.roll_d20();
        let helpless = self.has_condition(defender, ConditionFlag::Helpless);
        attack.hit = match attack.roll {
            20 => true,
            1 => false,
            _ => helpless || attack.total() >= attack.armor_class,
        };
        debug!(
            target: "game_core::combat",
            %attacker, %defender, roll = attack.roll, total = attack.total(), ac = attack.armor_class, hit = attack.hit,
            "attack rolled"
        );
        self.emit(GameEvent::AttackResolved {
            attacker,
            defender,
            roll: attack.roll,
            total: attack.total(),
            armor_class: attack.armor_class,
            hit: attack.hit,
        });
        if !attack.hit {
            return Ok(AttackOutcome {
                attack,
                damage_dealt: None,
                killed: false,
            });
        }

        let mut damage = Damage::new(Some(attacker), defender, damage_type, base_damage);
        for (effect, hook) in &attacker_hooks {
            hook.on_attack_hit(self, &attack, &mut damage, *effect);
        }
        for (effect, hook) in &defender_hooks {
            hook.on_defense_hit(self, &attack, &mut damage, *effect);
        }
        let dealt = self.apply_damage(damage);
        let killed = self.state.creature(defender).is_some_and(|d| d.dead);
        Ok(AttackOutcome {
            attack,
            damage_dealt: Some(dealt),
            killed,
        })
    }

    /// Applies damage after mitigation and returns the hit points lost.
    ///
    /// Dropping to zero kills the creature; it stays in the world.
    pub fn apply_damage(&mut self, damage: Damage) -> u32 {
        let max_hp = self.state.max_hp(damage.target);
        let Some(target) = self.state.creature_mut(damage.target) else {
            return 0;
        };
        if target.dead {
            return 0;
        }
        let dealt = target.ledger.damage().mitigate(damage.damage_type, damage.total());
        target.hp.current -= dealt.min(i32::MAX as u32) as i32;
        if target.hp.current.max(0) * 2 < max_hp {
            target.marks.set(Mark::Bloodied, MarkScope::Encounter);
        }
        let died = target.hp.current <= 0;
        if died {
            target.dead = true;
        }
        self.emit(GameEvent::DamageDealt {
            source: damage.source,
            target: damage.target,
            amount: dealt,
            damage_type: damage.damage_type,
        });

        let landed = Damage {
            amount: dealt,
            extra_damage: 0,
            ..damage
        };
        for (effect, hook) in self.combat_hooks(damage.target) {
            hook.on_damaged(self, &landed, effect);
        }

        if died {
            info!(target: "game_core::combat", creature = %damage.target, "creature died");
            self.emit(GameEvent::CreatureDied {
                creature: damage.target,
            });
            self.refresh_auras();
        }
        dealt
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::effect::{EffectBehavior, EffectTarget, EffectTemplate, EffectTemplateRegistry};
    use crate::engine::ContentRegistry;
    use crate::engine::testing::*;
    use crate::env::ScriptedRng;
    use crate::ledger::{DamageModifier, DamageModifierKind, StackingCategory};
    use crate::state::{Item, Position};

    /// +2 to hit and +3 fire damage on the attacker side.
    struct Flaming;

    impl CombatHook for Flaming {
        fn on_attack(&self, _engine: &mut GameEngine, attack: &mut Attack, _effect: EffectId) {
            attack.extra_attack += 2;
        }

        fn on_attack_hit(&self, _engine: &mut GameEngine, _attack: &Attack, damage: &mut Damage, _effect: EffectId) {
            damage.extra_damage += 3;
        }
    }

    /// Remembers every hit it took and burns the attacker back for 1.
    #[derive(Default)]
    struct Retaliate {
        seen: Mutex<Vec<u32>>,
    }

    impl CombatHook for Retaliate {
        fn on_damaged(&self, engine: &mut GameEngine, damage: &Damage, _effect: EffectId) {
            self.seen.lock().expect("lock").push(damage.amount);
            if let Some(source) = damage.source {
                engine.apply_damage(Damage::new(None, source, DamageType::Fire, 1));
            }
        }
    }

    fn content(retaliate: Arc<Retaliate>) -> ContentRegistry {
        let mut effects = EffectTemplateRegistry::new();
        effects.register(EffectTemplate::new(
            "flaming",
            "Flame Weapon",
            EffectBehavior::new().with_combat(Arc::new(Flaming)),
        ));
        effects.register(EffectTemplate::new(
            "shield",
            "Fire Shield",
            EffectBehavior::new().with_combat(retaliate),
        ));
        ContentRegistry::new(Default::default(), effects)
    }

    fn apply(engine: &mut GameEngine, target: EffectTarget, template: &str) -> EffectId {
        let id = engine.create_effect(target, None, Some(template)).expect("create");
        engine.apply_effect(id).expect("apply");
        id
    }

    #[test]
    fn natural_one_misses_and_twenty_hits() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0), monster(1, 1, 0)]);
        engine.rng = Box::new(ScriptedRng::new([1, 20]));
        let miss = engine
            .resolve_attack(EntityId(0), EntityId(1), 4, DamageType::Physical)
            .expect("attack");
        assert_eq!(miss.damage_dealt, None);
        let hit = engine
            .resolve_attack(EntityId(0), EntityId(1), 4, DamageType::Physical)
            .expect("attack");
        assert_eq!(hit.damage_dealt, Some(4));
        assert_eq!(engine.creature(EntityId(1)).expect("monster").hp.current, 16);
    }

    #[test]
    fn item_hooks_add_attack_and_damage() {
        let mut engine = engine_with(
            content(Arc::new(Retaliate::default())),
            vec![hero(0, 0, 0), monster(1, 1, 0)],
        );
        let sword = engine.state_mut().insert_item(Item::new(EntityId(50), "sword"));
        engine.state_mut().creature_mut(EntityId(0)).expect("hero").equipped = Some(sword);
        apply(&mut engine, EffectTarget::Item(sword), "flaming");

        // 8 + 2 reaches AC 10 only with the item's bonus.
        engine.rng = Box::new(ScriptedRng::new([8]));
        let outcome = engine
            .resolve_attack(EntityId(0), EntityId(1), 4, DamageType::Physical)
            .expect("attack");
        assert_eq!(outcome.attack.total(), 10);
        assert_eq!(outcome.damage_dealt, Some(7));
    }

    #[test]
    fn defender_on_damaged_sees_mitigated_amount() {
        let retaliate = Arc::new(Retaliate::default());
        let mut engine = engine_with(content(retaliate.clone()), vec![hero(0, 0, 0), monster(1, 1, 0)]);
        apply(&mut engine, EffectTarget::Creature(EntityId(1)), "shield");
        let resist = engine
            .create_effect(EffectTarget::Creature(EntityId(1)), None, None)
            .expect("create");
        engine
            .effect_mut(resist)
            .expect("pending")
            .add_damage_modifier(DamageModifier::new(DamageType::Physical, DamageModifierKind::Reduction(3)));
        engine.apply_effect(resist).expect("apply");

        engine.rng = Box::new(ScriptedRng::new([20]));
        let outcome = engine
            .resolve_attack(EntityId(0), EntityId(1), 10, DamageType::Physical)
            .expect("attack");
        assert_eq!(outcome.damage_dealt, Some(7));
        assert_eq!(*retaliate.seen.lock().expect("lock"), vec![7]);
        assert_eq!(engine.creature(EntityId(0)).expect("hero").hp.current, 19);
    }

    #[test]
    fn helpless_defender_is_hit_and_death_persists() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0), monster(1, 1, 0)]);
        let hold = engine
            .create_effect(EffectTarget::Creature(EntityId(1)), None, None)
            .expect("create");
        engine
            .effect_mut(hold)
            .expect("pending")
            .add_condition(ConditionFlag::Helpless)
            .add_penalty(Attribute::ArmorClass, StackingCategory::Circumstance, 4);
        engine.apply_effect(hold).expect("apply");

        engine.rng = Box::new(ScriptedRng::new([2]));
        let outcome = engine
            .resolve_attack(EntityId(0), EntityId(1), 25, DamageType::Physical)
            .expect("attack");
        assert!(outcome.attack.hit);
        assert!(outcome.killed);
        let corpse = engine.creature(EntityId(1)).expect("still in world");
        assert!(corpse.dead);
        assert_eq!(
            engine.resolve_attack(EntityId(0), EntityId(1), 1, DamageType::Physical),
            Err(CombatError::DefenderDead(EntityId(1)))
        );
    }

    #[test]
    fn basic_attack_checks_reach_and_ap() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0), monster(1, 3, 0)]);
        assert!(matches!(
            engine.basic_attack(EntityId(0), EntityId(1)),
            Err(CombatError::OutOfRange { distance: 3, .. })
        ));
        engine
            .move_creature(EntityId(1), Position::new(1, 0))
            .expect("move");
        engine.basic_attack(EntityId(0), EntityId(1)).expect("first");
        engine.basic_attack(EntityId(0), EntityId(1)).expect("second");
        assert!(matches!(
            engine.basic_attack(EntityId(0), EntityId(1)),
            Err(CombatError::InsufficientAp { .. })
        ));
    }

    #[test]
    fn bloodied_mark_set_below_half() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        engine.apply_damage(Damage::new(None, EntityId(0), DamageType::Fire, 9));
        assert!(!engine.creature(EntityId(0)).expect("hero").marks.has(&Mark::Bloodied));
        engine.apply_damage(Damage::new(None, EntityId(0), DamageType::Fire, 2));
        assert!(engine.creature(EntityId(0)).expect("hero").marks.has(&Mark::Bloodied));
    }
}
