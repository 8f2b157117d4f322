//! Built-in abilities driven through a real engine.

use std::collections::VecDeque;

use game_content::abilities::common::EffectRecipe;
use game_content::{builtin_content, ids};
use game_core::{
    AbilityError, Activation, ActivationBlock, Attribute, ConditionFlag, Creature, EffectTarget, EntityId,
    FactionId, GameConfig, GameEngine, GameRng, GameState, Mark, Position, Relationship, SelectOutcome, SlotRef,
};

const HEROES: FactionId = FactionId(1);
const MONSTERS: FactionId = FactionId(2);

/// Replays fixed rolls; an exhausted script rolls the minimum.
struct Rolls(VecDeque<i32>);

impl GameRng for Rolls {
    fn range(&mut self, min: i32, max: i32) -> i32 {
        self.0.pop_front().unwrap_or(min).clamp(min, max.max(min))
    }

    fn shuffle_indices(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

fn hero(id: u32, x: i32, y: i32) -> Creature {
    Creature::new(EntityId(id), format!("hero{id}"), HEROES, Position::new(x, y), 20)
}

fn monster(id: u32, x: i32, y: i32) -> Creature {
    Creature::new(EntityId(id), format!("monster{id}"), MONSTERS, Position::new(x, y), 20)
}

fn engine(creatures: Vec<Creature>, rolls: &[i32]) -> GameEngine {
    let mut state = GameState::new();
    state.factions.set(HEROES, MONSTERS, Relationship::Hostile);
    for creature in creatures {
        state.insert_creature(creature);
    }
    GameEngine::new(
        state,
        builtin_content(),
        GameConfig::default(),
        Box::new(Rolls(rolls.iter().copied().collect())),
    )
}

fn caster_with(abilities: &[&str]) -> Creature {
    let mut caster = hero(0, 0, 0);
    for id in abilities {
        caster.add_slot(*id);
    }
    caster
}

fn slot(index: usize) -> SlotRef {
    SlotRef::new(EntityId(0), index)
}

fn hp(engine: &GameEngine, id: u32) -> i32 {
    engine.creature(EntityId(id)).expect("creature").hp.current
}

#[test]
fn bless_lands_on_allies_inside_the_circle() {
    let mut engine = engine(
        vec![caster_with(&[ids::BLESS]), hero(1, 1, 0), monster(2, 2, 0)],
        &[],
    );
    let Ok(Activation::Targeting(targeter)) = engine.activate_slot(slot(0)) else {
        panic!("bless should open a targeter");
    };
    let targets = engine.select_point(targeter, Position::new(1, 0)).expect("point");

    assert_eq!(targets, vec![EntityId(0), EntityId(1)]);
    assert_eq!(engine.attribute(EntityId(0), Attribute::Attack), 1);
    assert_eq!(engine.attribute(EntityId(1), Attribute::Will), 1);
    assert_eq!(engine.attribute(EntityId(2), Attribute::Attack), 0);
}

#[test]
fn hold_person_breaks_on_a_later_save() {
    // Initial Will save fails on a 1, the first round's save passes on a 20.
    let mut engine = engine(vec![caster_with(&[ids::HOLD_PERSON]), monster(1, 2, 0)], &[1, 20]);
    let Ok(Activation::Targeting(targeter)) = engine.activate_slot(slot(0)) else {
        panic!("hold person should open a targeter");
    };
    let outcome = engine.select_target(targeter, EntityId(1)).expect("select");
    assert!(matches!(outcome, SelectOutcome::Resolved { .. }));
    assert!(engine.has_condition(EntityId(1), ConditionFlag::Helpless));
    assert!(engine.has_condition(EntityId(1), ConditionFlag::Immobilized));

    engine.advance_round();
    assert!(!engine.has_condition(EntityId(1), ConditionFlag::Helpless));
    assert!(engine.effects_on(EntityId(1)).is_empty());
}

#[test]
fn fireball_damage_waits_for_the_projectile() {
    let mut engine = engine(
        vec![caster_with(&[ids::FIREBALL]), monster(1, 6, 0), monster(2, 6, 1)],
        &[],
    );
    let Ok(Activation::Targeting(targeter)) = engine.activate_slot(slot(0)) else {
        panic!("fireball should open a targeter");
    };
    engine.select_point(targeter, Position::new(6, 0)).expect("point");
    assert_eq!(hp(&engine, 1), 20);
    assert_eq!(engine.scheduler().pending(), 1);
    assert!(!engine.accepts_input());

    let delay = engine.projectile_delay(Position::new(0, 0), Position::new(6, 0));
    assert_eq!(engine.advance_clock(delay), 1);
    // Five dice rolling their minimum, the Reflex save rolling a 1.
    assert_eq!(hp(&engine, 1), 15);
    assert_eq!(hp(&engine, 2), 15);
    assert!(engine.accepts_input());
}

#[test]
fn venom_strike_poisons_on_a_hit() {
    // Weapon die 3, attack roll 15, Fortitude save 1.
    let mut engine = engine(vec![caster_with(&[ids::VENOM_STRIKE]), monster(1, 1, 0)], &[3, 15, 1]);
    let Ok(Activation::Targeting(targeter)) = engine.activate_slot(slot(0)) else {
        panic!("venom strike should open a targeter");
    };
    engine.select_target(targeter, EntityId(1)).expect("select");
    assert_eq!(hp(&engine, 1), 17);

    engine.advance_round();
    assert_eq!(hp(&engine, 1), 15);
}

#[test]
fn courage_aura_splits_allies_and_enemies() {
    let mut engine = engine(
        vec![caster_with(&[ids::COURAGE_AURA]), hero(1, 3, 0), monster(2, 4, 0), monster(3, 9, 0)],
        &[],
    );
    let Ok(Activation::Resolved { .. }) = engine.activate_slot(slot(0)) else {
        panic!("aura resolves on the caster");
    };

    assert_eq!(engine.attribute(EntityId(1), Attribute::Attack), 1);
    assert_eq!(engine.attribute(EntityId(1), Attribute::Will), 2);
    assert_eq!(engine.attribute(EntityId(2), Attribute::Attack), -1);
    assert_eq!(engine.attribute(EntityId(3), Attribute::Attack), 0);

    engine.move_creature(EntityId(2), Position::new(8, 0)).expect("move");
    assert_eq!(engine.attribute(EntityId(2), Attribute::Attack), 0);
}

#[test]
fn freedom_clears_binding_and_grants_immunity() {
    let mut engine = engine(vec![caster_with(&[ids::FREEDOM]), hero(1, 1, 0)], &[]);
    EffectRecipe::new()
        .rounds(5)
        .condition(ConditionFlag::Immobilized)
        .apply(&mut engine, EffectTarget::Creature(EntityId(1)), None)
        .expect("bind");
    assert!(engine.has_condition(EntityId(1), ConditionFlag::Immobilized));

    let Ok(Activation::Targeting(targeter)) = engine.activate_slot(slot(0)) else {
        panic!("freedom should open a targeter");
    };
    engine.select_target(targeter, EntityId(1)).expect("select");
    assert!(!engine.has_condition(EntityId(1), ConditionFlag::Immobilized));
    assert!(engine.has_condition(EntityId(1), ConditionFlag::ImmobilizationImmunity));

    // Rebinding while immune does not take hold.
    let _ = EffectRecipe::new()
        .rounds(5)
        .condition(ConditionFlag::Immobilized)
        .apply(&mut engine, EffectTarget::Creature(EntityId(1)), None);
    assert!(!engine.has_condition(EntityId(1), ConditionFlag::Immobilized));
}

#[test]
fn freedom_needs_a_bound_target() {
    let mut engine = engine(vec![caster_with(&[ids::FREEDOM]), hero(1, 1, 0)], &[]);
    assert!(matches!(
        engine.activate_slot(slot(0)),
        Err(AbilityError::NoValidTargets(_))
    ));
}

#[test]
fn summon_wolf_once_per_encounter() {
    let mut engine = engine(vec![caster_with(&[ids::SUMMON_WOLF])], &[]);
    engine.begin_turn(EntityId(0));
    engine.activate_slot(slot(0)).expect("summon");

    let wolf = engine
        .state()
        .creatures
        .values()
        .find(|c| c.marks.has(&Mark::SummonedBy(EntityId(0))))
        .expect("wolf");
    assert_eq!(wolf.faction, HEROES);
    assert_eq!(wolf.position.distance(Position::new(0, 0)), 1);

    engine.begin_turn(EntityId(0));
    assert!(matches!(
        engine.activate_slot(slot(0)),
        Err(AbilityError::Blocked {
            reason: ActivationBlock::ContentRefused,
            ..
        })
    ));
}

#[test]
fn cure_wounds_skips_healthy_allies() {
    let mut wounded = hero(1, 1, 0);
    wounded.hp.current = 5;
    let mut engine = engine(vec![caster_with(&[ids::CURE_WOUNDS]), wounded, hero(2, 0, 1)], &[]);
    let Ok(Activation::Targeting(targeter)) = engine.activate_slot(slot(0)) else {
        panic!("cure wounds should open a targeter");
    };
    let eligible = &engine.targeter(targeter).expect("targeter").eligible;
    assert_eq!(eligible, &vec![EntityId(1)]);

    engine.select_target(targeter, EntityId(1)).expect("select");
    // Two minimum dice, caster spell level zero.
    assert_eq!(hp(&engine, 1), 7);
}
