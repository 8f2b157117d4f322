//! AI turns planned against the built-in content.

use game_content::abilities::common::EffectRecipe;
use game_content::{builtin_content, ids};
use game_core::{
    Attribute, ConditionFlag, Creature, EffectTarget, EncounterId, EntityId, FactionId, GameConfig, GameEngine,
    GameRng, GameState, GridPathing, PathingOracle, Position, Relationship,
};
use runtime::TurnPlanner;

const HEROES: FactionId = FactionId(1);
const MONSTERS: FactionId = FactionId(2);

/// Every roll comes up as the same face, clamped into range.
struct Fixed(i32);

impl GameRng for Fixed {
    fn range(&mut self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max.max(min))
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

fn with_slots(mut creature: Creature, abilities: &[&str]) -> Creature {
    for id in abilities {
        creature.add_slot(*id);
    }
    creature
}

fn engine(creatures: Vec<Creature>, face: i32) -> GameEngine {
    engine_with_config(creatures, face, GameConfig::default())
}

fn engine_with_config(creatures: Vec<Creature>, face: i32, config: GameConfig) -> GameEngine {
    let mut state = GameState::new();
    state.factions.set(HEROES, MONSTERS, Relationship::Hostile);
    for creature in creatures {
        state.insert_creature(creature);
    }
    GameEngine::new(state, builtin_content(), config, Box::new(Fixed(face)))
}

/// Claims every goal is reachable but only ever shuffles the mover between
/// two neighbouring columns.
struct Oscillating;

impl PathingOracle for Oscillating {
    fn next_step(&self, _state: &GameState, _mover: EntityId, from: Position, _goal: Position) -> Option<Position> {
        let dx = if from.x.rem_euclid(2) == 0 { 1 } else { -1 };
        Some(Position::new(from.x + dx, from.y))
    }

    fn path_cost(&self, _state: &GameState, _mover: EntityId, from: Position, goal: Position) -> Option<u32> {
        Some(from.distance(goal))
    }

    fn provoked_reactions(&self, _state: &GameState, _mover: EntityId, _from: Position, _goal: Position) -> u32 {
        0
    }
}

fn plan(engine: &mut GameEngine, id: u32) -> runtime::TurnReport {
    TurnPlanner::new()
        .plan_turn(engine, EntityId(id), &GridPathing::new())
        .expect("turn")
}

fn hp(engine: &GameEngine, id: u32) -> i32 {
    engine.creature(EntityId(id)).expect("creature").hp.current
}

#[test]
fn dormant_encounter_sits_the_turn_out() {
    let mut engine = engine(
        vec![hero(0, 20, 0), monster(1, 0, 0).with_encounter(EncounterId(1))],
        20,
    );
    let report = plan(&mut engine, 1);

    assert!(report.idle);
    assert_eq!(engine.creature(EntityId(1)).map(|c| c.position), Some(Position::ORIGIN));
}

#[test]
fn no_abilities_means_basic_attacks_until_ap_runs_out() {
    let mut engine = engine(vec![hero(0, 1, 0), monster(1, 0, 0)], 20);
    let report = plan(&mut engine, 1);

    // 6 AP at 3 per swing, every swing a natural 20 for a full d4.
    assert!(report.fell_back);
    assert!(report.abilities.is_empty());
    assert_eq!(report.attacks, 2);
    assert_eq!(hp(&engine, 0), 12);
}

#[test]
fn basic_attack_goes_for_the_weakest_hostile() {
    let mut weak = hero(2, 0, 3);
    weak.hp.current = 5;
    let mut engine = engine(vec![hero(0, 3, 0), monster(1, 0, 0), weak], 20);
    let report = plan(&mut engine, 1);

    assert_eq!(report.steps, 2);
    assert_eq!(report.attacks, 1);
    assert_eq!(hp(&engine, 2), 1);
    assert_eq!(hp(&engine, 0), 20);
}

#[test]
fn wounded_friend_gets_healed_first() {
    let mut ally = hero(1, 1, 0);
    ally.hp.current = 5;
    let mut engine = engine(
        vec![with_slots(hero(0, 0, 0), &[ids::CURE_WOUNDS]), ally, monster(2, 7, 0)],
        20,
    );
    let report = plan(&mut engine, 0);

    assert_eq!(report.abilities, vec![ids::CURE_WOUNDS.to_string()]);
    assert_eq!(hp(&engine, 1), 20);
}

#[test]
fn healthy_party_skips_heals() {
    let mut engine = engine(
        vec![with_slots(hero(0, 0, 0), &[ids::CURE_WOUNDS]), hero(1, 1, 0), monster(2, 1, 1)],
        20,
    );
    let report = plan(&mut engine, 0);

    assert!(report.abilities.is_empty());
    assert!(report.fell_back);
    assert_eq!(report.attacks, 2);
}

#[test]
fn surrounded_creature_falls_back_on_total_defense() {
    let caster = with_slots(monster(3, 0, 0), &[ids::FIREBALL, ids::TOTAL_DEFENSE]);
    let mut engine = engine(vec![hero(0, 1, 0), hero(1, 0, 1), hero(2, -1, 0), caster], 20);
    let report = plan(&mut engine, 3);

    assert_eq!(report.abilities.first().map(String::as_str), Some(ids::TOTAL_DEFENSE));
    assert_eq!(engine.attribute(EntityId(3), Attribute::ArmorClass), 4);
}

#[test]
fn immobilized_caster_gives_up_on_distant_targets() {
    let caster = with_slots(monster(1, 0, 0), &[ids::HOLD_PERSON]);
    let mut engine = engine(vec![hero(0, 5, 0), caster], 20);
    EffectRecipe::new()
        .rounds(3)
        .condition(ConditionFlag::Immobilized)
        .apply(&mut engine, EffectTarget::Creature(EntityId(1)), None)
        .expect("immobilize");

    let report = plan(&mut engine, 1);

    assert!(report.abilities.is_empty());
    assert_eq!((report.steps, report.attacks), (0, 0));
    assert_eq!(engine.creature(EntityId(1)).map(|c| c.ap.current), Some(6));
    assert!(!engine.has_condition(EntityId(0), ConditionFlag::Helpless));
}

#[test]
fn self_buff_already_running_is_not_recast() {
    let mut engine = engine(
        vec![with_slots(hero(0, 0, 0), &[ids::FIRE_SHIELD]), monster(1, 1, 0)],
        20,
    );
    let first = plan(&mut engine, 0);
    assert_eq!(first.abilities, vec![ids::FIRE_SHIELD.to_string()]);

    engine.begin_turn(EntityId(0));
    let second = plan(&mut engine, 0);
    assert!(second.abilities.is_empty());
    assert_eq!(second.attacks, 2);
}

#[test]
fn non_converging_pathing_still_ends_the_turn() {
    let slots = [ids::VENOM_STRIKE, ids::HOLD_PERSON];
    let config = GameConfig {
        action_points: 10_000,
        ..GameConfig::default()
    };
    let guard = config.movement_loop_guard;
    let mut engine = engine_with_config(vec![hero(0, 0, 6), with_slots(monster(1, 0, 0), &slots)], 20, config);

    let report = TurnPlanner::new()
        .plan_turn(&mut engine, EntityId(1), &Oscillating)
        .expect("turn");

    assert!(report.steps > 0);
    assert!(report.steps <= guard * (slots.len() as u32 + 1));
    assert_eq!(report.attacks, 0);
    let position = engine.creature(EntityId(1)).expect("monster").position;
    assert_eq!(position.y, 0);
    assert!((0..=1).contains(&position.x));
}
