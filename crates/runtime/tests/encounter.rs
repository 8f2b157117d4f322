//! Full rounds through the runtime: hooks, turn order and encounter lifecycle.

use game_content::ids;
use game_core::{
    Controller, Creature, EncounterId, EntityId, FactionId, GameEvent, GameState, Position, Relationship,
    SeededRng,
};
use runtime::{Runtime, RuntimeConfig};

const HEROES: FactionId = FactionId(1);
const MONSTERS: FactionId = FactionId(2);

fn state(creatures: Vec<Creature>) -> GameState {
    let mut state = GameState::new();
    state.factions.set(HEROES, MONSTERS, Relationship::Hostile);
    for creature in creatures {
        state.insert_creature(creature);
    }
    state
}

fn player(id: u32, x: i32, y: i32, hp: i32) -> Creature {
    Creature::new(EntityId(id), "player", HEROES, Position::new(x, y), hp)
        .with_controller(Controller::Player)
        .with_initiative(10)
}

fn goblin(id: u32, x: i32, y: i32) -> Creature {
    Creature::new(EntityId(id), format!("goblin{id}"), MONSTERS, Position::new(x, y), 8)
        .with_encounter(EncounterId(1))
}

fn runtime(creatures: Vec<Creature>) -> Runtime {
    Runtime::builder()
        .config(RuntimeConfig {
            max_rounds: 40,
            ..RuntimeConfig::default()
        })
        .initial_state(state(creatures))
        .rng(Box::new(SeededRng::new(7)))
        .build()
}

#[test]
fn encounter_wakes_once_a_hostile_comes_into_view() {
    let mut runtime = runtime(vec![player(0, 20, 0, 30), goblin(1, 0, 0)]);

    let quiet = runtime.run_round().expect("round");
    assert!(quiet.turns.iter().all(|t| t.idle));
    assert!(!quiet.events.iter().any(|e| matches!(e, GameEvent::EncounterAlerted { .. })));

    runtime
        .engine_mut()
        .move_creature(EntityId(0), Position::new(4, 0))
        .expect("move");
    let loud = runtime.run_round().expect("round");

    assert!(loud
        .events
        .iter()
        .any(|e| *e == GameEvent::EncounterAlerted { encounter: EncounterId(1) }));
    let goblin = loud.turns.iter().find(|t| t.creature == EntityId(1)).expect("goblin turn");
    assert!(!goblin.idle);
    assert!(goblin.steps > 0);
}

#[test]
fn turns_follow_initiative_then_id() {
    let runtime = runtime(vec![
        goblin(2, 5, 0),
        player(0, 0, 0, 30),
        goblin(1, 5, 1).with_initiative(12),
    ]);
    assert_eq!(runtime.turn_order(), vec![EntityId(1), EntityId(0), EntityId(2)]);
}

#[test]
fn fight_runs_until_one_side_is_down() {
    let mut runtime = runtime(vec![player(0, 0, 0, 10), goblin(1, 1, 0), goblin(2, 0, 1)]);
    let rounds = runtime.run().expect("run");

    assert!(!rounds.is_empty());
    assert!(!runtime.hostilities_remain());
    assert!(runtime.engine().creature(EntityId(0)).is_some_and(|c| c.dead));

    let last = rounds.last().expect("last round");
    assert!(last
        .events
        .iter()
        .any(|e| *e == GameEvent::EncounterEnded { encounter: EncounterId(1) }));
    assert!(runtime.engine().state().encounter(EncounterId(1)).is_some_and(|e| !e.alerted));
}

#[test]
fn summoned_wolf_joins_from_the_next_round() {
    let mut shaman = goblin(1, 0, 0);
    shaman.add_slot(ids::SUMMON_WOLF);
    let mut runtime = runtime(vec![player(0, 3, 0, 30), shaman]);

    let first = runtime.run_round().expect("round");
    let shaman_turn = first.turns.iter().find(|t| t.creature == EntityId(1)).expect("shaman turn");
    assert_eq!(shaman_turn.abilities, vec![ids::SUMMON_WOLF.to_string()]);
    assert!(!first.turns.iter().any(|t| t.creature == EntityId(2)));

    let second = runtime.run_round().expect("round");
    assert!(second.turns.iter().any(|t| t.creature == EntityId(2)));
    let shaman_turn = second.turns.iter().find(|t| t.creature == EntityId(1)).expect("shaman turn");
    assert!(shaman_turn.abilities.is_empty());
}

#[test]
fn round_tick_advances_the_engine_clock() {
    let mut runtime = runtime(vec![player(0, 0, 0, 30)]);
    let summary = runtime.run_round().expect("round");

    assert_eq!(summary.round, 0);
    assert_eq!(runtime.engine().round(), 1);
    assert!(summary.events.iter().any(|e| matches!(e, GameEvent::RoundAdvanced { round: 1 })));
}
