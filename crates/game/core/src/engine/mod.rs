//! The authoritative owner of world state and the rules that mutate it.
//!
//! [`GameEngine`] bundles the world, the content registry (ability and effect
//! templates), the injected RNG, the delayed callback scheduler and the event
//! journal. Subsystems add their operations as inherent methods from their
//! own modules:
//!
//! - effect lifecycle and dispel: [`effects`](self) / `dispel`
//! - aura propagation: [`crate::aura`]
//! - ability slots and targeters: [`crate::ability`]
//! - attack and damage pipeline: [`crate::combat`]
//! - delayed callbacks: [`crate::scheduler`]
//!
//! Content hooks receive `&mut GameEngine`. Before invoking one, the engine
//! clones the hook's `Arc` out of the registry so the hook is free to call
//! back into any engine operation, including removing the effect it belongs to.
mod dispel;
mod effects;

pub use dispel::{DispelCheck, DispelReport};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::ability::{AbilityRegistry, Targeter, TargeterId};
use crate::config::GameConfig;
use crate::effect::{Effect, EffectTemplateRegistry};
use crate::env::{GameRng, MoveError, PathingOracle};
use crate::events::GameEvent;
use crate::ledger::{Attribute, ConditionFlag};
use crate::scheduler::Scheduler;
use crate::state::{
    Creature, EffectId, EncounterId, EntityId, GameState, MarkScope, Position, Relationship,
};

/// Ability and effect templates available to an engine.
#[derive(Clone, Debug, Default)]
pub struct ContentRegistry {
    pub abilities: AbilityRegistry,
    pub effects: EffectTemplateRegistry,
}

impl ContentRegistry {
    pub fn new(abilities: AbilityRegistry, effects: EffectTemplateRegistry) -> Self {
        Self { abilities, effects }
    }
}

pub struct GameEngine {
    pub(crate) state: GameState,
    pub(crate) content: Arc<ContentRegistry>,
    pub(crate) config: GameConfig,
    pub(crate) rng: Box<dyn GameRng>,
    pub(crate) effects: BTreeMap<EffectId, Effect>,
    next_effect: u32,
    next_apply_seq: u64,
    pub(crate) targeters: BTreeMap<TargeterId, Targeter>,
    next_targeter: u32,
    pub(crate) scheduler: Scheduler,
    pub(crate) aura_pass_active: bool,
    pub(crate) aura_pass_requested: bool,
    events: Vec<GameEvent>,
    round: u32,
}

impl GameEngine {
    pub fn new(
        state: GameState,
        content: Arc<ContentRegistry>,
        config: GameConfig,
        rng: Box<dyn GameRng>,
    ) -> Self {
        Self {
            state,
            content,
            config,
            rng,
            effects: BTreeMap::new(),
            next_effect: 1,
            next_apply_seq: 0,
            targeters: BTreeMap::new(),
            next_targeter: 1,
            scheduler: Scheduler::new(),
            aura_pass_active: false,
            aura_pass_requested: false,
            events: Vec::new(),
            round: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for scenario setup.
    ///
    /// Bypasses effect bookkeeping: do not edit effect lists or ledgers through it.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn rng(&mut self) -> &mut dyn GameRng {
        self.rng.as_mut()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.state.creature(id)
    }

    pub fn relationship(&self, observer: EntityId, other: EntityId) -> Relationship {
        self.state.relationship(observer, other)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn allocate_effect_id(&mut self) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        id
    }

    pub(crate) fn next_apply_seq(&mut self) -> u64 {
        self.next_apply_seq += 1;
        self.next_apply_seq
    }

    pub(crate) fn allocate_targeter_id(&mut self) -> TargeterId {
        let id = TargeterId(self.next_targeter);
        self.next_targeter += 1;
        id
    }

    /// Effective attribute: the creature's and its equipped item's entries
    /// resolved as one stacking pool.
    pub fn attribute(&self, id: EntityId, attribute: Attribute) -> i32 {
        self.state.attribute(id, attribute)
    }

    pub fn has_condition(&self, id: EntityId, flag: ConditionFlag) -> bool {
        self.state
            .creature(id)
            .is_some_and(|c| c.ledger.has(flag))
    }

    /// Adds a creature mid-encounter (summons). Auras pick it up immediately.
    pub fn spawn_creature(&mut self, mut creature: Creature) -> EntityId {
        if self.state.creatures.contains_key(&creature.id) {
            creature.id = self.state.allocate_id();
        }
        let position = creature.position;
        let id = self.state.insert_creature(creature);
        self.emit(GameEvent::CreatureSpawned {
            creature: id,
            position,
        });
        self.refresh_auras();
        id
    }

    /// Places a creature on `to` without spending AP, then refreshes auras.
    pub fn move_creature(&mut self, id: EntityId, to: Position) -> Result<(), MoveError> {
        let creature = self
            .state
            .creature_mut(id)
            .ok_or(MoveError::UnknownCreature(id))?;
        let from = creature.position;
        if from == to {
            return Ok(());
        }
        creature.position = to;
        debug!(target: "game_core::movement", creature = %id, %from, %to, "creature moved");
        self.emit(GameEvent::CreatureMoved {
            creature: id,
            from,
            to,
        });
        self.refresh_auras();
        Ok(())
    }

    /// Takes one AP-priced step toward `goal` along `pathing`.
    ///
    /// Returns the new position, which equals the old one when already at `goal`.
    pub fn move_towards(
        &mut self,
        id: EntityId,
        goal: Position,
        pathing: &dyn PathingOracle,
    ) -> Result<Position, MoveError> {
        let cost = self.config.move_ap_cost;
        let creature = self.state.creature(id).ok_or(MoveError::UnknownCreature(id))?;
        if creature.dead {
            return Err(MoveError::Dead(id));
        }
        if creature.ledger.has(ConditionFlag::Immobilized) {
            return Err(MoveError::Immobilized(id));
        }
        if !creature.ap.can_afford(cost) {
            return Err(MoveError::InsufficientAp {
                needed: cost,
                available: creature.ap.current,
            });
        }
        let from = creature.position;
        if from == goal {
            return Ok(from);
        }
        let next = pathing
            .next_step(&self.state, id, from, goal)
            .ok_or(MoveError::NoPath { from, to: goal })?;
        if self.state.occupant(next).is_some_and(|other| other != id) {
            return Err(MoveError::Occupied(next));
        }
        if let Some(creature) = self.state.creature_mut(id) {
            creature.ap.spend(cost);
        }
        self.move_creature(id, next)?;
        Ok(next)
    }

    /// Restores HP up to the effective maximum. Returns the amount healed.
    pub fn heal(&mut self, target: EntityId, amount: i32) -> i32 {
        let max = self.state.max_hp(target);
        let Some(creature) = self.state.creature_mut(target) else {
            return 0;
        };
        if creature.dead || amount <= 0 {
            return 0;
        }
        let before = creature.hp.current;
        creature.hp.current = (before + amount).min(max);
        let healed = creature.hp.current - before;
        if healed > 0 {
            self.emit(GameEvent::Healed {
                target,
                amount: healed,
            });
        }
        healed
    }

    /// Starts a creature's turn: refills its AP.
    pub fn begin_turn(&mut self, id: EntityId) {
        let bonus = self.attribute(id, Attribute::ActionPoints);
        if let Some(creature) = self.state.creature_mut(id) {
            creature.ap.maximum = (self.config.action_points as i32 + bonus).max(0) as u32;
            creature.ap.refill();
        }
    }

    /// One full round tick: effects, slot timers, then aura membership.
    pub fn advance_round(&mut self) {
        self.round += 1;
        self.tick_effects();
        self.tick_slots();
        self.refresh_auras();
        self.emit(GameEvent::RoundAdvanced { round: self.round });
        debug!(target: "game_core::engine", round = self.round, "round advanced");
    }

    /// Living hostiles `observer` can see within `range` tiles, closest first.
    pub fn visible_hostiles(&self, observer: EntityId, range: u32) -> Vec<EntityId> {
        let Some(origin) = self.state.creature(observer).map(|c| c.position) else {
            return Vec::new();
        };
        let mut found: Vec<(u32, EntityId)> = self
            .state
            .creatures_by_relationship(observer, Relationship::Hostile)
            .filter(|c| !c.ledger.has(ConditionFlag::Hidden))
            .map(|c| (c.position.distance(origin), c.id))
            .filter(|(distance, _)| *distance <= range)
            .collect();
        found.sort();
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// True when the creature belongs to an encounter that has not noticed anyone yet.
    pub fn is_dormant(&self, id: EntityId) -> bool {
        self.state
            .creature(id)
            .and_then(|c| c.encounter)
            .and_then(|e| self.state.encounter(e))
            .is_some_and(|e| !e.alerted)
    }

    /// Alerts every dormant encounter with a member in sight of a hostile.
    ///
    /// Returns the encounters alerted by this call.
    pub fn update_alerts(&mut self) -> Vec<EncounterId> {
        let range = self.config.detection_range;
        let newly: Vec<EncounterId> = self
            .state
            .encounters
            .values()
            .filter(|e| !e.alerted)
            .filter(|e| {
                e.members.iter().any(|m| {
                    self.state.creature(*m).is_some_and(Creature::is_alive)
                        && !self.visible_hostiles(*m, range).is_empty()
                })
            })
            .map(|e| e.id)
            .collect();
        for id in &newly {
            if let Some(encounter) = self.state.encounter_mut(*id) {
                encounter.alerted = true;
            }
            debug!(target: "game_core::engine", encounter = id.0, "encounter alerted");
            self.emit(GameEvent::EncounterAlerted { encounter: *id });
        }
        newly
    }

    /// An encounter is over once no member is alive or no member has a living hostile left.
    pub fn encounter_resolved(&self, id: EncounterId) -> bool {
        let Some(encounter) = self.state.encounter(id) else {
            return true;
        };
        !encounter.members.iter().any(|m| {
            self.state.creature(*m).is_some_and(Creature::is_alive)
                && self
                    .state
                    .creatures_by_relationship(*m, Relationship::Hostile)
                    .next()
                    .is_some()
        })
    }

    /// Ends an encounter: members forget encounter-scoped marks and the encounter goes dormant.
    pub fn end_encounter(&mut self, id: EncounterId) {
        let Some(encounter) = self.state.encounter_mut(id) else {
            return;
        };
        encounter.alerted = false;
        let members: Vec<EntityId> = encounter.members.iter().copied().collect();
        for member in members {
            if let Some(creature) = self.state.creature_mut(member) {
                creature.marks.clear_scope(MarkScope::Encounter);
            }
        }
        debug!(target: "game_core::engine", encounter = id.0, "encounter ended");
        self.emit(GameEvent::EncounterEnded { encounter: id });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for engine-level unit tests.
    use super::*;
    use crate::env::SeededRng;
    use crate::state::FactionId;

    pub(crate) const HEROES: FactionId = FactionId(1);
    pub(crate) const MONSTERS: FactionId = FactionId(2);

    pub(crate) fn engine_with(content: ContentRegistry, creatures: Vec<Creature>) -> GameEngine {
        let mut state = GameState::new();
        state.factions.set(HEROES, MONSTERS, Relationship::Hostile);
        for creature in creatures {
            state.insert_creature(creature);
        }
        GameEngine::new(
            state,
            Arc::new(content),
            GameConfig::default(),
            Box::new(SeededRng::new(11)),
        )
    }

    pub(crate) fn hero(id: u32, x: i32, y: i32) -> Creature {
        Creature::new(EntityId(id), format!("hero{id}"), HEROES, Position::new(x, y), 20)
    }

    pub(crate) fn monster(id: u32, x: i32, y: i32) -> Creature {
        Creature::new(EntityId(id), format!("monster{id}"), MONSTERS, Position::new(x, y), 20)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::env::GridPathing;

    #[test]
    fn move_towards_spends_ap_and_records_event() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        engine.begin_turn(EntityId(0));
        let pathing = GridPathing::new();

        let next = engine
            .move_towards(EntityId(0), Position::new(3, 0), &pathing)
            .expect("step");
        assert_eq!(next, Position::new(1, 0));
        let ap = engine.creature(EntityId(0)).expect("hero").ap;
        assert_eq!(ap.current, ap.maximum - engine.config().move_ap_cost);
        assert!(matches!(
            engine.events().last(),
            Some(GameEvent::CreatureMoved { .. })
        ));
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        engine.state_mut().creature_mut(EntityId(0)).expect("hero").hp.current = 15;
        assert_eq!(engine.heal(EntityId(0), 10), 5);
        assert_eq!(engine.heal(EntityId(0), 10), 0);
    }

    #[test]
    fn hidden_hostiles_do_not_alert_an_encounter() {
        use crate::state::EncounterId;
        let camp = EncounterId(1);
        let mut engine = engine_with(
            ContentRegistry::default(),
            vec![hero(0, 0, 0), monster(1, 3, 0).with_encounter(camp)],
        );
        engine
            .state_mut()
            .creature_mut(EntityId(0))
            .expect("hero")
            .ledger
            .grant_flag(EffectId(99), ConditionFlag::Hidden);
        assert!(engine.update_alerts().is_empty());
        assert!(engine.is_dormant(EntityId(1)));

        engine
            .state_mut()
            .creature_mut(EntityId(0))
            .expect("hero")
            .ledger
            .release(EffectId(99));
        assert_eq!(engine.update_alerts(), vec![camp]);
        assert!(!engine.is_dormant(EntityId(1)));
    }

    #[test]
    fn ending_an_encounter_clears_encounter_marks() {
        use crate::state::{EncounterId, Mark, MarkScope};
        let camp = EncounterId(1);
        let mut engine = engine_with(ContentRegistry::default(), vec![monster(1, 0, 0).with_encounter(camp)]);
        let marks = &mut engine.state_mut().creature_mut(EntityId(1)).expect("monster").marks;
        marks.set(Mark::AbilityUsed("summon_wolf".into()), MarkScope::Encounter);
        marks.set(Mark::SummonedBy(EntityId(7)), MarkScope::Campaign);

        assert!(engine.encounter_resolved(camp));
        engine.end_encounter(camp);
        let marks = &engine.creature(EntityId(1)).expect("monster").marks;
        assert_eq!(marks.len(), 1);
        assert!(marks.has(&Mark::SummonedBy(EntityId(7))));
    }

    #[test]
    fn move_towards_rejects_exhausted_ap() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        engine.state_mut().creature_mut(EntityId(0)).expect("hero").ap.current = 0;
        let err = engine
            .move_towards(EntityId(0), Position::new(3, 0), &GridPathing::new())
            .unwrap_err();
        assert!(matches!(err, MoveError::InsufficientAp { .. }));
    }
}
