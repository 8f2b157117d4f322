//! Per-turn view the planner and its overrides read from.

use game_core::{EntityId, GameEngine, PathingOracle, Position, Relationship};

/// Who is acting and the rules they act under.
///
/// Queries take the engine by reference so they always see the state as it
/// is after the previous step of the turn.
pub struct AiContext<'a> {
    pub creature: EntityId,
    pub pathing: &'a dyn PathingOracle,
}

impl<'a> AiContext<'a> {
    pub fn new(creature: EntityId, pathing: &'a dyn PathingOracle) -> Self {
        Self { creature, pathing }
    }

    pub fn position(&self, engine: &GameEngine) -> Option<Position> {
        engine.creature(self.creature).map(|c| c.position)
    }

    pub fn ap(&self, engine: &GameEngine) -> u32 {
        engine.creature(self.creature).map_or(0, |c| c.ap.current)
    }

    /// True when the creature cannot act at all this turn.
    pub fn incapacitated(&self, engine: &GameEngine) -> bool {
        engine
            .creature(self.creature)
            .is_none_or(|c| c.dead || c.ledger.prevents_action())
    }

    /// Living hostiles standing next to the creature.
    pub fn adjacent_hostiles(&self, engine: &GameEngine) -> usize {
        let Some(position) = self.position(engine) else {
            return 0;
        };
        engine
            .state()
            .creatures_by_relationship(self.creature, Relationship::Hostile)
            .filter(|c| c.position.distance(position) <= 1)
            .count()
    }

    /// Whether the creature or any friend is below the heal threshold.
    pub fn friend_needs_healing(&self, engine: &GameEngine) -> bool {
        let threshold = engine.config().heal_threshold();
        engine
            .state()
            .creatures
            .values()
            .filter(|c| c.is_alive())
            .filter(|c| engine.relationship(self.creature, c.id) == Relationship::Friendly)
            .any(|c| engine.state().hp_fraction(c.id) < threshold)
    }
}
