//! Movement queries the engine and AI consume.
//!
//! Real pathfinding lives with the host. The core only needs "which tile do I
//! step to next", "roughly how far is it", and "how many reactions would this
//! approach provoke". [`GridPathing`] is a greedy open-grid implementation
//! good enough for arenas and tests.

use std::collections::BTreeSet;

use crate::state::{EntityId, GameState, Position, Relationship};

/// Movement and pathing oracle.
pub trait PathingOracle: Send + Sync {
    /// The next tile on a route from `from` toward `goal`, or `None` when no
    /// step makes progress.
    fn next_step(&self, state: &GameState, mover: EntityId, from: Position, goal: Position) -> Option<Position>;

    /// Steps needed to stand adjacent to `goal`, or `None` when unreachable.
    fn path_cost(&self, state: &GameState, mover: EntityId, from: Position, goal: Position) -> Option<u32>;

    /// Attacks of opportunity the mover would provoke approaching `goal`.
    fn provoked_reactions(&self, state: &GameState, mover: EntityId, from: Position, goal: Position) -> u32;
}

#[derive(Clone, Debug, Default)]
pub struct GridPathing {
    blocked: BTreeSet<Position>,
}

impl GridPathing {
    /// Upper bound on simulated steps in `path_cost`.
    const MAX_PATH: u32 = 64;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocked(blocked: impl IntoIterator<Item = Position>) -> Self {
        Self {
            blocked: blocked.into_iter().collect(),
        }
    }

    pub fn block(&mut self, position: Position) {
        self.blocked.insert(position);
    }

    pub fn is_blocked(&self, position: Position) -> bool {
        self.blocked.contains(&position)
    }

    fn walkable(&self, state: &GameState, mover: EntityId, position: Position) -> bool {
        !self.is_blocked(position) && state.occupant(position).is_none_or(|id| id == mover)
    }
}

impl PathingOracle for GridPathing {
    fn next_step(&self, state: &GameState, mover: EntityId, from: Position, goal: Position) -> Option<Position> {
        let current = from.distance(goal);
        from.neighbors()
            .filter(|n| self.walkable(state, mover, *n))
            .filter(|n| n.distance(goal) < current)
            .min_by(|a, b| {
                a.distance(goal)
                    .cmp(&b.distance(goal))
                    .then_with(|| a.euclidean(goal).total_cmp(&b.euclidean(goal)))
                    .then_with(|| a.cmp(b))
            })
    }

    fn path_cost(&self, state: &GameState, mover: EntityId, from: Position, goal: Position) -> Option<u32> {
        let mut position = from;
        for steps in 0..=Self::MAX_PATH {
            if position.distance(goal) <= 1 {
                return Some(steps);
            }
            position = self.next_step(state, mover, position, goal)?;
        }
        None
    }

    fn provoked_reactions(&self, state: &GameState, mover: EntityId, from: Position, goal: Position) -> u32 {
        // Leaving a hostile's reach provokes; the creature we walk toward does not count.
        state
            .creatures_by_relationship(mover, Relationship::Hostile)
            .filter(|c| c.position != goal && c.position.distance(from) <= 1)
            .count() as u32
    }
}
