//! Turn providers decide what a creature does with its turn.
//!
//! The runtime picks a provider per creature from its [`Controller`](game_core::Controller):
//! AI-controlled creatures go to the [`ai::AiProvider`], player-controlled ones
//! to whatever the host injected (a [`PassiveProvider`] when nothing was).

pub mod ai;

use serde::Serialize;

use game_core::{EntityId, GameEngine};

use crate::error::Result;

/// What a creature ended up doing during one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub creature: EntityId,
    /// Ability ids that resolved, in order.
    pub abilities: Vec<String>,
    pub attacks: u32,
    pub steps: u32,
    /// The basic-attack fallback took part of the turn.
    pub fell_back: bool,
    /// The creature sat the turn out (dormant, dead or incapacitated).
    pub idle: bool,
}

impl TurnReport {
    pub fn new(creature: EntityId) -> Self {
        Self {
            creature,
            ..Self::default()
        }
    }

    pub fn idle(creature: EntityId) -> Self {
        Self {
            creature,
            idle: true,
            ..Self::default()
        }
    }
}

/// Trait for deciding and carrying out one creature's turn.
///
/// Different implementations can handle:
/// - NPC AI decisions
/// - Player input forwarded by a host
/// - Scripted fixtures in tests
pub trait TurnProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Plays `creature`'s turn against the engine. AP has already been refilled.
    fn take_turn(&self, engine: &mut GameEngine, creature: EntityId) -> Result<TurnReport>;
}

/// Ends every turn immediately. Stands in for player-controlled creatures in headless runs.
pub struct PassiveProvider;

impl TurnProvider for PassiveProvider {
    fn name(&self) -> &'static str {
        "passive"
    }

    fn take_turn(&self, _engine: &mut GameEngine, creature: EntityId) -> Result<TurnReport> {
        Ok(TurnReport::idle(creature))
    }
}
