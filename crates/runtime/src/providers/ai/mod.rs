//! Priority-driven turn planner for AI-controlled creatures.
//!
//! A turn goes through these steps:
//!
//! 1. **Gate**: members of a dormant encounter do nothing
//! 2. **Candidates**: slots whose ability type the AI casts on its own, heals
//!    only while a friend is hurt ([`candidates`])
//! 3. **Overrides**: tactical rules that jump the queue with a precomputed
//!    target ([`overrides`])
//! 4. **Abilities**: in priority order, pick a target, walk into range and
//!    try to activate ([`planner`])
//! 5. **Basic attack**: leftover AP, or no usable ability at all, goes to the
//!    weapon attack routine ([`basic`])
//!
//! # Core Components
//!
//! - [`AiProvider`]: [`crate::TurnProvider`] implementation
//! - [`TurnPlanner`]: the ability phase
//! - [`BasicAttackAi`]: move-and-attack fallback
//! - [`AiContext`]: per-turn view with helper queries

pub mod basic;
pub mod candidates;
pub mod context;
pub mod overrides;
pub mod planner;
pub mod targeting;

pub use basic::BasicAttackAi;
pub use candidates::{Candidate, candidate_slots};
pub use context::AiContext;
pub use overrides::{SupportOverride, TacticalOverride, TotalDefenseWhenSurrounded, default_overrides};
pub use planner::TurnPlanner;
pub use targeting::{Aim, choose_aim};

use std::sync::Arc;

use game_core::{EntityId, GameEngine, GridPathing, PathingOracle};

use crate::error::Result;
use crate::providers::{TurnProvider, TurnReport};

/// Turn provider running the planner for AI-controlled creatures.
pub struct AiProvider {
    planner: TurnPlanner,
    pathing: Arc<dyn PathingOracle>,
}

impl AiProvider {
    pub fn new(pathing: Arc<dyn PathingOracle>) -> Self {
        Self {
            planner: TurnPlanner::new(),
            pathing,
        }
    }

    pub fn with_planner(mut self, planner: TurnPlanner) -> Self {
        self.planner = planner;
        self
    }
}

impl Default for AiProvider {
    fn default() -> Self {
        Self::new(Arc::new(GridPathing::new()))
    }
}

impl TurnProvider for AiProvider {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn take_turn(&self, engine: &mut GameEngine, creature: EntityId) -> Result<TurnReport> {
        self.planner.plan_turn(engine, creature, self.pathing.as_ref())
    }
}
