use game_core::GameEngine;

use super::{HookCriticality, RoundHook, RoundPhase};
use crate::error::Result;

/// Advances durations, slot timers and aura membership by one round.
pub struct RoundTickHook;

impl RoundHook for RoundTickHook {
    fn name(&self) -> &'static str {
        "round_tick"
    }

    fn phase(&self) -> RoundPhase {
        RoundPhase::End
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Critical
    }

    fn run(&self, engine: &mut GameEngine) -> Result<()> {
        engine.advance_round();
        Ok(())
    }
}
