use tracing::info;

use game_core::GameEngine;

use super::{RoundHook, RoundPhase};
use crate::error::Result;

/// Wakes encounters whose members can see a hostile.
pub struct EncounterAlertHook;

impl RoundHook for EncounterAlertHook {
    fn name(&self) -> &'static str {
        "encounter_alert"
    }

    fn phase(&self) -> RoundPhase {
        RoundPhase::Start
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn should_trigger(&self, engine: &GameEngine) -> bool {
        engine.state().encounters.values().any(|e| !e.alerted)
    }

    fn run(&self, engine: &mut GameEngine) -> Result<()> {
        for encounter in engine.update_alerts() {
            info!(target: "runtime::hooks", encounter = encounter.0, "encounter alerted");
        }
        Ok(())
    }
}
