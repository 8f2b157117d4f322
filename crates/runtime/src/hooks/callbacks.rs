use tracing::debug;

use game_core::GameEngine;

use super::{HookCriticality, RoundHook, RoundPhase};
use crate::error::{Result, RuntimeError};

/// Lands every delayed callback still in flight before the round closes.
pub struct CallbackDrainHook;

impl RoundHook for CallbackDrainHook {
    fn name(&self) -> &'static str {
        "callback_drain"
    }

    fn phase(&self) -> RoundPhase {
        RoundPhase::End
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    fn should_trigger(&self, engine: &GameEngine) -> bool {
        engine.scheduler().pending() > 0
    }

    fn run(&self, engine: &mut GameEngine) -> Result<()> {
        let fired = engine.run_pending_callbacks();
        debug!(target: "runtime::hooks", fired, "callbacks drained");
        match engine.scheduler().pending() {
            0 => Ok(()),
            pending => Err(RuntimeError::CallbackOverflow { pending }),
        }
    }
}
