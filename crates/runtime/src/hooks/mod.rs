//! Round hook system for encounter orchestration.
//!
//! Hooks run at fixed points of every round, sorted by priority within their
//! phase. They carry the bookkeeping that is not any single creature's turn:
//! waking encounters, landing in-flight callbacks, ticking effects.
//!
//! # Execution Order
//!
//! - [`RoundPhase::Start`] hooks run before the first turn of a round
//! - [`RoundPhase::End`] hooks run after the last turn
//! - Lower priority values execute first within a phase

mod alert;
mod callbacks;
mod registry;
mod tick;

pub use alert::EncounterAlertHook;
pub use callbacks::CallbackDrainHook;
pub use registry::HookRegistry;
pub use tick::RoundTickHook;

use game_core::GameEngine;

use crate::error::Result;

/// Defines the criticality level of a hook for error handling.
///
/// - Critical hooks must succeed or the round fails
/// - Important hooks log errors but allow continuation
/// - Optional hooks can fail silently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCriticality {
    /// Hook failure aborts the round.
    ///
    /// Use for hooks that keep the rules consistent (e.g., the round tick).
    Critical,

    /// Hook failure is logged as an error but the round continues.
    Important,

    /// Hook failure is logged at debug level.
    Optional,
}

/// When in a round a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Start,
    End,
}

/// Bookkeeping that runs once per round.
pub trait RoundHook: Send + Sync {
    /// Returns a human-readable name for this hook (used in logging and debugging).
    fn name(&self) -> &'static str;

    fn phase(&self) -> RoundPhase;

    /// Lower values execute first within the phase.
    fn priority(&self) -> i32 {
        0
    }

    fn criticality(&self) -> HookCriticality {
        HookCriticality::Important
    }

    /// Cheap check that lets a hook skip rounds with nothing to do.
    fn should_trigger(&self, _engine: &GameEngine) -> bool {
        true
    }

    fn run(&self, engine: &mut GameEngine) -> Result<()>;
}
