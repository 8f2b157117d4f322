//! Hook registry for managing and executing round hooks.

use std::sync::Arc;

use tracing::{debug, error};

use game_core::GameEngine;

use super::{HookCriticality, RoundHook, RoundPhase};
use crate::error::{Result, RuntimeError};

/// Registry that runs round hooks phase by phase in priority order.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Arc<[Arc<dyn RoundHook>]>,
}

impl HookRegistry {
    /// Creates a registry. Hooks are sorted by priority (lower values first).
    pub fn new(mut hooks: Vec<Arc<dyn RoundHook>>) -> Self {
        hooks.sort_by_key(|h| h.priority());
        Self { hooks: hooks.into() }
    }

    /// Creates a registry with the default set of hooks.
    ///
    /// - EncounterAlertHook: wakes encounters at round start
    /// - CallbackDrainHook: lands in-flight callbacks at round end
    /// - RoundTickHook: advances the round after the drain
    pub fn default_hooks() -> Self {
        use super::{CallbackDrainHook, EncounterAlertHook, RoundTickHook};

        Self::new(vec![
            Arc::new(EncounterAlertHook) as Arc<dyn RoundHook>,
            Arc::new(CallbackDrainHook) as Arc<dyn RoundHook>,
            Arc::new(RoundTickHook) as Arc<dyn RoundHook>,
        ])
    }

    /// Executes every hook registered for `phase`.
    ///
    /// # Error Handling
    ///
    /// - `Critical`: returns the error immediately, failing the round
    /// - `Important`: logs at error level and continues
    /// - `Optional`: logs at debug level and continues
    pub fn execute(&self, phase: RoundPhase, engine: &mut GameEngine) -> Result<()> {
        for hook in self.hooks.iter().filter(|h| h.phase() == phase) {
            if !hook.should_trigger(engine) {
                continue;
            }
            if let Err(e) = hook.run(engine) {
                self.handle_hook_error(hook.as_ref(), e)?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Returns an iterator over hook names and priorities (for debugging).
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.hooks.iter().map(|h| (h.name(), h.priority()))
    }

    fn handle_hook_error(&self, hook: &dyn RoundHook, error: RuntimeError) -> Result<()> {
        match hook.criticality() {
            HookCriticality::Critical => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "critical",
                    error = %error,
                    "Critical hook failed, aborting round"
                );
                Err(RuntimeError::Hook {
                    hook: hook.name(),
                    message: error.to_string(),
                })
            }
            HookCriticality::Important => {
                error!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "important",
                    error = %error,
                    "Hook failed, continuing"
                );
                Ok(())
            }
            HookCriticality::Optional => {
                debug!(
                    target: "runtime::hooks",
                    hook = hook.name(),
                    criticality = "optional",
                    error = %error,
                    "Optional hook failed"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use game_core::{GameConfig, GameState, SeededRng};

    struct Probe {
        name: &'static str,
        priority: i32,
        criticality: HookCriticality,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RoundHook for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn phase(&self) -> RoundPhase {
            RoundPhase::End
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn criticality(&self) -> HookCriticality {
            self.criticality
        }

        fn run(&self, _engine: &mut GameEngine) -> Result<()> {
            self.log.lock().expect("log").push(self.name);
            if self.fail {
                return Err(RuntimeError::CallbackOverflow { pending: 1 });
            }
            Ok(())
        }
    }

    fn engine() -> GameEngine {
        GameEngine::new(
            GameState::new(),
            Arc::new(game_core::ContentRegistry::default()),
            GameConfig::default(),
            Box::new(SeededRng::new(1)),
        )
    }

    fn probe(
        name: &'static str,
        priority: i32,
        criticality: HookCriticality,
        fail: bool,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn RoundHook> {
        Arc::new(Probe {
            name,
            priority,
            criticality,
            fail,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn hooks_run_in_priority_order_and_tolerate_important_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HookRegistry::new(vec![
            probe("late", 5, HookCriticality::Important, false, &log),
            probe("early", -5, HookCriticality::Important, true, &log),
            probe("quiet", 0, HookCriticality::Optional, true, &log),
        ]);

        registry.execute(RoundPhase::End, &mut engine()).expect("round continues");
        assert_eq!(*log.lock().expect("log"), vec!["early", "quiet", "late"]);
        registry.execute(RoundPhase::Start, &mut engine()).expect("nothing to run");
        assert_eq!(log.lock().expect("log").len(), 3);
    }

    #[test]
    fn critical_failure_aborts_the_phase() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = HookRegistry::new(vec![
            probe("tick", 0, HookCriticality::Critical, true, &log),
            probe("after", 1, HookCriticality::Important, false, &log),
        ]);

        let err = registry.execute(RoundPhase::End, &mut engine()).unwrap_err();
        assert!(matches!(err, RuntimeError::Hook { hook: "tick", .. }));
        assert_eq!(*log.lock().expect("log"), vec!["tick"]);
    }
}
