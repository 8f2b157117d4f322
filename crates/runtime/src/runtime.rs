//! Encounter orchestrator.
//!
//! The runtime owns the engine and drives it round by round: start hooks,
//! one turn per living creature in initiative order, end hooks. Turns are
//! handed to a [`TurnProvider`] picked by the creature's controller.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use game_core::{
    ContentRegistry, Controller, EncounterId, EntityId, GameConfig, GameEngine, GameEvent, GameRng, GameState,
    Relationship, SeededRng,
};

use crate::error::Result;
use crate::hooks::{HookRegistry, RoundPhase};
use crate::providers::ai::AiProvider;
use crate::providers::{PassiveProvider, TurnProvider, TurnReport};

/// Runtime configuration read from the process environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub seed: u64,
    pub max_rounds: u32,
    /// Directory holding `config.toml` and `abilities.ron`; built-in data when `None`.
    pub content_dir: Option<PathBuf>,
    pub session_id: Option<String>,
}

impl RuntimeConfig {
    pub const DEFAULT_SEED: u64 = 0x5EED;
    pub const DEFAULT_MAX_ROUNDS: u32 = 20;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SKIRMISH_SEED` - RNG seed (default: 0x5EED)
    /// - `SKIRMISH_MAX_ROUNDS` - Round cap for [`Runtime::run`] (default: 20)
    /// - `SKIRMISH_CONTENT_DIR` - Data directory override (default: built-in)
    /// - `SKIRMISH_SESSION_ID` - Label for log files (default: none)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(seed) = read_env::<u64>("SKIRMISH_SEED") {
            config.seed = seed;
        }
        if let Some(rounds) = read_env::<u32>("SKIRMISH_MAX_ROUNDS") {
            config.max_rounds = rounds.max(1);
        }
        config.content_dir = env::var("SKIRMISH_CONTENT_DIR").ok().map(PathBuf::from);
        config.session_id = env::var("SKIRMISH_SESSION_ID").ok();
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            content_dir: None,
            session_id: None,
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

/// Everything that happened during one round.
#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub turns: Vec<TurnReport>,
    pub events: Vec<GameEvent>,
}

/// Main runtime that plays encounters to completion.
pub struct Runtime {
    config: RuntimeConfig,
    engine: GameEngine,
    hooks: HookRegistry,
    ai: Box<dyn TurnProvider>,
    player: Box<dyn TurnProvider>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GameEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> GameEngine {
        self.engine
    }

    /// Living creatures in turn order: initiative descending, then id.
    pub fn turn_order(&self) -> Vec<EntityId> {
        let mut order: Vec<(i32, EntityId)> = self
            .engine
            .state()
            .creatures
            .values()
            .filter(|c| c.is_alive())
            .map(|c| (c.initiative, c.id))
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        order.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether any living creature still has a living hostile.
    pub fn hostilities_remain(&self) -> bool {
        let state = self.engine.state();
        state
            .creatures
            .values()
            .filter(|c| c.is_alive())
            .any(|c| state.creatures_by_relationship(c.id, Relationship::Hostile).next().is_some())
    }

    /// Plays one round and returns what happened.
    ///
    /// Creatures summoned mid-round act from the next round on. Callbacks a
    /// turn scheduled land before the next creature acts.
    pub fn run_round(&mut self) -> Result<RoundSummary> {
        let round = self.engine.round();
        self.hooks.execute(RoundPhase::Start, &mut self.engine)?;

        let mut turns = Vec::new();
        for creature in self.turn_order() {
            if !self.engine.creature(creature).is_some_and(|c| c.is_alive()) {
                continue;
            }
            self.engine.begin_turn(creature);
            let provider = match self.engine.creature(creature).map(|c| c.controller) {
                Some(Controller::Player) => self.player.as_ref(),
                _ => self.ai.as_ref(),
            };
            let report = provider.take_turn(&mut self.engine, creature)?;
            let landed = self.engine.run_pending_callbacks();
            if landed > 0 {
                debug!(target: "runtime", %creature, landed, "callbacks landed after turn");
            }
            turns.push(report);
        }

        self.hooks.execute(RoundPhase::End, &mut self.engine)?;
        for encounter in self.resolved_encounters() {
            self.engine.end_encounter(encounter);
        }

        let events = self.engine.drain_events();
        info!(target: "runtime", round, turns = turns.len(), events = events.len(), "round complete");
        Ok(RoundSummary { round, turns, events })
    }

    /// Plays rounds until nobody is left to fight or the round cap is hit.
    pub fn run(&mut self) -> Result<Vec<RoundSummary>> {
        let mut rounds = Vec::new();
        while rounds.len() < self.config.max_rounds as usize && self.hostilities_remain() {
            rounds.push(self.run_round()?);
        }
        info!(
            target: "runtime",
            rounds = rounds.len(),
            unresolved = self.hostilities_remain(),
            "encounter run finished"
        );
        Ok(rounds)
    }

    fn resolved_encounters(&self) -> Vec<EncounterId> {
        self.engine
            .state()
            .encounters
            .values()
            .filter(|e| e.alerted)
            .map(|e| e.id)
            .filter(|id| self.engine.encounter_resolved(*id))
            .collect()
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    game_config: GameConfig,
    state: GameState,
    content: Option<Arc<ContentRegistry>>,
    rng: Option<Box<dyn GameRng>>,
    hooks: Option<HookRegistry>,
    ai: Option<Box<dyn TurnProvider>>,
    player: Option<Box<dyn TurnProvider>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            game_config: GameConfig::default(),
            state: GameState::new(),
            content: None,
            rng: None,
            hooks: None,
            ai: None,
            player: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    pub fn initial_state(mut self, state: GameState) -> Self {
        self.state = state;
        self
    }

    /// Ability and effect catalog. Defaults to the built-in content.
    pub fn content(mut self, content: Arc<ContentRegistry>) -> Self {
        self.content = Some(content);
        self
    }

    /// Random source. Defaults to a [`SeededRng`] on the configured seed.
    pub fn rng(mut self, rng: Box<dyn GameRng>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Set custom round hooks.
    ///
    /// If not provided, [`HookRegistry::default_hooks`] is used.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn ai_provider(mut self, provider: impl TurnProvider + 'static) -> Self {
        self.ai = Some(Box::new(provider));
        self
    }

    pub fn player_provider(mut self, provider: impl TurnProvider + 'static) -> Self {
        self.player = Some(Box::new(provider));
        self
    }

    pub fn build(self) -> Runtime {
        let content = self.content.unwrap_or_else(game_content::builtin_content);
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(SeededRng::new(self.config.seed)));
        let engine = GameEngine::new(self.state, content, self.game_config, rng);
        debug!(
            target: "runtime",
            seed = self.config.seed,
            creatures = engine.state().creatures.len(),
            "runtime built"
        );
        Runtime {
            config: self.config,
            engine,
            hooks: self.hooks.unwrap_or_else(HookRegistry::default_hooks),
            ai: self.ai.unwrap_or_else(|| Box::new(AiProvider::default())),
            player: self.player.unwrap_or_else(|| Box::new(PassiveProvider)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_unset_environment() {
        let config = RuntimeConfig::default();
        assert_eq!(config.seed, RuntimeConfig::DEFAULT_SEED);
        assert_eq!(config.max_rounds, RuntimeConfig::DEFAULT_MAX_ROUNDS);
        assert!(config.content_dir.is_none());
    }

    #[test]
    fn empty_runtime_has_no_hostilities() {
        let mut runtime = Runtime::builder().build();
        assert!(!runtime.hostilities_remain());
        assert!(runtime.run().expect("run").is_empty());
    }
}
