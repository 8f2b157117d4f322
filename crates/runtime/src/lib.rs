//! Encounter runtime: the round loop, round hooks and turn providers on top
//! of the game engine.
//!
//! ```ignore
//! let mut runtime = Runtime::builder()
//!     .config(RuntimeConfig::from_env())
//!     .initial_state(state)
//!     .build();
//! let rounds = runtime.run()?;
//! ```

pub mod error;
pub mod hooks;
pub mod providers;
pub mod runtime;

pub use error::{Result, RuntimeError};
pub use hooks::{HookCriticality, HookRegistry, RoundHook, RoundPhase};
pub use providers::ai::{AiContext, AiProvider, BasicAttackAi, TurnPlanner};
pub use providers::{PassiveProvider, TurnProvider, TurnReport};
pub use runtime::{RoundSummary, Runtime, RuntimeBuilder, RuntimeConfig};
