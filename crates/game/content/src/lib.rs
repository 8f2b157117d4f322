//! Concrete abilities, effect templates and data loaders.
//!
//! The engine in `game-core` knows how effects, auras, slots and targeters
//! behave; this crate supplies the actual spells and maneuvers:
//! - effect templates with round, aura and combat hooks ([`effects`])
//! - the ability catalog built from reusable resolvers ([`abilities`])
//! - TOML rules and RON tuning loaders (feature `loaders`)

pub mod abilities;
pub mod effects;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use abilities::{builtin_abilities, builtin_content, ids};
pub use effects::builtin_templates;

#[cfg(feature = "loaders")]
pub use loaders::{AbilityTuning, ConfigLoader, ContentFactory, LoadResult, TuningCatalog, TuningLoader};
