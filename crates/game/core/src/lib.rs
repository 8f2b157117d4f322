//! Deterministic effect, ability, and combat rules shared by every consumer.
//!
//! `game-core` defines the canonical rules (bonus ledgers, effect lifecycle,
//! auras, the ability/targeter state machine, the delayed callback scheduler)
//! and the world state they operate on. All state mutation flows through
//! [`engine::GameEngine`], and supporting crates depend on the types
//! re-exported here.
pub mod ability;
pub mod aura;
pub mod combat;
pub mod config;
pub mod effect;
pub mod engine;
pub mod env;
pub mod error;
pub mod events;
pub mod ledger;
pub mod scheduler;
pub mod state;

pub use ability::{
    Ability, AbilityBehavior, AbilityDefinition, AbilityError, AbilityRegistry, Activation,
    ActivationBlock, ActivationGate, ActivationHandler, ActionType, AiTag, AiTargetCheck,
    RangeBand, RelationshipMask, SaveKind, SelectOutcome, SelectionMode, Slot, SlotRef,
    SlotState, TargetResolver, TargetSelection, TargetValidator, Targeter, TargeterId,
    TargeterShape, TargetingError, TargetingSpec, ToggleHandler,
};
pub use aura::AuraState;
pub use combat::{Attack, AttackOutcome, CombatError, Damage};
pub use config::GameConfig;
pub use effect::{
    ApplyHandler, AuraHandler, CombatHook, Duration, Effect, EffectBehavior, EffectError,
    EffectFlags, EffectParams, EffectPhase, EffectTarget, EffectTemplate,
    EffectTemplateRegistry, RemoveHandler, RoundTickHandler,
};
pub use engine::{ContentRegistry, DispelCheck, DispelReport, GameEngine};
pub use env::{GameRng, GridPathing, MoveError, PathingOracle, SeededRng};
pub use error::{ErrorSeverity, GameError};
pub use events::GameEvent;
pub use ledger::{
    Attribute, Bonus, BonusLedger, ConditionFlag, DamageLedger, DamageModifier,
    DamageModifierKind, DamageType, StackingCategory,
};
pub use scheduler::{
    CallbackArgs, CallbackId, CallbackOwner, DeferredTask, DelayedCallback, InputState,
    Scheduler,
};
pub use state::{
    ActionPoints, CasterProfile, Controller, Creature, EffectId, Encounter, EncounterId,
    EntityId, FactionId, FactionTable, GameState, Item, Mark, MarkScope, Marks, Position,
    Relationship, ResourceMeter, WeaponKind, WeaponProfile,
};
