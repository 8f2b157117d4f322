//! Capability interfaces effect templates implement.
//!
//! Each hook category is its own trait. A template opts in by filling the
//! matching `Option` in [`EffectBehavior`]; an empty slot means the engine
//! skips that hook entirely.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::combat::{Attack, Damage};
use crate::engine::GameEngine;
use crate::state::{EffectId, EntityId};

pub trait ApplyHandler: Send + Sync {
    fn on_apply(&self, engine: &mut GameEngine, effect: EffectId);
}

/// Called once per round for every applied effect, in application order.
///
/// The handler may remove its own effect; the engine notices and skips the
/// duration countdown for it.
pub trait RoundTickHandler: Send + Sync {
    fn on_round_elapsed(&self, engine: &mut GameEngine, effect: EffectId);
}

pub trait RemoveHandler: Send + Sync {
    fn on_remove(&self, engine: &mut GameEngine, effect: EffectId);
}

/// Attack and damage pipeline participation.
///
/// `on_attack`/`on_attack_hit` run for effects on the attacker,
/// `on_defense`/`on_defense_hit`/`on_damaged` for effects on the defender.
pub trait CombatHook: Send + Sync {
    fn on_attack(&self, _engine: &mut GameEngine, _attack: &mut Attack, _effect: EffectId) {}

    fn on_defense(&self, _engine: &mut GameEngine, _attack: &mut Attack, _effect: EffectId) {}

    fn on_attack_hit(
        &self,
        _engine: &mut GameEngine,
        _attack: &Attack,
        _damage: &mut Damage,
        _effect: EffectId,
    ) {
    }

    fn on_defense_hit(
        &self,
        _engine: &mut GameEngine,
        _attack: &Attack,
        _damage: &mut Damage,
        _effect: EffectId,
    ) {
    }

    fn on_damaged(&self, _engine: &mut GameEngine, _damage: &Damage, _effect: EffectId) {}
}

/// Populates and tears down the per-target children of an aura.
///
/// The propagator creates the pending child effect and applies it after
/// `on_target_enter` returns, so every creature inside the radius ends up
/// with exactly one child even if the handler adds nothing to it.
pub trait AuraHandler: Send + Sync {
    fn on_target_enter(&self, engine: &mut GameEngine, aura: EffectId, target: EntityId, child: EffectId);

    /// Runs before the child is removed.
    fn on_target_exit(&self, _engine: &mut GameEngine, _aura: EffectId, _target: EntityId, _child: EffectId) {}
}

#[derive(Clone, Default)]
pub struct EffectBehavior {
    pub on_apply: Option<Arc<dyn ApplyHandler>>,
    pub on_round: Option<Arc<dyn RoundTickHandler>>,
    pub on_remove: Option<Arc<dyn RemoveHandler>>,
    pub combat: Option<Arc<dyn CombatHook>>,
    pub aura: Option<Arc<dyn AuraHandler>>,
}

impl EffectBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apply(mut self, handler: Arc<dyn ApplyHandler>) -> Self {
        self.on_apply = Some(handler);
        self
    }

    pub fn with_round(mut self, handler: Arc<dyn RoundTickHandler>) -> Self {
        self.on_round = Some(handler);
        self
    }

    pub fn with_remove(mut self, handler: Arc<dyn RemoveHandler>) -> Self {
        self.on_remove = Some(handler);
        self
    }

    pub fn with_combat(mut self, handler: Arc<dyn CombatHook>) -> Self {
        self.combat = Some(handler);
        self
    }

    pub fn with_aura(mut self, handler: Arc<dyn AuraHandler>) -> Self {
        self.aura = Some(handler);
        self
    }
}

impl fmt::Debug for EffectBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectBehavior")
            .field("on_apply", &self.on_apply.is_some())
            .field("on_round", &self.on_round.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .field("combat", &self.combat.is_some())
            .field("aura", &self.aura.is_some())
            .finish()
    }
}

/// A named effect blueprint: default title plus behavior.
#[derive(Clone, Debug)]
pub struct EffectTemplate {
    pub id: String,
    pub title: String,
    pub behavior: EffectBehavior,
}

impl EffectTemplate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, behavior: EffectBehavior) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            behavior,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EffectTemplateRegistry {
    templates: BTreeMap<String, EffectTemplate>,
}

impl EffectTemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `template`, replacing any template with the same id.
    pub fn register(&mut self, template: EffectTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&EffectTemplate> {
        self.templates.get(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
