//! Effects: timed bundles of modifiers applied to a creature or an item.
//!
//! An effect is created pending, configured (bonuses, conditions, icons),
//! then applied. Applying writes its contributions into the target's ledger;
//! removal releases them. The lifecycle itself is driven by
//! [`crate::engine::GameEngine`]; this module holds the data model and the
//! capability interfaces templates implement.
mod hooks;

pub use hooks::{
    ApplyHandler, AuraHandler, CombatHook, EffectBehavior, EffectTemplate, EffectTemplateRegistry,
    RemoveHandler, RoundTickHandler,
};

use bitflags::bitflags;

use crate::ability::SlotRef;
use crate::aura::AuraState;
use crate::error::{ErrorSeverity, GameError};
use crate::ledger::{Attribute, Bonus, ConditionFlag, DamageModifier, DamageType, StackingCategory};
use crate::state::{EffectId, EntityId};

/// How long an effect lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Duration {
    /// Removed after this many round ticks.
    Rounds(u32),
    /// Stays until explicitly removed.
    Permanent,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct EffectFlags: u8 {
        /// Removed when the slot that created it deactivates.
        const REMOVE_ON_DEACTIVATE = 1 << 0;
        /// Shows a description in the effect tooltip.
        const HAS_DESCRIPTION = 1 << 1;
        /// Ignored by dispels.
        const UNDISPELLABLE = 1 << 2;
        /// Detrimental to its target; dispel content uses this to pick sides.
        const HARMFUL = 1 << 3;
    }
}

/// What an effect is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectTarget {
    Creature(EntityId),
    Item(EntityId),
}

impl EffectTarget {
    pub const fn entity(self) -> EntityId {
        match self {
            Self::Creature(id) | Self::Item(id) => id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectPhase {
    /// Created and being configured; contributes nothing yet.
    Pending,
    /// Committed to its target's effect list and ledger.
    Applied,
    /// `on_remove` is running; further removal requests are ignored.
    Removing,
}

/// Free parameters a template reads back during its hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectParams {
    pub magnitude: i32,
    pub damage_type: Option<DamageType>,
    /// Difficulty for saves made while the effect persists.
    pub dc: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effect {
    pub id: EffectId,
    pub title: String,
    pub target: EffectTarget,
    pub caster: Option<EntityId>,
    pub source_slot: Option<SlotRef>,
    pub template: Option<String>,
    pub duration: Duration,
    pub rounds_elapsed: u32,
    /// Spell level and casting attribute of whoever created the effect, for dispel checks.
    pub spell_level: i32,
    pub caster_attribute: i32,
    pub bonuses: Vec<Bonus>,
    pub conditions: Vec<ConditionFlag>,
    pub damage_modifiers: Vec<DamageModifier>,
    pub icons: Vec<String>,
    pub animations: Vec<String>,
    pub children: Vec<EffectId>,
    pub parent: Option<EffectId>,
    pub flags: EffectFlags,
    pub params: EffectParams,
    pub phase: EffectPhase,
    pub aura: Option<AuraState>,
    pub(crate) applied_seq: u64,
}

impl Effect {
    pub(crate) fn new(id: EffectId, target: EffectTarget) -> Self {
        Self {
            id,
            title: String::new(),
            target,
            caster: None,
            source_slot: None,
            template: None,
            duration: Duration::Permanent,
            rounds_elapsed: 0,
            spell_level: 0,
            caster_attribute: 0,
            bonuses: Vec::new(),
            conditions: Vec::new(),
            damage_modifiers: Vec::new(),
            icons: Vec::new(),
            animations: Vec::new(),
            children: Vec::new(),
            parent: None,
            flags: EffectFlags::empty(),
            params: EffectParams::default(),
            phase: EffectPhase::Pending,
            aura: None,
            applied_seq: 0,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.phase == EffectPhase::Applied
    }

    pub fn is_aura(&self) -> bool {
        self.aura.is_some()
    }

    pub fn is_dispellable(&self) -> bool {
        !self.flags.contains(EffectFlags::UNDISPELLABLE)
    }

    /// Rounds until expiry, `None` for permanent effects.
    pub fn rounds_left(&self) -> Option<u32> {
        match self.duration {
            Duration::Rounds(total) => Some(total.saturating_sub(self.rounds_elapsed)),
            Duration::Permanent => None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = duration;
        self
    }

    pub fn set_flags(&mut self, flags: EffectFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    pub fn add_bonus(&mut self, attribute: Attribute, category: StackingCategory, amount: i32) -> &mut Self {
        self.bonuses.push(Bonus::bonus(attribute, category, amount));
        self
    }

    pub fn add_penalty(&mut self, attribute: Attribute, category: StackingCategory, amount: i32) -> &mut Self {
        self.bonuses.push(Bonus::penalty(attribute, category, amount));
        self
    }

    pub fn add_condition(&mut self, flag: ConditionFlag) -> &mut Self {
        self.conditions.push(flag);
        self
    }

    pub fn add_damage_modifier(&mut self, modifier: DamageModifier) -> &mut Self {
        self.damage_modifiers.push(modifier);
        self
    }

    pub fn add_icon(&mut self, icon: impl Into<String>) -> &mut Self {
        self.icons.push(icon.into());
        self
    }

    pub fn add_animation(&mut self, animation: impl Into<String>) -> &mut Self {
        self.animations.push(animation.into());
        self
    }
}

/// Errors from the effect lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("effect {0} not found")]
    NotFound(EffectId),

    #[error("effect {0} was already applied")]
    NotPending(EffectId),

    #[error("effect target {0} does not exist")]
    MissingTarget(EntityId),

    #[error("unknown effect template '{0}'")]
    UnknownTemplate(String),
}

impl GameError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound(_) | Self::MissingTarget(_) => ErrorSeverity::Recoverable,
            Self::NotPending(_) | Self::UnknownTemplate(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "EFFECT_NOT_FOUND",
            Self::NotPending(_) => "EFFECT_NOT_PENDING",
            Self::MissingTarget(_) => "EFFECT_MISSING_TARGET",
            Self::UnknownTemplate(_) => "EFFECT_UNKNOWN_TEMPLATE",
        }
    }
}
