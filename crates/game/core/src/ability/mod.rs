//! Abilities, the slots that bind them to creatures, and targeters.
//!
//! An [`Ability`] is static content: an [`AbilityDefinition`] (costs, range,
//! targeting, AI hints) plus an [`AbilityBehavior`] made of optional
//! capability hooks. A [`Slot`] on a creature tracks the runtime state of one
//! ability. Activation drives the slot through
//!
//! ```text
//! Inactive -> Targeting -> Resolving -> Active (optional) -> Inactive
//! ```
//!
//! with the engine operations in `activation`.
mod activation;
mod checks;
mod slot;
mod targeter;

pub use activation::{Activation, SelectOutcome};
pub use checks::SaveKind;
pub use slot::{Slot, SlotRef, SlotState};
pub use targeter::{TargetSelection, Targeter, TargeterId};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::engine::GameEngine;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{EntityId, Position, Relationship, WeaponKind};

/// Broad purpose of an ability, used by the AI to filter candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionType {
    Buff,
    Debuff,
    Damage,
    Summon,
    Heal,
    Defensive,
    Utility,
}

/// Engagement distance of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeBand {
    #[default]
    SelfOnly,
    Touch,
    Short,
    Long,
}

impl RangeBand {
    pub const fn tiles(self) -> u32 {
        match self {
            Self::SelfOnly => 0,
            Self::Touch => 1,
            Self::Short => 2,
            Self::Long => 6,
        }
    }
}

bitflags! {
    /// Which relationships a targeter accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct RelationshipMask: u8 {
        const SELF = 1 << 0;
        const FRIENDLY = 1 << 1;
        const HOSTILE = 1 << 2;
        const NEUTRAL = 1 << 3;
    }
}

impl RelationshipMask {
    pub const ALLIES: Self = Self::SELF.union(Self::FRIENDLY);
    pub const OTHERS: Self = Self::FRIENDLY.union(Self::HOSTILE).union(Self::NEUTRAL);

    pub fn accepts(self, is_self: bool, relationship: Relationship) -> bool {
        if is_self {
            return self.contains(Self::SELF);
        }
        match relationship {
            Relationship::Friendly => self.contains(Self::FRIENDLY),
            Relationship::Hostile => self.contains(Self::HOSTILE),
            Relationship::Neutral => self.contains(Self::NEUTRAL),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargeterShape {
    /// No selection: the caster is the only target.
    SelfOnly,
    /// Explicit creature picks.
    List,
    /// Every eligible creature within `radius` of a chosen point.
    Circle { radius: u32 },
    /// Eligible creatures in a cone from the caster toward a chosen point.
    Cone { length: u32, half_angle_deg: f32 },
    /// Eligible creatures on a one-tile-wide line from the caster toward a point.
    Line { length: u32 },
}

impl TargeterShape {
    pub fn is_area(&self) -> bool {
        matches!(self, Self::Circle { .. } | Self::Cone { .. } | Self::Line { .. })
    }

    /// How far past the point range an affected creature can stand.
    pub fn extent(&self) -> u32 {
        match self {
            Self::SelfOnly | Self::List => 0,
            Self::Circle { radius } => *radius,
            Self::Cone { length, .. } | Self::Line { length } => *length,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    Single,
    /// Up to `max` picks; the same creature may be picked more than once.
    Multi { max: u8 },
    /// Exactly `count` distinct creatures.
    UniqueRequired { count: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetingSpec {
    pub shape: TargeterShape,
    pub relationship: RelationshipMask,
    pub min_range: u32,
    pub mode: SelectionMode,
}

impl TargetingSpec {
    pub const fn self_only() -> Self {
        Self {
            shape: TargeterShape::SelfOnly,
            relationship: RelationshipMask::SELF,
            min_range: 0,
            mode: SelectionMode::Single,
        }
    }

    pub const fn list(relationship: RelationshipMask, mode: SelectionMode) -> Self {
        Self {
            shape: TargeterShape::List,
            relationship,
            min_range: 0,
            mode,
        }
    }

    pub const fn area(shape: TargeterShape, relationship: RelationshipMask) -> Self {
        Self {
            shape,
            relationship,
            min_range: 0,
            mode: SelectionMode::Single,
        }
    }

    pub const fn with_min_range(mut self, min_range: u32) -> Self {
        self.min_range = min_range;
        self
    }
}

impl Default for TargetingSpec {
    fn default() -> Self {
        Self::self_only()
    }
}

/// Hints for the tactical overrides of the turn planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AiTag {
    TotalDefense,
    Dispel,
    Renewal,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDefinition {
    pub id: String,
    pub name: String,
    pub action_type: ActionType,
    pub ap_cost: u32,
    pub cooldown_rounds: u32,
    /// Rounds the slot stays active after resolving. `None` for instant abilities.
    pub active_rounds: Option<u32>,
    pub range: RangeBand,
    pub spell_level: i32,
    pub is_spell: bool,
    pub requires_weapon: Option<WeaponKind>,
    pub targeting: TargetingSpec,
    pub ai_priority: i32,
    pub ai_tags: Vec<AiTag>,
}

impl AbilityDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            action_type,
            ap_cost: 3,
            cooldown_rounds: 0,
            active_rounds: None,
            range: RangeBand::SelfOnly,
            spell_level: 0,
            is_spell: false,
            requires_weapon: None,
            targeting: TargetingSpec::self_only(),
            ai_priority: 0,
            ai_tags: Vec::new(),
        }
    }

    pub fn with_ap_cost(mut self, ap_cost: u32) -> Self {
        self.ap_cost = ap_cost;
        self
    }

    pub fn with_cooldown(mut self, rounds: u32) -> Self {
        self.cooldown_rounds = rounds;
        self
    }

    pub fn with_active_rounds(mut self, rounds: u32) -> Self {
        self.active_rounds = Some(rounds);
        self
    }

    pub fn with_range(mut self, range: RangeBand) -> Self {
        self.range = range;
        self
    }

    /// Marks the ability as a spell of the given level.
    pub fn spell(mut self, level: i32) -> Self {
        self.spell_level = level;
        self.is_spell = true;
        self
    }

    pub fn with_weapon(mut self, kind: WeaponKind) -> Self {
        self.requires_weapon = Some(kind);
        self
    }

    pub fn with_targeting(mut self, targeting: TargetingSpec) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_ai_priority(mut self, priority: i32) -> Self {
        self.ai_priority = priority;
        self
    }

    pub fn with_ai_tag(mut self, tag: AiTag) -> Self {
        self.ai_tags.push(tag);
        self
    }

    pub fn has_tag(&self, tag: AiTag) -> bool {
        self.ai_tags.contains(&tag)
    }
}

/// Extra activation precondition beyond the engine's AP/weapon/state checks.
pub trait ActivationGate: Send + Sync {
    fn can_activate(&self, engine: &GameEngine, slot: SlotRef) -> bool;
}

/// Prunes candidate targets when a targeter is built.
pub trait TargetValidator: Send + Sync {
    fn is_target_valid(&self, engine: &GameEngine, slot: SlotRef, target: EntityId) -> bool;
}

/// Planner-side check on where the ability would land.
pub trait AiTargetCheck: Send + Sync {
    fn ai_check_target_valid(&self, engine: &GameEngine, slot: SlotRef, target: Position) -> bool;
}

/// Runs once activation has been paid for, before targeting starts.
pub trait ActivationHandler: Send + Sync {
    fn on_activate(&self, engine: &mut GameEngine, slot: SlotRef);
}

/// Commits the ability against the final selection. Called exactly once per activation.
pub trait TargetResolver: Send + Sync {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection);
}

pub trait ToggleHandler: Send + Sync {
    fn on_deactivate(&self, _engine: &mut GameEngine, _slot: SlotRef) {}

    fn on_reactivate(&self, _engine: &mut GameEngine, _slot: SlotRef) {}
}

#[derive(Clone, Default)]
pub struct AbilityBehavior {
    pub gate: Option<Arc<dyn ActivationGate>>,
    pub validator: Option<Arc<dyn TargetValidator>>,
    pub ai_check: Option<Arc<dyn AiTargetCheck>>,
    pub on_activate: Option<Arc<dyn ActivationHandler>>,
    pub resolver: Option<Arc<dyn TargetResolver>>,
    pub toggle: Option<Arc<dyn ToggleHandler>>,
}

impl AbilityBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(mut self, gate: Arc<dyn ActivationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn TargetValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_ai_check(mut self, check: Arc<dyn AiTargetCheck>) -> Self {
        self.ai_check = Some(check);
        self
    }

    pub fn with_activate(mut self, handler: Arc<dyn ActivationHandler>) -> Self {
        self.on_activate = Some(handler);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TargetResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_toggle(mut self, toggle: Arc<dyn ToggleHandler>) -> Self {
        self.toggle = Some(toggle);
        self
    }
}

impl fmt::Debug for AbilityBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityBehavior")
            .field("gate", &self.gate.is_some())
            .field("validator", &self.validator.is_some())
            .field("ai_check", &self.ai_check.is_some())
            .field("on_activate", &self.on_activate.is_some())
            .field("resolver", &self.resolver.is_some())
            .field("toggle", &self.toggle.is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Ability {
    pub definition: AbilityDefinition,
    pub behavior: AbilityBehavior,
}

impl Ability {
    pub fn new(definition: AbilityDefinition, behavior: AbilityBehavior) -> Self {
        Self {
            definition,
            behavior,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }
}

/// Abilities keyed by id.
#[derive(Clone, Debug, Default)]
pub struct AbilityRegistry {
    abilities: BTreeMap<String, Ability>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an ability, replacing any previous one with the same id.
    pub fn register(&mut self, ability: Ability) {
        self.abilities.insert(ability.definition.id.clone(), ability);
    }

    pub fn get(&self, id: &str) -> Option<&Ability> {
        self.abilities.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Ability> {
        self.abilities.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.values()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

/// Why a slot cannot be activated right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActivationBlock {
    #[error("caster is dead")]
    Dead,
    #[error("caster cannot act")]
    Incapacitated,
    #[error("caster is silenced")]
    Silenced,
    #[error("slot is already active")]
    AlreadyActive,
    #[error("slot is not active")]
    NotActive,
    #[error("slot is mid-activation")]
    Busy,
    #[error("on cooldown for {0} more rounds")]
    OnCooldown(u32),
    #[error("need {needed} AP, have {available}")]
    InsufficientAp { needed: u32, available: u32 },
    #[error("wrong weapon equipped")]
    WrongWeapon,
    #[error("refused by ability content")]
    ContentRefused,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AbilityError {
    #[error("creature {0} not found")]
    UnknownCreature(EntityId),

    #[error("slot {0} not found")]
    UnknownSlot(SlotRef),

    #[error("ability '{0}' is not registered")]
    UnknownAbility(String),

    #[error("slot {slot} cannot activate: {reason}")]
    Blocked { slot: SlotRef, reason: ActivationBlock },

    #[error("slot {0} has no valid targets")]
    NoValidTargets(SlotRef),
}

impl GameError for AbilityError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownCreature(_) | Self::UnknownSlot(_) => ErrorSeverity::Validation,
            Self::UnknownAbility(_) => ErrorSeverity::Internal,
            Self::Blocked { .. } | Self::NoValidTargets(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCreature(_) => "ABILITY_UNKNOWN_CREATURE",
            Self::UnknownSlot(_) => "ABILITY_UNKNOWN_SLOT",
            Self::UnknownAbility(_) => "ABILITY_UNKNOWN_ABILITY",
            Self::Blocked { .. } => "ABILITY_BLOCKED",
            Self::NoValidTargets(_) => "ABILITY_NO_VALID_TARGETS",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TargetingError {
    #[error("targeter {0} is not open")]
    UnknownTargeter(TargeterId),

    #[error("creature {0} is not a valid target")]
    InvalidTarget(EntityId),

    #[error("{0} is out of range")]
    OutOfRange(Position),

    #[error("creature {0} is already selected")]
    AlreadySelected(EntityId),

    #[error("selection needs {needed} targets, has {selected}")]
    SelectionIncomplete { needed: usize, selected: usize },

    #[error("targeter does not accept this kind of selection")]
    WrongShape,

    #[error("no eligible creatures in the area at {0}")]
    NoTargetsInArea(Position),
}

impl GameError for TargetingError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownTargeter(_) | Self::WrongShape => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTargeter(_) => "TARGETING_UNKNOWN_TARGETER",
            Self::InvalidTarget(_) => "TARGETING_INVALID_TARGET",
            Self::OutOfRange(_) => "TARGETING_OUT_OF_RANGE",
            Self::AlreadySelected(_) => "TARGETING_ALREADY_SELECTED",
            Self::SelectionIncomplete { .. } => "TARGETING_SELECTION_INCOMPLETE",
            Self::WrongShape => "TARGETING_WRONG_SHAPE",
            Self::NoTargetsInArea(_) => "TARGETING_NO_TARGETS_IN_AREA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_mask_distinguishes_self() {
        let allies = RelationshipMask::ALLIES;
        assert!(allies.accepts(true, Relationship::Friendly));
        assert!(allies.accepts(false, Relationship::Friendly));
        assert!(!allies.accepts(false, Relationship::Hostile));

        let others = RelationshipMask::OTHERS;
        assert!(!others.accepts(true, Relationship::Friendly));
        assert!(others.accepts(false, Relationship::Neutral));
    }

    #[test]
    fn range_bands_map_to_tiles() {
        assert_eq!(RangeBand::SelfOnly.tiles(), 0);
        assert_eq!(RangeBand::Touch.tiles(), 1);
        assert_eq!(RangeBand::Short.tiles(), 2);
        assert_eq!(RangeBand::Long.tiles(), 6);
    }

    #[test]
    fn registry_replaces_same_id() {
        let mut registry = AbilityRegistry::new();
        registry.register(Ability::new(
            AbilityDefinition::new("bless", "Bless", ActionType::Buff),
            AbilityBehavior::new(),
        ));
        registry.register(Ability::new(
            AbilityDefinition::new("bless", "Bless", ActionType::Buff).with_ap_cost(2),
            AbilityBehavior::new(),
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("bless").map(|a| a.definition.ap_cost), Some(2));
    }
}
