use arrayvec::ArrayVec;

use crate::ability::Slot;
use crate::config::GameConfig;
use crate::ledger::{BonusLedger, DamageType};
use crate::state::{EffectId, EncounterId, EntityId, FactionId, Marks, Position, ResourceMeter};

/// Who decides this creature's turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Controller {
    Player,
    #[default]
    Ai,
}

/// Per-turn action point budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionPoints {
    pub current: u32,
    pub maximum: u32,
}

impl ActionPoints {
    pub const fn full(maximum: u32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.current >= cost
    }

    /// Deducts `cost`. Returns `false` (leaving the budget untouched) if it cannot be paid.
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= cost;
        true
    }

    pub fn refund(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.maximum);
    }

    pub fn refill(&mut self) {
        self.current = self.maximum;
    }

    pub fn is_exhausted(&self) -> bool {
        self.current == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponKind {
    #[default]
    Melee,
    Ranged,
}

/// What a creature's basic attack looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponProfile {
    pub kind: WeaponKind,
    /// Preferred engagement range in tiles.
    pub range: u32,
    /// Damage die size; a hit deals 1..=damage_die.
    pub damage_die: u32,
    pub damage_type: DamageType,
}

impl WeaponProfile {
    pub const fn melee(damage_die: u32) -> Self {
        Self {
            kind: WeaponKind::Melee,
            range: 1,
            damage_die,
            damage_type: DamageType::Physical,
        }
    }

    pub const fn ranged(range: u32, damage_die: u32) -> Self {
        Self {
            kind: WeaponKind::Ranged,
            range,
            damage_die,
            damage_type: DamageType::Physical,
        }
    }

    pub fn is_melee(&self) -> bool {
        self.kind == WeaponKind::Melee
    }
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self::melee(4)
    }
}

/// Numbers the dispel and save formulas read from a spellcaster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CasterProfile {
    pub spell_level: i32,
    /// Modifier of the casting attribute.
    pub attribute: i32,
}

/// A creature in the world. Dead creatures stay in the world until explicitly removed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Creature {
    pub id: EntityId,
    pub name: String,
    pub faction: FactionId,
    pub position: Position,
    pub hp: ResourceMeter,
    pub dead: bool,
    /// Applied effects in application order.
    pub effects: Vec<EffectId>,
    pub slots: ArrayVec<Slot, { GameConfig::MAX_SLOTS }>,
    pub ap: ActionPoints,
    pub ledger: BonusLedger,
    pub encounter: Option<EncounterId>,
    pub weapon: WeaponProfile,
    pub caster: CasterProfile,
    pub controller: Controller,
    pub equipped: Option<EntityId>,
    pub marks: Marks,
    pub initiative: i32,
}

impl Creature {
    pub fn new(id: EntityId, name: impl Into<String>, faction: FactionId, position: Position, max_hp: i32) -> Self {
        Self {
            id,
            name: name.into(),
            faction,
            position,
            hp: ResourceMeter::full(max_hp),
            dead: false,
            effects: Vec::new(),
            slots: ArrayVec::new(),
            ap: ActionPoints::full(GameConfig::DEFAULT_ACTION_POINTS),
            ledger: BonusLedger::new(),
            encounter: None,
            weapon: WeaponProfile::default(),
            caster: CasterProfile::default(),
            controller: Controller::Ai,
            equipped: None,
            marks: Marks::new(),
            initiative: 0,
        }
    }

    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapon = weapon;
        self
    }

    pub fn with_caster(mut self, spell_level: i32, attribute: i32) -> Self {
        self.caster = CasterProfile {
            spell_level,
            attribute,
        };
        self
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_action_points(mut self, maximum: u32) -> Self {
        self.ap = ActionPoints::full(maximum);
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    pub fn with_encounter(mut self, encounter: EncounterId) -> Self {
        self.encounter = Some(encounter);
        self
    }

    /// Binds an ability to a new slot. Returns the slot index, or `None` when full.
    pub fn add_slot(&mut self, ability: impl Into<String>) -> Option<usize> {
        let index = self.slots.len();
        self.slots.try_push(Slot::new(ability)).ok()?;
        Some(index)
    }

    pub fn slot_index(&self, ability: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.ability == ability)
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }
}
