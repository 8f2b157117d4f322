use strum::{Display, EnumIter};

/// Attributes that effects can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    Attack,
    ArmorClass,
    Damage,
    Initiative,
    ActionPoints,
    MaxHitPoints,
    Fortitude,
    Reflex,
    Will,
    /// Percentage chance that a spell fizzles.
    SpellFailure,
    SpellPower,
    /// Extra dispel attempts per casting.
    DispelAttempts,
}

/// Named bucket governing whether bonuses from different sources add up.
///
/// `Stackable` contributions always sum. Every other category contributes
/// only its strongest bonus and its strongest penalty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackingCategory {
    Stackable,
    Morale,
    Luck,
    Deflection,
    Shield,
    NaturalArmor,
    Enhancement,
    Insight,
    Competence,
    Sacred,
    Profane,
    Circumstance,
}

impl StackingCategory {
    pub const fn stacks(self) -> bool {
        matches!(self, Self::Stackable)
    }
}

/// A single modifier: `magnitude` is positive for bonuses and negative for penalties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bonus {
    pub attribute: Attribute,
    pub category: StackingCategory,
    pub magnitude: i32,
}

impl Bonus {
    /// Bonus of `amount` (sign is normalized to positive).
    pub fn bonus(attribute: Attribute, category: StackingCategory, amount: i32) -> Self {
        Self {
            attribute,
            category,
            magnitude: amount.saturating_abs(),
        }
    }

    /// Penalty of `amount` (sign is normalized to negative).
    pub fn penalty(attribute: Attribute, category: StackingCategory, amount: i32) -> Self {
        Self {
            attribute,
            category,
            magnitude: -amount.saturating_abs(),
        }
    }

    pub fn is_penalty(&self) -> bool {
        self.magnitude < 0
    }
}
