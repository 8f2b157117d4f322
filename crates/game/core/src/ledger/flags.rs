use strum::{Display, EnumIter};

/// Boolean conditions carried by a ledger.
///
/// Immunity flags block the conditions they protect against, see
/// [`ConditionFlag::blocked_by`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionFlag {
    Immobilized,
    Helpless,
    Hidden,
    Stunned,
    Blinded,
    Silenced,
    ImmobilizationImmunity,
    StunImmunity,
    BlindnessImmunity,
}

impl ConditionFlag {
    /// The immunity that prevents this condition, if one exists.
    pub const fn blocked_by(self) -> Option<ConditionFlag> {
        match self {
            Self::Immobilized | Self::Helpless => Some(Self::ImmobilizationImmunity),
            Self::Stunned => Some(Self::StunImmunity),
            Self::Blinded => Some(Self::BlindnessImmunity),
            _ => None,
        }
    }

    pub const fn is_immunity(self) -> bool {
        matches!(
            self,
            Self::ImmobilizationImmunity | Self::StunImmunity | Self::BlindnessImmunity
        )
    }

    /// Conditions that stop a creature from acting on its turn.
    pub const fn prevents_action(self) -> bool {
        matches!(self, Self::Helpless | Self::Stunned)
    }
}
