use std::fmt;

use super::TargeterId;
use crate::state::EntityId;

/// Addresses one slot on one creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotRef {
    pub owner: EntityId,
    pub index: usize,
}

impl SlotRef {
    pub const fn new(owner: EntityId, index: usize) -> Self {
        Self { owner, index }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotState {
    #[default]
    Inactive,
    Targeting(TargeterId),
    Resolving,
    /// Resolved with a duration; counts `active_rounds_left` down.
    Active,
}

/// An ability bound to a creature.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    pub ability: String,
    pub state: SlotState,
    pub cooldown_left: u32,
    pub active_rounds_left: u32,
}

impl Slot {
    pub fn new(ability: impl Into<String>) -> Self {
        Self {
            ability: ability.into(),
            state: SlotState::Inactive,
            cooldown_left: 0,
            active_rounds_left: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SlotState::Active
    }

    pub fn is_idle(&self) -> bool {
        self.state == SlotState::Inactive
    }
}
