use crate::ledger::BonusLedger;
use crate::state::{EffectId, EntityId};

/// An item that can carry effects (weapon enchantments, blessed armor).
///
/// Items have their own ledger; its entries join the wielder's stacking pool
/// while the item is equipped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub id: EntityId,
    pub name: String,
    pub effects: Vec<EffectId>,
    pub ledger: BonusLedger,
}

impl Item {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            effects: Vec::new(),
            ledger: BonusLedger::new(),
        }
    }
}
