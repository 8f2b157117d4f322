//! Factions, relationships and encounter grouping.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactionId(pub u16);

/// How one creature regards another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relationship {
    Friendly,
    Hostile,
    Neutral,
}

/// Symmetric faction relationship table.
///
/// A faction is always friendly to itself. Pairs not listed are neutral.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactionTable {
    pairs: BTreeMap<(FactionId, FactionId), Relationship>,
}

impl FactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn set(&mut self, a: FactionId, b: FactionId, relationship: Relationship) {
        if a == b {
            return;
        }
        self.pairs.insert(Self::key(a, b), relationship);
    }

    pub fn relationship(&self, a: FactionId, b: FactionId) -> Relationship {
        if a == b {
            return Relationship::Friendly;
        }
        self.pairs
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(Relationship::Neutral)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterId(pub u32);

/// A group of creatures that wake up together.
///
/// Members of an encounter that has not yet detected a hostile stay dormant
/// and skip their turns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encounter {
    pub id: EncounterId,
    pub members: BTreeSet<EntityId>,
    pub alerted: bool,
}

impl Encounter {
    pub fn new(id: EncounterId) -> Self {
        Self {
            id,
            members: BTreeSet::new(),
            alerted: false,
        }
    }
}
