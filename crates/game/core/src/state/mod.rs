//! World state: creatures, items, encounters and the faction table.
//!
//! [`GameState`] is plain data. Rules that keep its invariants (effect lists
//! mirrored in ledgers, aura bookkeeping) live on [`crate::engine::GameEngine`].
mod common;
mod creature;
mod encounter;
mod item;
mod marks;

pub use common::{EffectId, EntityId, Position, ResourceMeter};
pub use creature::{ActionPoints, CasterProfile, Controller, Creature, WeaponKind, WeaponProfile};
pub use encounter::{Encounter, EncounterId, FactionId, FactionTable, Relationship};
pub use item::Item;
pub use marks::{Mark, MarkScope, Marks};

use std::collections::BTreeMap;

use crate::ledger::{Attribute, BonusLedger};

/// Holds every entity the engine knows about.
///
/// Maps are ordered by id so iteration (round ticks, aura scans, AI queries)
/// is deterministic.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub creatures: BTreeMap<EntityId, Creature>,
    pub items: BTreeMap<EntityId, Item>,
    pub encounters: BTreeMap<EncounterId, Encounter>,
    pub factions: FactionTable,
    next_entity: u32,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh entity id.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    /// Inserts a creature, registering it with its encounter if any.
    ///
    /// The creature's id must come from [`Self::allocate_id`] (or be unique).
    pub fn insert_creature(&mut self, creature: Creature) -> EntityId {
        let id = creature.id;
        self.next_entity = self.next_entity.max(id.0.saturating_add(1));
        if let Some(encounter) = creature.encounter {
            self.encounters
                .entry(encounter)
                .or_insert_with(|| Encounter::new(encounter))
                .members
                .insert(id);
        }
        self.creatures.insert(id, creature);
        id
    }

    pub fn insert_item(&mut self, item: Item) -> EntityId {
        let id = item.id;
        self.next_entity = self.next_entity.max(id.0.saturating_add(1));
        self.items.insert(id, item);
        id
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: EntityId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn encounter(&self, id: EncounterId) -> Option<&Encounter> {
        self.encounters.get(&id)
    }

    pub fn encounter_mut(&mut self, id: EncounterId) -> Option<&mut Encounter> {
        self.encounters.get_mut(&id)
    }

    /// Resolved `attribute` for a creature, its equipped item's entries pooled
    /// with its own under one set of stacking rules. Unknown ids resolve to 0.
    pub fn attribute(&self, id: EntityId, attribute: Attribute) -> i32 {
        let Some(creature) = self.creature(id) else {
            return 0;
        };
        let item = creature
            .equipped
            .and_then(|item| self.item(item))
            .map(|item| item.ledger.entries())
            .unwrap_or_default();
        BonusLedger::resolve(attribute, creature.ledger.entries().iter().chain(item))
    }

    /// Maximum hit points including every pooled bonus, never below 1.
    pub fn max_hp(&self, id: EntityId) -> i32 {
        self.creature(id).map_or(1, |c| {
            c.hp.maximum
                .saturating_add(self.attribute(id, Attribute::MaxHitPoints))
                .max(1)
        })
    }

    pub fn hp_fraction(&self, id: EntityId) -> f32 {
        self.creature(id)
            .map_or(0.0, |c| c.hp.current.max(0) as f32 / self.max_hp(id) as f32)
    }

    /// How `observer` regards `other`. Unknown ids are neutral; a creature is friendly to itself.
    pub fn relationship(&self, observer: EntityId, other: EntityId) -> Relationship {
        if observer == other {
            return Relationship::Friendly;
        }
        match (self.creature(observer), self.creature(other)) {
            (Some(a), Some(b)) => self.factions.relationship(a.faction, b.faction),
            _ => Relationship::Neutral,
        }
    }

    /// Living creatures within `range` tiles of `center`, ordered by id.
    pub fn creatures_within(&self, center: Position, range: u32) -> impl Iterator<Item = &Creature> {
        self.creatures
            .values()
            .filter(move |c| c.is_alive() && c.position.distance(center) <= range)
    }

    /// Living creatures `observer` regards with `relationship`, excluding itself.
    pub fn creatures_by_relationship(
        &self,
        observer: EntityId,
        relationship: Relationship,
    ) -> impl Iterator<Item = &Creature> {
        self.creatures.values().filter(move |c| {
            c.id != observer && c.is_alive() && self.relationship(observer, c.id) == relationship
        })
    }

    /// Returns the creature standing on `position`, if any living one does.
    pub fn occupant(&self, position: Position) -> Option<EntityId> {
        self.creatures
            .values()
            .find(|c| c.is_alive() && c.position == position)
            .map(|c| c.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creature_joins_encounter() {
        let mut state = GameState::new();
        let id = state.allocate_id();
        let creature = Creature::new(id, "goblin", FactionId(2), Position::ORIGIN, 8)
            .with_encounter(EncounterId(7));
        state.insert_creature(creature);

        let encounter = state.encounter(EncounterId(7)).expect("encounter created");
        assert!(encounter.members.contains(&id));
        assert!(!encounter.alerted);
        assert_ne!(state.allocate_id(), id);
    }

    #[test]
    fn relationship_uses_faction_table() {
        let mut state = GameState::new();
        state
            .factions
            .set(FactionId(1), FactionId(2), Relationship::Hostile);
        let a = state.insert_creature(Creature::new(EntityId(0), "a", FactionId(1), Position::ORIGIN, 10));
        let b = state.insert_creature(Creature::new(EntityId(1), "b", FactionId(2), Position::new(1, 0), 10));
        let c = state.insert_creature(Creature::new(EntityId(2), "c", FactionId(1), Position::new(2, 0), 10));

        assert_eq!(state.relationship(a, b), Relationship::Hostile);
        assert_eq!(state.relationship(a, c), Relationship::Friendly);
        assert_eq!(state.creatures_by_relationship(a, Relationship::Hostile).count(), 1);
        assert_eq!(state.creatures_within(Position::ORIGIN, 1).count(), 2);
    }
}
