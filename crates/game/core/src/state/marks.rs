//! Typed per-entity state.
//!
//! Content often needs small pieces of persistent state attached to a
//! creature: "this once-per-encounter ability was already used", "this
//! creature was summoned". Rather than free-form string keys, marks are a
//! closed enum with an explicit lifetime scope.

use std::collections::BTreeMap;

/// How long a mark survives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkScope {
    /// Cleared when the creature's encounter ends.
    Encounter,
    /// Survives encounters.
    Campaign,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mark {
    /// At-most-once guard for an ability id.
    AbilityUsed(String),
    /// Creature was brought in by the named summoner.
    SummonedBy(crate::state::EntityId),
    /// Creature has dropped below half its hit points.
    Bloodied,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marks {
    entries: BTreeMap<Mark, MarkScope>,
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, mark: &Mark) -> bool {
        self.entries.contains_key(mark)
    }

    /// Sets a mark. Returns `false` if it was already present (scope is left untouched).
    pub fn set(&mut self, mark: Mark, scope: MarkScope) -> bool {
        if self.entries.contains_key(&mark) {
            return false;
        }
        self.entries.insert(mark, scope);
        true
    }

    pub fn clear(&mut self, mark: &Mark) -> bool {
        self.entries.remove(mark).is_some()
    }

    /// Drops every mark with the given scope.
    pub fn clear_scope(&mut self, scope: MarkScope) {
        self.entries.retain(|_, s| *s != scope);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_at_most_once() {
        let mut marks = Marks::new();
        let used = Mark::AbilityUsed("summon_wolf".into());
        assert!(marks.set(used.clone(), MarkScope::Encounter));
        assert!(!marks.set(used.clone(), MarkScope::Campaign));
        assert!(marks.has(&used));
    }

    #[test]
    fn clear_scope_keeps_other_scopes() {
        let mut marks = Marks::new();
        marks.set(Mark::Bloodied, MarkScope::Encounter);
        marks.set(Mark::AbilityUsed("x".into()), MarkScope::Campaign);
        marks.clear_scope(MarkScope::Encounter);
        assert!(!marks.has(&Mark::Bloodied));
        assert_eq!(marks.len(), 1);
    }
}
