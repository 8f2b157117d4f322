//! Stacking-aware modifier storage attached to a creature or item.
//!
//! Every entry records the effect that contributed it, so removing an effect
//! releases exactly what it added.
//!
//! # Resolution
//!
//! For a queried attribute:
//! 1. Sum every `Stackable` contribution
//! 2. For each other category, take the single highest bonus and the single
//!    most negative penalty
//! 3. Add the category results together
//!
//! Two morale bonuses of +2 and +3 resolve to +3. Two stackable bonuses of +2
//! and +3 resolve to +5. A morale +3 alongside a morale -2 resolves to +1.
mod bonus;
mod damage;
mod flags;

pub use bonus::{Attribute, Bonus, StackingCategory};
pub use damage::{DamageLedger, DamageModifier, DamageModifierKind, DamageType};
pub use flags::ConditionFlag;

use std::collections::{BTreeMap, BTreeSet};

use crate::state::EffectId;

/// A ledger entry: one modifier and the effect that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerEntry {
    pub source: EffectId,
    pub bonus: Bonus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusLedger {
    entries: Vec<LedgerEntry>,
    flags: BTreeMap<ConditionFlag, BTreeSet<EffectId>>,
    damage: DamageLedger,
}

impl BonusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: EffectId, bonus: Bonus) {
        if bonus.magnitude == 0 {
            return;
        }
        self.entries.push(LedgerEntry { source, bonus });
    }

    pub fn add_bonus(
        &mut self,
        source: EffectId,
        attribute: Attribute,
        category: StackingCategory,
        amount: i32,
    ) {
        self.insert(source, Bonus::bonus(attribute, category, amount));
    }

    pub fn add_penalty(
        &mut self,
        source: EffectId,
        attribute: Attribute,
        category: StackingCategory,
        amount: i32,
    ) {
        self.insert(source, Bonus::penalty(attribute, category, amount));
    }

    /// Resolved value of `attribute` under the stacking rules.
    pub fn bonus_of_type(&self, attribute: Attribute) -> i32 {
        Self::resolve(attribute, &self.entries)
    }

    /// Resolves `attribute` over an arbitrary pool of entries.
    ///
    /// Entries drawn from several ledgers (a creature and its equipped item)
    /// compete as one pool: only the strongest non-stacking bonus and penalty
    /// per category count.
    pub fn resolve<'a>(attribute: Attribute, entries: impl IntoIterator<Item = &'a LedgerEntry>) -> i32 {
        let mut stackable = 0i32;
        // (strongest bonus, strongest penalty) per non-stacking category
        let mut best: BTreeMap<StackingCategory, (i32, i32)> = BTreeMap::new();

        for entry in entries.into_iter().filter(|e| e.bonus.attribute == attribute) {
            let Bonus {
                category,
                magnitude,
                ..
            } = entry.bonus;
            if category.stacks() {
                stackable = stackable.saturating_add(magnitude);
                continue;
            }
            let slot = best.entry(category).or_insert((0, 0));
            if magnitude > 0 {
                slot.0 = slot.0.max(magnitude);
            } else {
                slot.1 = slot.1.min(magnitude);
            }
        }

        best.values()
            .fold(stackable, |acc, (bonus, penalty)| acc.saturating_add(bonus + penalty))
    }

    /// Grants `flag` on behalf of `source`.
    ///
    /// Returns `false` without recording anything when an immunity blocks the condition.
    pub fn grant_flag(&mut self, source: EffectId, flag: ConditionFlag) -> bool {
        if let Some(immunity) = flag.blocked_by() {
            if self.raw_has(immunity) {
                return false;
            }
        }
        self.flags.entry(flag).or_default().insert(source);
        true
    }

    fn raw_has(&self, flag: ConditionFlag) -> bool {
        self.flags.get(&flag).is_some_and(|sources| !sources.is_empty())
    }

    /// True when some effect grants `flag` and no immunity suppresses it.
    pub fn has(&self, flag: ConditionFlag) -> bool {
        if !self.raw_has(flag) {
            return false;
        }
        match flag.blocked_by() {
            Some(immunity) => !self.raw_has(immunity),
            None => true,
        }
    }

    /// True when an active condition keeps the bearer from acting.
    pub fn prevents_action(&self) -> bool {
        self.flags
            .keys()
            .any(|flag| flag.prevents_action() && self.has(*flag))
    }

    /// Removes every penalty in `category`. Returns how many entries were dropped.
    pub fn remove_effect_penalties_of_type(&mut self, category: StackingCategory) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.bonus.category == category && e.bonus.is_penalty()));
        before - self.entries.len()
    }

    /// Shrinks every penalty on `attribute` toward zero by `amount`.
    ///
    /// Penalties that reach zero are dropped. Returns the total magnitude removed.
    pub fn reduce_penalties_of_type_by_amount(&mut self, attribute: Attribute, amount: i32) -> i32 {
        let amount = amount.max(0);
        let mut removed = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.bonus.attribute == attribute && e.bonus.is_penalty())
        {
            let reduced = (entry.bonus.magnitude + amount).min(0);
            removed += reduced - entry.bonus.magnitude;
            entry.bonus.magnitude = reduced;
        }
        self.entries.retain(|e| e.bonus.magnitude != 0);
        removed
    }

    pub fn damage(&self) -> &DamageLedger {
        &self.damage
    }

    pub fn add_damage_modifier(&mut self, source: EffectId, modifier: DamageModifier) {
        self.damage.insert(source, modifier);
    }

    /// Drops every bonus, flag and damage modifier contributed by `source`.
    pub fn release(&mut self, source: EffectId) {
        self.entries.retain(|e| e.source != source);
        for sources in self.flags.values_mut() {
            sources.remove(&source);
        }
        self.flags.retain(|_, sources| !sources.is_empty());
        self.damage.release(source);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Attribute::*;
    use StackingCategory::*;

    #[test]
    fn stackable_sums_and_categories_keep_strongest() {
        let mut ledger = BonusLedger::new();
        ledger.add_bonus(EffectId(1), Attack, Stackable, 2);
        ledger.add_bonus(EffectId(2), Attack, Stackable, 3);
        ledger.add_bonus(EffectId(3), Attack, Morale, 2);
        ledger.add_bonus(EffectId(4), Attack, Morale, 4);
        ledger.add_bonus(EffectId(5), Attack, Luck, 1);

        assert_eq!(ledger.bonus_of_type(Attack), 2 + 3 + 4 + 1);
        assert_eq!(ledger.bonus_of_type(ArmorClass), 0);
    }

    #[test]
    fn category_bonus_and_penalty_both_count() {
        let mut ledger = BonusLedger::new();
        ledger.add_bonus(EffectId(1), Attack, Morale, 3);
        ledger.add_penalty(EffectId(2), Attack, Morale, 2);
        ledger.add_penalty(EffectId(3), Attack, Morale, 5);

        assert_eq!(ledger.bonus_of_type(Attack), 3 - 5);
    }

    #[test]
    fn pooled_entries_share_one_category_slot() {
        let mut wielder = BonusLedger::new();
        wielder.add_bonus(EffectId(1), Attack, Morale, 3);
        wielder.add_bonus(EffectId(2), Attack, Stackable, 1);
        let mut sword = BonusLedger::new();
        sword.add_bonus(EffectId(3), Attack, Morale, 2);
        sword.add_bonus(EffectId(4), Attack, Stackable, 1);

        let pooled = BonusLedger::resolve(Attack, wielder.entries().iter().chain(sword.entries()));
        assert_eq!(pooled, 3 + 1 + 1);
    }

    #[test]
    fn same_source_same_category_keeps_higher_magnitude() {
        let mut ledger = BonusLedger::new();
        ledger.add_bonus(EffectId(1), ArmorClass, Deflection, 2);
        ledger.add_bonus(EffectId(1), ArmorClass, Deflection, 3);
        assert_eq!(ledger.bonus_of_type(ArmorClass), 3);
    }

    #[test]
    fn release_removes_only_that_source() {
        let mut ledger = BonusLedger::new();
        ledger.add_bonus(EffectId(1), Attack, Stackable, 10);
        ledger.add_bonus(EffectId(2), Attack, Morale, 20);
        ledger.grant_flag(EffectId(1), ConditionFlag::Hidden);

        ledger.release(EffectId(1));
        assert_eq!(ledger.bonus_of_type(Attack), 20);
        assert!(!ledger.has(ConditionFlag::Hidden));
    }

    #[test]
    fn immunity_blocks_condition() {
        let mut ledger = BonusLedger::new();
        assert!(ledger.grant_flag(EffectId(1), ConditionFlag::ImmobilizationImmunity));
        assert!(!ledger.grant_flag(EffectId(2), ConditionFlag::Immobilized));
        assert!(!ledger.has(ConditionFlag::Immobilized));
    }

    #[test]
    fn later_immunity_suppresses_existing_condition() {
        let mut ledger = BonusLedger::new();
        assert!(ledger.grant_flag(EffectId(1), ConditionFlag::Helpless));
        assert!(ledger.has(ConditionFlag::Helpless));

        ledger.grant_flag(EffectId(2), ConditionFlag::ImmobilizationImmunity);
        assert!(!ledger.has(ConditionFlag::Helpless));

        ledger.release(EffectId(2));
        assert!(ledger.has(ConditionFlag::Helpless));
    }

    #[test]
    fn flag_survives_while_any_source_remains() {
        let mut ledger = BonusLedger::new();
        ledger.grant_flag(EffectId(1), ConditionFlag::Hidden);
        ledger.grant_flag(EffectId(2), ConditionFlag::Hidden);
        ledger.release(EffectId(1));
        assert!(ledger.has(ConditionFlag::Hidden));
    }

    #[test]
    fn remove_penalties_of_category() {
        let mut ledger = BonusLedger::new();
        ledger.add_penalty(EffectId(1), Attack, Morale, 2);
        ledger.add_penalty(EffectId(2), Will, Morale, 2);
        ledger.add_bonus(EffectId(3), Attack, Morale, 1);
        ledger.add_penalty(EffectId(4), Attack, Luck, 1);

        assert_eq!(ledger.remove_effect_penalties_of_type(Morale), 2);
        assert_eq!(ledger.bonus_of_type(Attack), 1 - 1);
        assert_eq!(ledger.bonus_of_type(Will), 0);
    }

    #[test]
    fn reduce_penalties_clamps_at_zero() {
        let mut ledger = BonusLedger::new();
        ledger.add_penalty(EffectId(1), Attack, Stackable, 3);
        ledger.add_penalty(EffectId(2), Attack, Stackable, 1);

        assert_eq!(ledger.reduce_penalties_of_type_by_amount(Attack, 2), 3);
        assert_eq!(ledger.bonus_of_type(Attack), -1);
        assert_eq!(ledger.entries().len(), 1);
    }
}
