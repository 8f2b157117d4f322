//! Per-damage-type immunity, resistance, reduction and vulnerability.

use strum::{Display, EnumIter};

use crate::state::EffectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageType {
    Physical,
    Fire,
    Cold,
    Acid,
    Electricity,
    Sonic,
    Poison,
    Holy,
    Force,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageModifierKind {
    Immunity,
    /// Percentage of incoming damage ignored. Sums across sources, capped at 100.
    Resistance(u32),
    /// Flat amount subtracted after percentages. Sums across sources.
    Reduction(u32),
    /// Percentage of extra damage taken. Sums across sources, capped at 100.
    Vulnerability(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageModifier {
    pub damage_type: DamageType,
    pub kind: DamageModifierKind,
}

impl DamageModifier {
    pub const fn new(damage_type: DamageType, kind: DamageModifierKind) -> Self {
        Self { damage_type, kind }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageLedger {
    entries: Vec<(EffectId, DamageModifier)>,
}

impl DamageLedger {
    const PERCENT_CAP: u32 = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: EffectId, modifier: DamageModifier) {
        self.entries.push((source, modifier));
    }

    pub fn release(&mut self, source: EffectId) {
        self.entries.retain(|(s, _)| *s != source);
    }

    fn of_type(&self, damage_type: DamageType) -> impl Iterator<Item = DamageModifierKind> + '_ {
        self.entries
            .iter()
            .filter(move |(_, m)| m.damage_type == damage_type)
            .map(|(_, m)| m.kind)
    }

    pub fn is_immune(&self, damage_type: DamageType) -> bool {
        self.of_type(damage_type)
            .any(|k| matches!(k, DamageModifierKind::Immunity))
    }

    /// Total resistance percentage, 100 when immune.
    pub fn resistance(&self, damage_type: DamageType) -> u32 {
        if self.is_immune(damage_type) {
            return Self::PERCENT_CAP;
        }
        let total: u32 = self
            .of_type(damage_type)
            .filter_map(|k| match k {
                DamageModifierKind::Resistance(p) => Some(p),
                _ => None,
            })
            .sum();
        total.min(Self::PERCENT_CAP)
    }

    pub fn vulnerability(&self, damage_type: DamageType) -> u32 {
        let total: u32 = self
            .of_type(damage_type)
            .filter_map(|k| match k {
                DamageModifierKind::Vulnerability(p) => Some(p),
                _ => None,
            })
            .sum();
        total.min(Self::PERCENT_CAP)
    }

    pub fn reduction(&self, damage_type: DamageType) -> u32 {
        self.of_type(damage_type)
            .filter_map(|k| match k {
                DamageModifierKind::Reduction(r) => Some(r),
                _ => None,
            })
            .sum()
    }

    /// Damage left after resistance, vulnerability and flat reduction.
    pub fn mitigate(&self, damage_type: DamageType, amount: u32) -> u32 {
        let resistance = self.resistance(damage_type);
        if resistance >= Self::PERCENT_CAP {
            return 0;
        }
        let scale = Self::PERCENT_CAP - resistance + self.vulnerability(damage_type);
        let scaled = amount.saturating_mul(scale) / Self::PERCENT_CAP;
        scaled.saturating_sub(self.reduction(damage_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistance_caps_at_one_hundred() {
        let mut ledger = DamageLedger::new();
        ledger.insert(EffectId(1), DamageModifier::new(DamageType::Fire, DamageModifierKind::Resistance(60)));
        ledger.insert(EffectId(2), DamageModifier::new(DamageType::Fire, DamageModifierKind::Resistance(70)));

        assert_eq!(ledger.resistance(DamageType::Fire), 100);
        assert_eq!(ledger.mitigate(DamageType::Fire, 40), 0);
        assert_eq!(ledger.mitigate(DamageType::Cold, 40), 40);
    }

    #[test]
    fn reduction_applies_after_percentages() {
        let mut ledger = DamageLedger::new();
        ledger.insert(EffectId(1), DamageModifier::new(DamageType::Cold, DamageModifierKind::Resistance(50)));
        ledger.insert(EffectId(1), DamageModifier::new(DamageType::Cold, DamageModifierKind::Reduction(3)));

        // 20 * 50% = 10, minus 3
        assert_eq!(ledger.mitigate(DamageType::Cold, 20), 7);
        assert_eq!(ledger.mitigate(DamageType::Cold, 4), 0);
    }

    #[test]
    fn vulnerability_increases_damage_and_release_clears_source() {
        let mut ledger = DamageLedger::new();
        ledger.insert(EffectId(4), DamageModifier::new(DamageType::Fire, DamageModifierKind::Vulnerability(50)));
        assert_eq!(ledger.mitigate(DamageType::Fire, 10), 15);

        ledger.release(EffectId(4));
        assert_eq!(ledger.mitigate(DamageType::Fire, 10), 10);
    }

    #[test]
    fn immunity_zeroes_damage() {
        let mut ledger = DamageLedger::new();
        ledger.insert(EffectId(9), DamageModifier::new(DamageType::Poison, DamageModifierKind::Immunity));
        assert!(ledger.is_immune(DamageType::Poison));
        assert_eq!(ledger.mitigate(DamageType::Poison, 1000), 0);
    }
}
