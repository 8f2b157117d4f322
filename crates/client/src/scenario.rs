//! The scripted skirmish the binary plays.

use game_content::ids;
use game_core::{Creature, EncounterId, EntityId, FactionId, GameState, Position, Relationship, WeaponProfile};

pub const PARTY: FactionId = FactionId(1);
pub const WARBAND: FactionId = FactionId(2);
pub const CAMP: EncounterId = EncounterId(1);

fn with_slots(mut creature: Creature, abilities: &[&str]) -> Creature {
    for id in abilities {
        creature.add_slot(*id);
    }
    creature
}

/// A four-member party walking into a goblin camp.
///
/// The party acts on its own; the warband sleeps until someone wanders into
/// detection range.
pub fn skirmish() -> GameState {
    let mut state = GameState::new();
    state.factions.set(PARTY, WARBAND, Relationship::Hostile);

    let party = [
        with_slots(
            Creature::new(EntityId(1), "Brannoc", PARTY, Position::new(0, 1), 34)
                .with_weapon(WeaponProfile::melee(10))
                .with_initiative(12),
            &[ids::BATTLE_FOCUS, ids::TOTAL_DEFENSE],
        ),
        with_slots(
            Creature::new(EntityId(2), "Ysolde", PARTY, Position::new(0, 0), 24)
                .with_weapon(WeaponProfile::melee(6))
                .with_caster(3, 3)
                .with_initiative(10),
            &[ids::CURE_WOUNDS, ids::BLESS, ids::SHIELD_OF_FAITH, ids::FREEDOM],
        ),
        with_slots(
            Creature::new(EntityId(3), "Merrow", PARTY, Position::new(-1, 0), 18)
                .with_weapon(WeaponProfile::ranged(6, 4))
                .with_caster(5, 4)
                .with_initiative(14),
            &[ids::FIREBALL, ids::HOLD_PERSON, ids::DISPEL_MAGIC, ids::FIRE_SHIELD],
        ),
        with_slots(
            Creature::new(EntityId(4), "Tamsin", PARTY, Position::new(-1, 1), 22)
                .with_weapon(WeaponProfile::ranged(8, 8))
                .with_initiative(16),
            &[ids::FLAME_WEAPON],
        ),
    ];

    let warband = [
        with_slots(
            Creature::new(EntityId(10), "Grukk", WARBAND, Position::new(9, 0), 40)
                .with_weapon(WeaponProfile::melee(12))
                .with_caster(2, 1)
                .with_initiative(8),
            &[ids::COURAGE_AURA, ids::VENOM_STRIKE],
        ),
        with_slots(
            Creature::new(EntityId(11), "Snikt", WARBAND, Position::new(11, 2), 16)
                .with_caster(4, 2)
                .with_initiative(11),
            &[ids::SUMMON_WOLF, ids::LIGHTNING_BOLT, ids::CONE_OF_COLD],
        ),
        Creature::new(EntityId(12), "Goblin", WARBAND, Position::new(10, -1), 12)
            .with_weapon(WeaponProfile::melee(6))
            .with_initiative(9),
        Creature::new(EntityId(13), "Goblin Archer", WARBAND, Position::new(12, 0), 10)
            .with_weapon(WeaponProfile::ranged(6, 6))
            .with_initiative(13),
    ];

    for creature in party {
        state.insert_creature(creature);
    }
    for creature in warband {
        state.insert_creature(creature.with_encounter(CAMP));
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warband_shares_one_dormant_encounter() {
        let state = skirmish();
        let camp = state.encounter(CAMP).expect("camp");
        assert_eq!(camp.members.len(), 4);
        assert!(!camp.alerted);
        assert_eq!(state.relationship(EntityId(1), EntityId(10)), Relationship::Hostile);
        assert_eq!(state.relationship(EntityId(1), EntityId(2)), Relationship::Friendly);
    }
}
