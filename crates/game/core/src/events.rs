//! Typed journal of everything observable the engine did.
//!
//! Events are appended as they happen and drained by the runtime, which
//! forwards them to presentation or logs.

use crate::ability::SlotRef;
use crate::ledger::{ConditionFlag, DamageType};
use crate::state::{EffectId, EncounterId, EntityId, Position};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum GameEvent {
    EffectApplied {
        effect: EffectId,
        target: EntityId,
        title: String,
    },
    EffectRemoved {
        effect: EffectId,
        target: EntityId,
        title: String,
    },
    EffectExpired {
        effect: EffectId,
        target: EntityId,
    },
    ConditionBlocked {
        effect: EffectId,
        target: EntityId,
        condition: ConditionFlag,
    },
    AuraEntered {
        aura: EffectId,
        target: EntityId,
        child: EffectId,
    },
    AuraExited {
        aura: EffectId,
        target: EntityId,
        child: EffectId,
    },
    AbilityActivated {
        slot: SlotRef,
        ability: String,
    },
    TargeterCancelled {
        slot: SlotRef,
        ability: String,
    },
    AbilityResolved {
        slot: SlotRef,
        ability: String,
        targets: Vec<EntityId>,
    },
    SlotDeactivated {
        slot: SlotRef,
        ability: String,
    },
    SpellFailed {
        caster: EntityId,
        target: EntityId,
    },
    Resisted {
        target: EntityId,
        roll: i32,
        dc: i32,
    },
    AttackResolved {
        attacker: EntityId,
        defender: EntityId,
        roll: i32,
        total: i32,
        armor_class: i32,
        hit: bool,
    },
    DamageDealt {
        source: Option<EntityId>,
        target: EntityId,
        amount: u32,
        damage_type: DamageType,
    },
    Healed {
        target: EntityId,
        amount: i32,
    },
    CreatureDied {
        creature: EntityId,
    },
    CreatureMoved {
        creature: EntityId,
        from: Position,
        to: Position,
    },
    CreatureSpawned {
        creature: EntityId,
        position: Position,
    },
    DispelAttempted {
        effect: EffectId,
        roll: i32,
        success: bool,
    },
    CallbackFired {
        name: String,
        at_ms: u64,
    },
    RoundAdvanced {
        round: u32,
    },
    EncounterAlerted {
        encounter: EncounterId,
    },
    EncounterEnded {
        encounter: EncounterId,
    },
}
