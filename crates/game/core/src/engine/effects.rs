//! Effect lifecycle: create → apply → round ticks → removal.

use tracing::{debug, warn};

use super::GameEngine;
use crate::ability::SlotRef;
use crate::effect::{
    Duration, Effect, EffectBehavior, EffectError, EffectPhase, EffectTarget,
};
use crate::events::GameEvent;
use crate::ledger::{Bonus, BonusLedger};
use crate::state::{EffectId, EntityId};

impl GameEngine {
    /// Creates a pending effect on `target`.
    ///
    /// When `source_slot` is given, the slot owner becomes the caster and the
    /// effect records the ability's spell level for later dispel checks. A
    /// `template` id binds the template's hooks and default title.
    pub fn create_effect(
        &mut self,
        target: EffectTarget,
        source_slot: Option<SlotRef>,
        template: Option<&str>,
    ) -> Result<EffectId, EffectError> {
        if !self.target_exists(target) {
            return Err(EffectError::MissingTarget(target.entity()));
        }
        let template_title = match template {
            Some(name) => Some(
                self.content
                    .effects
                    .get(name)
                    .map(|t| t.title.clone())
                    .ok_or_else(|| EffectError::UnknownTemplate(name.to_string()))?,
            ),
            None => None,
        };

        let id = self.allocate_effect_id();
        let mut effect = Effect::new(id, target);
        if let Some(title) = template_title {
            effect.title = title;
        }
        effect.template = template.map(str::to_string);
        if let Some(slot) = source_slot {
            effect.source_slot = Some(slot);
            effect.caster = Some(slot.owner);
            if let Some(caster) = self.state.creature(slot.owner) {
                effect.spell_level = caster.caster.spell_level;
                effect.caster_attribute = caster.caster.attribute;
            }
            if let Some(ability) = self.ability_for_slot(slot) {
                effect.spell_level = effect.spell_level.max(ability.definition.spell_level);
            }
        }
        self.effects.insert(id, effect);
        Ok(id)
    }

    /// Pending effect created from `parent`'s template and caster, targeting `target`.
    pub fn create_child_effect(&mut self, parent: EffectId, target: EntityId) -> Result<EffectId, EffectError> {
        let (slot, caster, spell_level, attribute, title) = {
            let parent_effect = self.effects.get(&parent).ok_or(EffectError::NotFound(parent))?;
            (
                parent_effect.source_slot,
                parent_effect.caster,
                parent_effect.spell_level,
                parent_effect.caster_attribute,
                parent_effect.title.clone(),
            )
        };
        let child = self.create_effect(EffectTarget::Creature(target), slot, None)?;
        if let Some(effect) = self.effects.get_mut(&child) {
            effect.parent = Some(parent);
            effect.caster = caster;
            effect.spell_level = spell_level;
            effect.caster_attribute = attribute;
            effect.title = title;
        }
        Ok(child)
    }

    pub fn effect(&self, id: EffectId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    /// Mutable access for configuring a pending effect.
    ///
    /// Bonus changes made here on an applied effect are not mirrored into the
    /// target's ledger; use [`Self::add_effect_bonus`] for that.
    pub fn effect_mut(&mut self, id: EffectId) -> Option<&mut Effect> {
        self.effects.get_mut(&id)
    }

    pub fn is_effect_applied(&self, id: EffectId) -> bool {
        self.effects.get(&id).is_some_and(Effect::is_applied)
    }

    /// Adds a bonus to an effect, writing it through to the ledger when already applied.
    pub fn add_effect_bonus(&mut self, id: EffectId, bonus: Bonus) -> Result<(), EffectError> {
        let effect = self.effects.get_mut(&id).ok_or(EffectError::NotFound(id))?;
        effect.bonuses.push(bonus);
        if effect.is_applied() {
            let target = effect.target;
            if let Some(ledger) = self.ledger_mut(target) {
                ledger.insert(id, bonus);
            }
        }
        Ok(())
    }

    /// Commits a pending effect to its target and runs `on_apply`.
    pub fn apply_effect(&mut self, id: EffectId) -> Result<(), EffectError> {
        let effect = self.effects.get(&id).ok_or(EffectError::NotFound(id))?;
        if effect.phase != EffectPhase::Pending {
            return Err(EffectError::NotPending(id));
        }
        let target = effect.target;
        let bonuses = effect.bonuses.clone();
        let conditions = effect.conditions.clone();
        let modifiers = effect.damage_modifiers.clone();
        let parent = effect.parent;
        let title = effect.title.clone();
        let is_aura = effect.is_aura();
        let behavior = self.behavior_of(id);

        let ledger = self
            .ledger_mut(target)
            .ok_or(EffectError::MissingTarget(target.entity()))?;
        for bonus in bonuses {
            ledger.insert(id, bonus);
        }
        let mut blocked = Vec::new();
        for condition in conditions {
            if !ledger.grant_flag(id, condition) {
                blocked.push(condition);
            }
        }
        for modifier in modifiers {
            ledger.add_damage_modifier(id, modifier);
        }
        if let Some(list) = self.effect_list_mut(target) {
            list.push(id);
        }

        let seq = self.next_apply_seq();
        if let Some(effect) = self.effects.get_mut(&id) {
            effect.phase = EffectPhase::Applied;
            effect.applied_seq = seq;
        }
        if let Some(parent) = parent.and_then(|p| self.effects.get_mut(&p)) {
            if !parent.children.contains(&id) {
                parent.children.push(id);
            }
        }

        debug!(target: "game_core::effect", effect = %id, entity = %target.entity(), %title, "effect applied");
        self.emit(GameEvent::EffectApplied {
            effect: id,
            target: target.entity(),
            title,
        });
        for condition in blocked {
            debug!(target: "game_core::effect", effect = %id, %condition, "condition blocked by immunity");
            self.emit(GameEvent::ConditionBlocked {
                effect: id,
                target: target.entity(),
                condition,
            });
        }

        if let Some(handler) = behavior.on_apply {
            handler.on_apply(self, id);
        }
        if is_aura && self.is_effect_applied(id) {
            self.refresh_auras();
        }
        Ok(())
    }

    /// Removes an effect, running `on_remove` and releasing its contributions.
    ///
    /// Safe to call from inside the effect's own hooks. Removing an effect that
    /// is already being removed, or that no longer exists, is a no-op that
    /// returns `false`.
    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let Some(effect) = self.effects.get_mut(&id) else {
            return false;
        };
        let phase = effect.phase;
        match phase {
            EffectPhase::Removing => return false,
            EffectPhase::Pending => {
                self.effects.remove(&id);
                return true;
            }
            EffectPhase::Applied => effect.phase = EffectPhase::Removing,
        }

        let behavior = self.behavior_of(id);
        if let Some(handler) = behavior.on_remove {
            handler.on_remove(self, id);
        }
        if self.effects.get(&id).is_some_and(Effect::is_aura) {
            self.dissolve_aura(id);
        }
        let children = self
            .effects
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_effect(child);
        }

        let Some(effect) = self.effects.remove(&id) else {
            warn!(target: "game_core::effect", effect = %id, "effect vanished during removal");
            return false;
        };
        if let Some(ledger) = self.ledger_mut(effect.target) {
            ledger.release(id);
        }
        if let Some(list) = self.effect_list_mut(effect.target) {
            list.retain(|e| *e != id);
        }
        if let Some(parent) = effect.parent.and_then(|p| self.effects.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
            if let Some(aura) = parent.aura.as_mut() {
                aura.forget_child(id);
            }
        }

        debug!(target: "game_core::effect", effect = %id, entity = %effect.target.entity(), title = %effect.title, "effect removed");
        self.emit(GameEvent::EffectRemoved {
            effect: id,
            target: effect.target.entity(),
            title: effect.title,
        });
        true
    }

    /// Ticks every applied effect once, in application order.
    ///
    /// Effects applied during this pass wait until the next round.
    pub fn tick_effects(&mut self) {
        let mut order: Vec<(u64, EffectId)> = self
            .effects
            .values()
            .filter(|e| e.is_applied())
            .map(|e| (e.applied_seq, e.id))
            .collect();
        order.sort_unstable();

        for (_, id) in order {
            if !self.is_effect_applied(id) {
                continue;
            }
            if let Some(handler) = self.behavior_of(id).on_round {
                handler.on_round_elapsed(self, id);
            }
            let Some(effect) = self.effects.get_mut(&id) else {
                continue;
            };
            if !effect.is_applied() {
                continue;
            }
            effect.rounds_elapsed += 1;
            let expired = matches!(effect.duration, Duration::Rounds(total) if effect.rounds_elapsed >= total);
            if expired {
                let target = effect.target.entity();
                self.emit(GameEvent::EffectExpired { effect: id, target });
                self.remove_effect(id);
            }
        }
    }

    /// Applied effects on a creature or item, in application order.
    pub fn effects_on(&self, target: EntityId) -> &[EffectId] {
        if let Some(creature) = self.state.creature(target) {
            return &creature.effects;
        }
        self.state
            .item(target)
            .map(|item| item.effects.as_slice())
            .unwrap_or_default()
    }

    /// Applied effects on `target` a dispel may remove.
    pub fn dispellable_effects(&self, target: EntityId) -> Vec<EffectId> {
        self.effects_on(target)
            .iter()
            .copied()
            .filter(|id| {
                self.effects
                    .get(id)
                    .is_some_and(|e| e.is_applied() && e.is_dispellable())
            })
            .collect()
    }

    /// First applied effect on `target` that `slot` created.
    pub fn effect_created_by_slot(&self, target: EntityId, slot: SlotRef) -> Option<EffectId> {
        self.effects_on(target).iter().copied().find(|id| {
            self.effects
                .get(id)
                .is_some_and(|e| e.is_applied() && e.source_slot == Some(slot))
        })
    }

    /// Every applied effect, anywhere, created by `slot`.
    pub fn effects_created_by_slot(&self, slot: SlotRef) -> Vec<EffectId> {
        self.effects
            .values()
            .filter(|e| e.is_applied() && e.source_slot == Some(slot))
            .map(|e| e.id)
            .collect()
    }

    pub(crate) fn behavior_of(&self, id: EffectId) -> EffectBehavior {
        self.effects
            .get(&id)
            .and_then(|e| e.template.as_deref())
            .and_then(|name| self.content.effects.get(name))
            .map(|t| t.behavior.clone())
            .unwrap_or_default()
    }

    fn target_exists(&self, target: EffectTarget) -> bool {
        match target {
            EffectTarget::Creature(id) => self.state.creature(id).is_some(),
            EffectTarget::Item(id) => self.state.item(id).is_some(),
        }
    }

    pub(crate) fn ledger_mut(&mut self, target: EffectTarget) -> Option<&mut BonusLedger> {
        match target {
            EffectTarget::Creature(id) => self.state.creature_mut(id).map(|c| &mut c.ledger),
            EffectTarget::Item(id) => self.state.item_mut(id).map(|i| &mut i.ledger),
        }
    }

    fn effect_list_mut(&mut self, target: EffectTarget) -> Option<&mut Vec<EffectId>> {
        match target {
            EffectTarget::Creature(id) => self.state.creature_mut(id).map(|c| &mut c.effects),
            EffectTarget::Item(id) => self.state.item_mut(id).map(|i| &mut i.effects),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::testing::*;
    use super::*;
    use crate::effect::{
        ApplyHandler, EffectFlags, EffectTemplate, EffectTemplateRegistry, RemoveHandler,
        RoundTickHandler,
    };
    use crate::engine::ContentRegistry;
    use crate::ledger::{Attribute, ConditionFlag, StackingCategory};
    use crate::state::Item;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, entry: String) {
            self.calls.lock().expect("lock").push(entry);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl ApplyHandler for Recorder {
        fn on_apply(&self, _engine: &mut GameEngine, effect: EffectId) {
            self.push(format!("apply {}", effect.0));
        }
    }

    impl RoundTickHandler for Recorder {
        fn on_round_elapsed(&self, _engine: &mut GameEngine, effect: EffectId) {
            self.push(format!("tick {}", effect.0));
        }
    }

    impl RemoveHandler for Recorder {
        fn on_remove(&self, _engine: &mut GameEngine, effect: EffectId) {
            self.push(format!("remove {}", effect.0));
        }
    }

    /// Removes its own effect from inside the round tick.
    struct SelfRemoving;

    impl RoundTickHandler for SelfRemoving {
        fn on_round_elapsed(&self, engine: &mut GameEngine, effect: EffectId) {
            engine.remove_effect(effect);
        }
    }

    fn recorder_content(recorder: &Arc<Recorder>) -> ContentRegistry {
        let mut effects = EffectTemplateRegistry::new();
        effects.register(EffectTemplate::new(
            "recorded",
            "Recorded",
            EffectBehavior::new()
                .with_apply(recorder.clone())
                .with_round(recorder.clone())
                .with_remove(recorder.clone()),
        ));
        effects.register(EffectTemplate::new(
            "self_removing",
            "Fleeting",
            EffectBehavior::new().with_round(Arc::new(SelfRemoving)),
        ));
        ContentRegistry::new(Default::default(), effects)
    }

    #[test]
    fn stackable_and_morale_sum_then_expire_after_five_rounds() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        let target = EffectTarget::Creature(EntityId(0));

        let focus = engine.create_effect(target, None, None).expect("create");
        engine
            .effect_mut(focus)
            .expect("pending")
            .set_duration(Duration::Rounds(5))
            .add_bonus(Attribute::Attack, StackingCategory::Stackable, 10);
        engine.apply_effect(focus).expect("apply");

        let rally = engine.create_effect(target, None, None).expect("create");
        engine
            .effect_mut(rally)
            .expect("pending")
            .set_duration(Duration::Rounds(5))
            .add_bonus(Attribute::Attack, StackingCategory::Morale, 20);
        engine.apply_effect(rally).expect("apply");

        assert_eq!(engine.attribute(EntityId(0), Attribute::Attack), 30);
        for _ in 0..4 {
            engine.tick_effects();
        }
        assert_eq!(engine.attribute(EntityId(0), Attribute::Attack), 30);
        engine.tick_effects();
        assert_eq!(engine.attribute(EntityId(0), Attribute::Attack), 0);
        assert!(engine.effects_on(EntityId(0)).is_empty());
    }

    #[test]
    fn hooks_fire_in_lifecycle_order() {
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine_with(recorder_content(&recorder), vec![hero(0, 0, 0)]);
        let id = engine
            .create_effect(EffectTarget::Creature(EntityId(0)), None, Some("recorded"))
            .expect("create");
        engine
            .effect_mut(id)
            .expect("pending")
            .set_duration(Duration::Rounds(2));
        engine.apply_effect(id).expect("apply");
        engine.tick_effects();
        engine.tick_effects();

        let n = id.0;
        assert_eq!(
            recorder.calls(),
            vec![
                format!("apply {n}"),
                format!("tick {n}"),
                format!("tick {n}"),
                format!("remove {n}"),
            ]
        );
        assert!(engine.effect(id).is_none());
    }

    #[test]
    fn ticks_follow_application_order_across_targets() {
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine_with(recorder_content(&recorder), vec![hero(0, 0, 0), hero(1, 1, 0)]);
        let created_first = engine
            .create_effect(EffectTarget::Creature(EntityId(0)), None, Some("recorded"))
            .expect("create");
        let applied_first = engine
            .create_effect(EffectTarget::Creature(EntityId(1)), None, Some("recorded"))
            .expect("create");
        engine.apply_effect(applied_first).expect("apply");
        engine.apply_effect(created_first).expect("apply");
        engine.tick_effects();

        let ticks: Vec<String> = recorder
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("tick"))
            .collect();
        assert_eq!(
            ticks,
            vec![
                format!("tick {}", applied_first.0),
                format!("tick {}", created_first.0)
            ]
        );
    }

    #[test]
    fn effect_may_remove_itself_during_tick() {
        let recorder = Arc::new(Recorder::default());
        let mut engine = engine_with(recorder_content(&recorder), vec![hero(0, 0, 0)]);
        let id = engine
            .create_effect(EffectTarget::Creature(EntityId(0)), None, Some("self_removing"))
            .expect("create");
        engine
            .effect_mut(id)
            .expect("pending")
            .add_condition(ConditionFlag::Hidden);
        engine.apply_effect(id).expect("apply");
        assert!(engine.has_condition(EntityId(0), ConditionFlag::Hidden));

        engine.tick_effects();
        assert!(!engine.is_effect_applied(id));
        assert!(!engine.has_condition(EntityId(0), ConditionFlag::Hidden));
        assert!(!engine.remove_effect(id));
    }

    #[test]
    fn apply_twice_is_rejected() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        let id = engine
            .create_effect(EffectTarget::Creature(EntityId(0)), None, None)
            .expect("create");
        engine.apply_effect(id).expect("apply");
        assert_eq!(engine.apply_effect(id), Err(EffectError::NotPending(id)));
    }

    #[test]
    fn unknown_template_and_missing_target_are_errors() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        assert_eq!(
            engine.create_effect(EffectTarget::Creature(EntityId(0)), None, Some("nope")),
            Err(EffectError::UnknownTemplate("nope".into()))
        );
        assert_eq!(
            engine.create_effect(EffectTarget::Creature(EntityId(9)), None, None),
            Err(EffectError::MissingTarget(EntityId(9)))
        );
    }

    #[test]
    fn immunity_blocks_condition_and_reports_it() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        let target = EffectTarget::Creature(EntityId(0));
        let freedom = engine.create_effect(target, None, None).expect("create");
        engine
            .effect_mut(freedom)
            .expect("pending")
            .add_condition(ConditionFlag::ImmobilizationImmunity);
        engine.apply_effect(freedom).expect("apply");

        let hold = engine.create_effect(target, None, None).expect("create");
        engine
            .effect_mut(hold)
            .expect("pending")
            .add_condition(ConditionFlag::Immobilized);
        engine.apply_effect(hold).expect("apply");

        assert!(!engine.has_condition(EntityId(0), ConditionFlag::Immobilized));
        assert!(engine.events().iter().any(|e| matches!(
            e,
            GameEvent::ConditionBlocked { condition: ConditionFlag::Immobilized, .. }
        )));
    }

    #[test]
    fn item_effects_feed_equipped_creature() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        let sword = engine.state_mut().allocate_id();
        engine.state_mut().insert_item(Item::new(sword, "sword"));
        engine.state_mut().creature_mut(EntityId(0)).expect("hero").equipped = Some(sword);

        let id = engine
            .create_effect(EffectTarget::Item(sword), None, None)
            .expect("create");
        engine
            .effect_mut(id)
            .expect("pending")
            .add_bonus(Attribute::Attack, StackingCategory::Enhancement, 2);
        engine.apply_effect(id).expect("apply");

        assert_eq!(engine.attribute(EntityId(0), Attribute::Attack), 2);
        assert_eq!(engine.effects_on(sword), &[id]);
    }

    #[test]
    fn item_bonuses_stack_with_the_wielders_own() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        let sword = engine.state_mut().allocate_id();
        engine.state_mut().insert_item(Item::new(sword, "sword"));
        engine.state_mut().creature_mut(EntityId(0)).expect("hero").equipped = Some(sword);

        let enchant = engine
            .create_effect(EffectTarget::Item(sword), None, None)
            .expect("create");
        {
            let effect = engine.effect_mut(enchant).expect("pending");
            effect.add_bonus(Attribute::Attack, StackingCategory::Morale, 2);
            effect.add_bonus(Attribute::ActionPoints, StackingCategory::Stackable, 1);
            effect.add_bonus(Attribute::MaxHitPoints, StackingCategory::Stackable, 10);
        }
        engine.apply_effect(enchant).expect("apply");

        let rally = engine
            .create_effect(EffectTarget::Creature(EntityId(0)), None, None)
            .expect("create");
        engine
            .effect_mut(rally)
            .expect("pending")
            .add_bonus(Attribute::Attack, StackingCategory::Morale, 3);
        engine.apply_effect(rally).expect("apply");

        // two Morale bonuses must not add
        assert_eq!(engine.attribute(EntityId(0), Attribute::Attack), 3);

        engine.begin_turn(EntityId(0));
        let ap = engine.creature(EntityId(0)).expect("hero").ap;
        assert_eq!(ap.maximum, engine.config().action_points + 1);

        assert_eq!(engine.state().max_hp(EntityId(0)), 30);
        assert!((engine.state().hp_fraction(EntityId(0)) - 20.0 / 30.0).abs() < 1e-6);
        assert_eq!(engine.heal(EntityId(0), 50), 10);
        assert!((engine.state().hp_fraction(EntityId(0)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dispellable_effects_skip_undispellable() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0)]);
        let target = EffectTarget::Creature(EntityId(0));
        let normal = engine.create_effect(target, None, None).expect("create");
        let locked = engine.create_effect(target, None, None).expect("create");
        engine
            .effect_mut(locked)
            .expect("pending")
            .set_flags(EffectFlags::UNDISPELLABLE);
        engine.apply_effect(normal).expect("apply");
        engine.apply_effect(locked).expect("apply");

        assert_eq!(engine.dispellable_effects(EntityId(0)), vec![normal]);
    }

    #[test]
    fn removing_parent_removes_children() {
        let mut engine = engine_with(ContentRegistry::default(), vec![hero(0, 0, 0), hero(1, 1, 0)]);
        let parent = engine
            .create_effect(EffectTarget::Creature(EntityId(0)), None, None)
            .expect("create");
        engine.apply_effect(parent).expect("apply");
        let child = engine.create_child_effect(parent, EntityId(1)).expect("child");
        engine.apply_effect(child).expect("apply");
        assert_eq!(engine.effect(parent).expect("parent").children, vec![child]);

        assert!(engine.remove_effect(parent));
        assert!(!engine.is_effect_applied(child));
        assert!(engine.effects_on(EntityId(1)).is_empty());
    }
}
