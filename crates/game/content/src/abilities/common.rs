//! Reusable resolvers, validators and gates the ability catalog is built from.

use std::sync::Arc;

use game_core::{
    ActivationGate, AiTargetCheck, Attribute, Bonus, CallbackArgs, CallbackOwner, ConditionFlag, Damage,
    DamageModifier, DamageType, DeferredTask, Duration, EffectError, EffectFlags, EffectId, EffectParams,
    EffectTarget, EntityId, GameEngine, GameRng, Mark, Position, Relationship, SaveKind, SlotRef, StackingCategory,
    TargetResolver, TargetSelection, TargetValidator,
};
use tracing::{debug, warn};

/// A declarative description of one effect an ability leaves on a target.
#[derive(Clone, Debug, Default)]
pub struct EffectRecipe {
    pub template: Option<&'static str>,
    pub rounds: Option<u32>,
    pub bonuses: Vec<Bonus>,
    pub conditions: Vec<ConditionFlag>,
    pub modifiers: Vec<DamageModifier>,
    pub flags: EffectFlags,
    pub magnitude: i32,
    pub damage_type: Option<DamageType>,
    pub icon: Option<&'static str>,
}

impl EffectRecipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: &'static str) -> Self {
        self.template = Some(template);
        self
    }

    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn bonus(mut self, attribute: Attribute, category: StackingCategory, amount: i32) -> Self {
        self.bonuses.push(Bonus::bonus(attribute, category, amount));
        self
    }

    pub fn penalty(mut self, attribute: Attribute, category: StackingCategory, amount: i32) -> Self {
        self.bonuses.push(Bonus::penalty(attribute, category, amount));
        self
    }

    pub fn condition(mut self, flag: ConditionFlag) -> Self {
        self.conditions.push(flag);
        self
    }

    pub fn modifier(mut self, modifier: DamageModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn flags(mut self, flags: EffectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn magnitude(mut self, amount: i32, damage_type: DamageType) -> Self {
        self.magnitude = amount;
        self.damage_type = Some(damage_type);
        self
    }

    pub fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Creates and applies the effect. The slot's save DC is recorded for templates that roll saves later.
    pub fn apply(&self, engine: &mut GameEngine, target: EffectTarget, slot: Option<SlotRef>) -> Result<EffectId, EffectError> {
        let id = engine.create_effect(target, slot, self.template)?;
        let name = slot
            .and_then(|s| engine.ability_for_slot(s))
            .map(|a| a.definition.name.clone());
        let dc = slot.map_or(0, |s| engine.save_dc(s));
        if let Some(effect) = engine.effect_mut(id) {
            if self.template.is_none()
                && let Some(name) = name
            {
                effect.set_title(name);
            }
            if let Some(rounds) = self.rounds {
                effect.set_duration(Duration::Rounds(rounds));
            }
            effect.bonuses.extend(self.bonuses.iter().copied());
            effect.conditions.extend(self.conditions.iter().copied());
            effect.damage_modifiers.extend(self.modifiers.iter().copied());
            effect.set_flags(self.flags);
            if let Some(icon) = self.icon {
                effect.add_icon(icon);
            }
            effect.params = EffectParams {
                magnitude: self.magnitude,
                damage_type: self.damage_type,
                dc,
            };
        }
        engine.apply_effect(id)?;
        Ok(id)
    }
}

/// Applies a recipe to every selected target that survives the spell checks.
///
/// Recasting on a target replaces the effect this slot left there before.
pub struct ApplyRecipe {
    pub recipe: EffectRecipe,
    pub save: Option<SaveKind>,
    /// Put the effect on the target's equipped item when it has one.
    pub on_item: bool,
}

impl ApplyRecipe {
    pub fn new(recipe: EffectRecipe) -> Self {
        Self {
            recipe,
            save: None,
            on_item: false,
        }
    }

    pub fn with_save(mut self, save: SaveKind) -> Self {
        self.save = Some(save);
        self
    }

    pub fn on_item(mut self) -> Self {
        self.on_item = true;
        self
    }
}

impl TargetResolver for ApplyRecipe {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        for &target in &selection.targets {
            if !engine.affects_target(selection.slot, target, self.save) {
                continue;
            }
            let equipped = engine.creature(target).and_then(|c| c.equipped);
            let effect_target = match equipped {
                Some(item) if self.on_item => EffectTarget::Item(item),
                _ => EffectTarget::Creature(target),
            };
            if let Some(previous) = engine.effect_created_by_slot(effect_target.entity(), selection.slot) {
                engine.remove_effect(previous);
            }
            if let Err(error) = self.recipe.apply(engine, effect_target, Some(selection.slot)) {
                warn!(target: "game_content::abilities", slot = %selection.slot, creature = %target, %error, "effect not applied");
            }
        }
    }
}

/// Rolls `dice`d`sides`, halved on a successful save, and applies it.
fn strike(
    engine: &mut GameEngine,
    caster: Option<EntityId>,
    target: EntityId,
    roll: (u32, u32),
    damage_type: DamageType,
    save: Option<(SaveKind, i32)>,
) -> u32 {
    if engine.creature(target).is_none_or(|c| c.dead) {
        return 0;
    }
    let (dice, sides) = roll;
    let mut amount: i32 = (0..dice).map(|_| engine.rng().roll_die(sides)).sum();
    if let Some(caster) = caster {
        amount += engine.attribute(caster, Attribute::SpellPower);
    }
    if let Some((kind, dc)) = save
        && engine.resists(target, kind, dc)
    {
        amount /= 2;
    }
    engine.apply_damage(Damage::new(caster, target, damage_type, amount.max(0) as u32))
}

/// Damage landing when a projectile reaches its point of impact.
pub struct DamageImpact {
    pub roll: (u32, u32),
    pub damage_type: DamageType,
    pub save: Option<SaveKind>,
}

impl DeferredTask for DamageImpact {
    fn name(&self) -> &str {
        "damage_impact"
    }

    fn run(&self, engine: &mut GameEngine, args: &CallbackArgs) {
        let save = self.save.map(|kind| (kind, args.dc));
        for &target in &args.targets {
            strike(engine, args.caster, target, self.roll, self.damage_type, save);
        }
    }
}

/// Damage to every creature caught by an area.
///
/// With `projectile` set the damage is deferred until the missile has flown
/// from the caster to the aimed point.
pub struct AreaDamage {
    pub roll: (u32, u32),
    pub damage_type: DamageType,
    pub save: Option<SaveKind>,
    pub projectile: bool,
}

impl TargetResolver for AreaDamage {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        let dc = engine.save_dc(selection.slot);
        let Some(origin) = engine.creature(selection.caster).map(|c| c.position) else {
            return;
        };
        let is_spell = engine
            .ability_for_slot(selection.slot)
            .is_some_and(|a| a.definition.is_spell);
        let targets: Vec<EntityId> = selection
            .targets
            .iter()
            .copied()
            .filter(|target| !(is_spell && engine.spell_fails(selection.caster, *target)))
            .collect();

        if self.projectile {
            let impact = selection.point.unwrap_or(origin);
            let delay = engine.projectile_delay(origin, impact);
            let task = Arc::new(DamageImpact {
                roll: self.roll,
                damage_type: self.damage_type,
                save: self.save,
            });
            let args = CallbackArgs {
                caster: Some(selection.caster),
                targets,
                point: Some(impact),
                dc,
                slot: Some(selection.slot),
                ..CallbackArgs::default()
            };
            debug!(target: "game_content::abilities", slot = %selection.slot, delay, "projectile launched");
            engine.schedule(CallbackOwner::Ability(selection.slot), task, delay, args);
            return;
        }

        let save = self.save.map(|kind| (kind, dc));
        for target in targets {
            strike(engine, Some(selection.caster), target, self.roll, self.damage_type, save);
        }
    }
}

/// Restores `dice`d`sides` plus the caster's spell level.
pub struct Heal {
    pub roll: (u32, u32),
}

impl TargetResolver for Heal {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        let level = engine.creature(selection.caster).map_or(0, |c| c.caster.spell_level);
        for &target in &selection.targets {
            let (dice, sides) = self.roll;
            let amount: i32 = (0..dice).map(|_| engine.rng().roll_die(sides)).sum::<i32>() + level;
            engine.heal(target, amount);
        }
    }
}

/// Attempts to strip dispellable effects from each target.
pub struct Dispel;

impl TargetResolver for Dispel {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        let extra = engine.attribute(selection.caster, Attribute::DispelAttempts).max(0) as u32;
        let attempts = engine.config().dispel_attempts + extra;
        for &target in &selection.targets {
            let report = engine.dispel(selection.caster, target, attempts);
            debug!(
                target: "game_content::abilities",
                creature = %target,
                attempts = report.attempts.len(),
                removed = report.removed.len(),
                "dispel resolved"
            );
        }
    }
}

/// Removes effects imposing any of `conditions`, then applies `then`.
pub struct Renewal {
    pub conditions: &'static [ConditionFlag],
    pub then: EffectRecipe,
}

impl TargetResolver for Renewal {
    fn on_target_select(&self, engine: &mut GameEngine, selection: &TargetSelection) {
        for &target in &selection.targets {
            let cured: Vec<EffectId> = engine
                .effects_on(target)
                .iter()
                .copied()
                .filter(|id| {
                    engine
                        .effect(*id)
                        .is_some_and(|e| e.conditions.iter().any(|c| self.conditions.contains(c)))
                })
                .collect();
            for effect in cured {
                engine.remove_effect(effect);
            }
            if let Err(error) = self
                .then
                .apply(engine, EffectTarget::Creature(target), Some(selection.slot))
            {
                warn!(target: "game_content::abilities", creature = %target, %error, "renewal effect not applied");
            }
        }
    }
}

/// Valid when the target currently has any of the listed conditions.
pub struct HasCondition(pub &'static [ConditionFlag]);

impl TargetValidator for HasCondition {
    fn is_target_valid(&self, engine: &GameEngine, _slot: SlotRef, target: EntityId) -> bool {
        self.0.iter().any(|flag| engine.has_condition(target, *flag))
    }
}

/// Valid when the target does not already have any of the listed conditions.
pub struct LacksCondition(pub &'static [ConditionFlag]);

impl TargetValidator for LacksCondition {
    fn is_target_valid(&self, engine: &GameEngine, _slot: SlotRef, target: EntityId) -> bool {
        !self.0.iter().any(|flag| engine.has_condition(target, *flag))
    }
}

/// Valid when the target has lost hit points.
pub struct Wounded;

impl TargetValidator for Wounded {
    fn is_target_valid(&self, engine: &GameEngine, _slot: SlotRef, target: EntityId) -> bool {
        engine
            .creature(target)
            .is_some_and(|c| c.hp.current < engine.state().max_hp(target))
    }
}

/// Friends need harmful effects stripped; enemies need their helpful ones stripped.
pub struct HasDispellable;

impl TargetValidator for HasDispellable {
    fn is_target_valid(&self, engine: &GameEngine, slot: SlotRef, target: EntityId) -> bool {
        let want_harmful = target == slot.owner || engine.relationship(slot.owner, target) == Relationship::Friendly;
        engine.dispellable_effects(target).iter().any(|id| {
            engine
                .effect(*id)
                .is_some_and(|e| e.flags.contains(EffectFlags::HARMFUL) == want_harmful)
        })
    }
}

/// Allows the ability once per encounter per caster.
pub struct OncePerEncounter;

impl ActivationGate for OncePerEncounter {
    fn can_activate(&self, engine: &GameEngine, slot: SlotRef) -> bool {
        let Some(ability) = engine.ability_for_slot(slot) else {
            return false;
        };
        let used = Mark::AbilityUsed(ability.definition.id.clone());
        engine.creature(slot.owner).is_some_and(|c| !c.marks.has(&used))
    }
}

/// Rejects aim points whose blast would catch the caster or its friends.
pub struct AvoidFriendlyFire {
    pub radius: u32,
}

impl AiTargetCheck for AvoidFriendlyFire {
    fn ai_check_target_valid(&self, engine: &GameEngine, slot: SlotRef, target: Position) -> bool {
        !engine
            .state()
            .creatures_within(target, self.radius)
            .any(|c| c.id == slot.owner || engine.relationship(slot.owner, c.id) == Relationship::Friendly)
    }
}
