//! The ability phase of an AI turn.

use game_core::{
    Activation, ActionType, EntityId, GameEngine, MoveError, PathingOracle, Position, RangeBand, SelectOutcome,
    SelectionMode, Slot, TargeterId, TargeterShape, TargetingError,
};
use tracing::{debug, info};

use super::basic::BasicAttackAi;
use super::candidates::{Candidate, candidate_slots};
use super::context::AiContext;
use super::overrides::{TacticalOverride, default_overrides};
use super::targeting::{Aim, choose_aim};
use crate::error::{Result, RuntimeError};
use crate::providers::TurnReport;

/// How one queued ability went.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Resolved(String),
    /// Not worth trying right now; move on to the next candidate.
    Skipped,
    /// Tried and failed; the next candidate may still work.
    Failed,
    /// The creature cannot reach anything this turn. Ends the ability phase.
    Blocked,
    /// Out of AP. Ends the ability phase.
    Exhausted,
}

/// Tiles from the aim point the caster has to close to before activating.
fn engage_range(shape: TargeterShape, range: RangeBand) -> u32 {
    match shape {
        TargeterShape::Cone { length, .. } | TargeterShape::Line { length } => length.max(1),
        _ => range.tiles().max(1),
    }
}

pub struct TurnPlanner {
    overrides: Vec<Box<dyn TacticalOverride>>,
    basic: BasicAttackAi,
}

impl TurnPlanner {
    pub fn new() -> Self {
        Self {
            overrides: default_overrides(),
            basic: BasicAttackAi,
        }
    }

    pub fn with_overrides(mut self, overrides: Vec<Box<dyn TacticalOverride>>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Plays one AI turn: overrides, then abilities by priority, then the
    /// basic attack with whatever AP is left.
    pub fn plan_turn(
        &self,
        engine: &mut GameEngine,
        creature: EntityId,
        pathing: &dyn PathingOracle,
    ) -> Result<TurnReport> {
        if engine.creature(creature).is_none() {
            return Err(RuntimeError::UnknownCreature(creature));
        }
        let ctx = AiContext::new(creature, pathing);
        if engine.is_dormant(creature) || ctx.incapacitated(engine) {
            debug!(target: "runtime::ai", %creature, "turn skipped");
            return Ok(TurnReport::idle(creature));
        }

        let mut report = TurnReport::new(creature);
        for candidate in self.queue(engine, &ctx) {
            if ctx.ap(engine) == 0 || ctx.incapacitated(engine) {
                break;
            }
            match self.try_ability(engine, &ctx, &candidate, &mut report) {
                Step::Resolved(ability) => report.abilities.push(ability),
                Step::Skipped | Step::Failed => {}
                Step::Blocked | Step::Exhausted => break,
            }
        }

        if ctx.ap(engine) > 0 && !ctx.incapacitated(engine) {
            report.fell_back = true;
            self.basic.run(engine, &ctx, &mut report);
        }

        info!(
            target: "runtime::ai",
            %creature,
            abilities = ?report.abilities,
            attacks = report.attacks,
            steps = report.steps,
            "turn planned"
        );
        Ok(report)
    }

    /// Override picks first, in battery order, then type-eligible slots by priority.
    fn queue(&self, engine: &GameEngine, ctx: &AiContext<'_>) -> Vec<Candidate> {
        let mut queue: Vec<Candidate> = self
            .overrides
            .iter()
            .filter_map(|rule| {
                let pick = rule.evaluate(engine, ctx)?;
                debug!(target: "runtime::ai", creature = %ctx.creature, rule = rule.name(), slot = %pick.slot, "override");
                Some(pick)
            })
            .collect();
        for candidate in candidate_slots(engine, ctx) {
            if !queue.iter().any(|queued| queued.slot == candidate.slot) {
                queue.push(candidate);
            }
        }
        queue
    }

    fn try_ability(
        &self,
        engine: &mut GameEngine,
        ctx: &AiContext<'_>,
        candidate: &Candidate,
        report: &mut TurnReport,
    ) -> Step {
        let slot = candidate.slot;
        let Some((id, action_type, shape, range, ap_cost)) = engine.ability_for_slot(slot).map(|a| {
            let d = &a.definition;
            (d.id.clone(), d.action_type, d.targeting.shape, d.range, d.ap_cost)
        }) else {
            return Step::Skipped;
        };
        if engine.slot(slot).is_none_or(Slot::is_active) || !engine.can_activate(slot) {
            return Step::Skipped;
        }
        let aim = match candidate.forced {
            Some(aim) => aim,
            None => match choose_aim(engine, ctx, slot) {
                Some(aim) => aim,
                None => return Step::Skipped,
            },
        };
        if matches!(shape, TargeterShape::SelfOnly)
            && action_type == ActionType::Buff
            && engine.effect_created_by_slot(ctx.creature, slot).is_some()
        {
            return Step::Skipped;
        }

        if let Some(goal) = aim.position(engine, ctx.creature)
            && aim != Aim::Caster
            && let Err(step) = self.approach(engine, ctx, goal, engage_range(shape, range), ap_cost, report)
        {
            debug!(target: "runtime::ai", creature = %ctx.creature, ability = %id, ?step, "could not close in");
            return step;
        }

        match engine.activate_slot(slot) {
            Ok(Activation::Resolved { .. }) => Step::Resolved(id),
            Ok(Activation::Targeting(targeter)) => match self.complete(engine, ctx, targeter, aim) {
                Ok(()) => Step::Resolved(id),
                Err(error) => {
                    debug!(target: "runtime::ai", creature = %ctx.creature, ability = %id, %error, "selection abandoned");
                    if let Err(error) = engine.cancel_targeter(targeter) {
                        debug!(target: "runtime::ai", %targeter, %error, "cancel failed");
                    }
                    Step::Failed
                }
            },
            Err(error) => {
                debug!(target: "runtime::ai", creature = %ctx.creature, ability = %id, %error, "activation refused");
                Step::Failed
            }
        }
    }

    /// Walks until `goal` is within `reach`, keeping enough AP to cast afterwards.
    fn approach(
        &self,
        engine: &mut GameEngine,
        ctx: &AiContext<'_>,
        goal: Position,
        reach: u32,
        ap_cost: u32,
        report: &mut TurnReport,
    ) -> std::result::Result<(), Step> {
        let move_cost = engine.config().move_ap_cost;
        for _ in 0..engine.config().movement_loop_guard {
            let Some(position) = ctx.position(engine) else {
                return Err(Step::Failed);
            };
            if position.distance(goal) <= reach {
                return Ok(());
            }
            if ctx.ap(engine) < ap_cost + move_cost {
                return Err(Step::Failed);
            }
            match engine.move_towards(ctx.creature, goal, ctx.pathing) {
                Ok(next) if next != position => report.steps += 1,
                Ok(_) => return Err(Step::Failed),
                Err(MoveError::NoPath { .. } | MoveError::Immobilized(_)) => return Err(Step::Blocked),
                Err(MoveError::InsufficientAp { .. }) => return Err(Step::Exhausted),
                Err(_) => return Err(Step::Failed),
            }
        }
        Err(Step::Failed)
    }

    /// Drives an open targeter to resolution.
    fn complete(
        &self,
        engine: &mut GameEngine,
        ctx: &AiContext<'_>,
        targeter: TargeterId,
        aim: Aim,
    ) -> std::result::Result<(), TargetingError> {
        let is_area = engine
            .targeter(targeter)
            .ok_or(TargetingError::UnknownTargeter(targeter))?
            .spec
            .shape
            .is_area();
        if is_area {
            let point = aim
                .position(engine, ctx.creature)
                .ok_or(TargetingError::WrongShape)?;
            engine.select_point(targeter, point)?;
            return Ok(());
        }

        let first = match aim {
            Aim::Creature(id) => id,
            Aim::Caster | Aim::Point(_) => ctx.creature,
        };
        let mut outcome = engine.select_target(targeter, first)?;
        loop {
            let SelectOutcome::Pending { .. } = outcome else {
                return Ok(());
            };
            let next = {
                let open = engine
                    .targeter(targeter)
                    .ok_or(TargetingError::UnknownTargeter(targeter))?;
                if matches!(open.spec.mode, SelectionMode::Multi { .. }) {
                    None
                } else {
                    let origin = open.origin;
                    let pick = open
                        .eligible
                        .iter()
                        .filter(|id| !open.selected.contains(id))
                        .filter_map(|id| engine.creature(*id).map(|c| (c.position.distance(origin), *id)))
                        .min()
                        .map(|(_, id)| id);
                    Some(pick.ok_or(TargetingError::SelectionIncomplete {
                        needed: open.required(),
                        selected: open.selected.len(),
                    })?)
                }
            };
            match next {
                Some(target) => outcome = engine.select_target(targeter, target)?,
                None => {
                    engine.confirm_targeter(targeter)?;
                    return Ok(());
                }
            }
        }
    }
}

impl Default for TurnPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cones_and_lines_close_to_their_length() {
        let cone = TargeterShape::Cone {
            length: 4,
            half_angle_deg: 45.0,
        };
        assert_eq!(engage_range(cone, RangeBand::Short), 4);
        assert_eq!(engage_range(TargeterShape::Line { length: 6 }, RangeBand::Short), 6);
        assert_eq!(engage_range(TargeterShape::Circle { radius: 2 }, RangeBand::Long), 6);
        assert_eq!(engage_range(TargeterShape::List, RangeBand::Touch), 1);
    }
}
