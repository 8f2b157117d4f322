//! Move-and-attack routine for AP the ability phase left over.

use game_core::{EntityId, GameEngine, WeaponKind};
use tracing::debug;

use super::context::AiContext;
use crate::providers::TurnReport;

enum Engage {
    Attacked,
    Stepped,
    Stop,
}

/// Weapon fallback: pick the weakest reachable hostile, close in, swing.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicAttackAi;

impl BasicAttackAi {
    /// Spends AP on steps and attacks until nothing more can be done.
    ///
    /// Every pass re-picks the target, so a kill moves the routine on to the
    /// next hostile. The loop is bounded by the configured movement guard.
    pub fn run(&self, engine: &mut GameEngine, ctx: &AiContext<'_>, report: &mut TurnReport) {
        let guard = engine.config().movement_loop_guard;
        for _ in 0..guard {
            let Some(target) = self.pick_target(engine, ctx) else {
                break;
            };
            match self.engage(engine, ctx, target) {
                Engage::Attacked => report.attacks += 1,
                Engage::Stepped => report.steps += 1,
                Engage::Stop => break,
            }
        }
    }

    /// Lowest current HP first. Melee breaks ties on fewest attacks of
    /// opportunity along the way, ranged on distance; id settles the rest.
    pub fn pick_target(&self, engine: &GameEngine, ctx: &AiContext<'_>) -> Option<EntityId> {
        let me = engine.creature(ctx.creature)?;
        let (origin, weapon) = (me.position, me.weapon);
        engine
            .visible_hostiles(ctx.creature, engine.config().detection_range)
            .into_iter()
            .filter_map(|id| {
                let target = engine.creature(id)?;
                let distance = origin.distance(target.position);
                let reachable = distance <= weapon.range
                    || ctx
                        .pathing
                        .path_cost(engine.state(), ctx.creature, origin, target.position)
                        .is_some();
                if !reachable {
                    return None;
                }
                let tie = match weapon.kind {
                    WeaponKind::Melee => {
                        ctx.pathing
                            .provoked_reactions(engine.state(), ctx.creature, origin, target.position)
                    }
                    WeaponKind::Ranged => distance,
                };
                Some((target.hp.current, tie, id))
            })
            .min()
            .map(|(_, _, id)| id)
    }

    fn engage(&self, engine: &mut GameEngine, ctx: &AiContext<'_>, target: EntityId) -> Engage {
        let Some((origin, reach)) = engine.creature(ctx.creature).map(|c| (c.position, c.weapon.range)) else {
            return Engage::Stop;
        };
        let Some(goal) = engine.creature(target).map(|c| c.position) else {
            return Engage::Stop;
        };

        if origin.distance(goal) <= reach {
            return match engine.basic_attack(ctx.creature, target) {
                Ok(outcome) => {
                    debug!(
                        target: "runtime::ai",
                        attacker = %ctx.creature,
                        defender = %target,
                        hit = outcome.attack.hit,
                        "basic attack"
                    );
                    Engage::Attacked
                }
                Err(error) => {
                    debug!(target: "runtime::ai", creature = %ctx.creature, %error, "attack stopped");
                    Engage::Stop
                }
            };
        }

        match engine.move_towards(ctx.creature, goal, ctx.pathing) {
            Ok(position) if position != origin => Engage::Stepped,
            Ok(_) => Engage::Stop,
            Err(error) => {
                debug!(target: "runtime::ai", creature = %ctx.creature, %error, "approach stopped");
                Engage::Stop
            }
        }
    }
}
