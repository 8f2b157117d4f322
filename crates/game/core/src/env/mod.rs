//! Collaborators injected into the engine: randomness and pathing.
mod pathing;
mod rng;

pub use pathing::{GridPathing, PathingOracle};
pub use rng::{GameRng, SeededRng, compute_seed};

#[cfg(test)]
pub(crate) use rng::ScriptedRng;

use crate::error::{ErrorSeverity, GameError};
use crate::state::{EntityId, Position};

/// Errors from creature movement.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("creature {0} not found")]
    UnknownCreature(EntityId),

    #[error("creature {0} cannot move")]
    Immobilized(EntityId),

    #[error("creature {0} is dead")]
    Dead(EntityId),

    #[error("not enough action points: need {needed}, have {available}")]
    InsufficientAp { needed: u32, available: u32 },

    #[error("no path from {from} toward {to}")]
    NoPath { from: Position, to: Position },

    #[error("tile {0} is occupied")]
    Occupied(Position),
}

impl GameError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownCreature(_) => ErrorSeverity::Validation,
            Self::Dead(_) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCreature(_) => "MOVE_UNKNOWN_CREATURE",
            Self::Immobilized(_) => "MOVE_IMMOBILIZED",
            Self::Dead(_) => "MOVE_DEAD",
            Self::InsufficientAp { .. } => "MOVE_INSUFFICIENT_AP",
            Self::NoPath { .. } => "MOVE_NO_PATH",
            Self::Occupied(_) => "MOVE_OCCUPIED",
        }
    }
}
