//! Errors surfaced while driving an encounter.

use thiserror::Error;

use game_core::{AbilityError, CombatError, EntityId, ErrorSeverity, GameError, MoveError, TargetingError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Targeting(#[from] TargetingError),

    #[error(transparent)]
    Movement(#[from] MoveError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("creature {0} is not part of this runtime")]
    UnknownCreature(EntityId),

    #[error("callback queue still holds {pending} entries after draining")]
    CallbackOverflow { pending: usize },

    #[error("round hook '{hook}' failed: {message}")]
    Hook { hook: &'static str, message: String },
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Ability(e) => e.severity(),
            Self::Targeting(e) => e.severity(),
            Self::Movement(e) => e.severity(),
            Self::Combat(e) => e.severity(),
            Self::UnknownCreature(_) => ErrorSeverity::Validation,
            Self::CallbackOverflow { .. } => ErrorSeverity::Internal,
            Self::Hook { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Ability(e) => e.error_code(),
            Self::Targeting(e) => e.error_code(),
            Self::Movement(e) => e.error_code(),
            Self::Combat(e) => e.error_code(),
            Self::UnknownCreature(_) => "RUNTIME_UNKNOWN_CREATURE",
            Self::CallbackOverflow { .. } => "RUNTIME_CALLBACK_OVERFLOW",
            Self::Hook { .. } => "RUNTIME_HOOK_FAILED",
        }
    }
}
