//! Common error infrastructure for game-core.
//!
//! Domain-specific errors (`EffectError`, `AbilityError`, `TargetingError`,
//! `MoveError`, `CombatError`) are defined next to the systems that raise
//! them. This module provides the shared classification they all implement.
//!
//! Content scripts never see a panic from the core: an invariant violation
//! coming from content is reported through one of these errors, logged, and
//! the offending operation is skipped.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed later (not enough AP yet, target moved)
/// - **Validation**: the request is wrong and should not be retried unchanged
/// - **Internal**: bookkeeping disagrees with itself and needs investigation
/// - **Fatal**: the state can no longer be trusted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative action.
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - game state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all game-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a stable error code for logging and metrics.
    ///
    /// Error codes follow the pattern `DOMAIN_KIND`, e.g. `EFFECT_NOT_FOUND`.
    fn error_code(&self) -> &'static str;

    /// Returns true if this error is potentially recoverable.
    fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }
}
