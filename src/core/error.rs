//! Typed engine errors.
//!
//! One variant per failure category; every engine operation either fully
//! succeeds or returns exactly one of these with no partial state change.
//! All variants carry enough structured context to render a human-readable
//! message without consulting game state.

use thiserror::Error;

use super::player::PlayerId;

/// Errors produced by engine operations.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Malformed input: bad quantity, unknown action type, etc.
    /// No state change.
    #[error("invalid request: {reason}")]
    Validation { reason: String },

    /// A game rule rejected the request: insufficient funds, insufficient
    /// shares, not enough market availability. No state change.
    #[error("rule violation: {reason}")]
    BusinessRule { reason: String },

    /// The game is not in the state the operation requires (game complete,
    /// not the caller's turn, no exclusion phase active).
    #[error("conflict: expected {expected}, but game is {actual}")]
    StateConflict { expected: String, actual: String },

    /// The caller lacks the leadership role the operation requires, or a
    /// director attempted to veto another player's event.
    #[error("{player} may not do this: {reason}")]
    Leadership { player: PlayerId, reason: String },

    /// An entity id did not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An internal invariant was violated. Indicates a bug or corrupted
    /// data, not a user error.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl EngineError {
    /// Shorthand for a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Shorthand for a business-rule error.
    pub fn rule(reason: impl Into<String>) -> Self {
        Self::BusinessRule {
            reason: reason.into(),
        }
    }

    /// Shorthand for a state conflict.
    pub fn conflict(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::StateConflict {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for an internal invariant violation.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}

/// Engine result alias.
pub type EngineResult<T> = Result<T, EngineError>;
