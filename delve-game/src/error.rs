//! Error taxonomy for the delving engine.
//!
//! Gameplay failures (a trap going off, a lost wager) are never errors; they
//! are terminal encounter outcomes. Everything here is a rejected action the
//! caller must surface, a variant the engine cannot build, or a storage write
//! that did not land.

use thiserror::Error;

use crate::run::RunStatus;

/// Recoverable failures raised by engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DelveError {
    #[error("a run already exists for {date}")]
    DuplicateRunDate { date: String },
    #[error("run {id} not found")]
    RunNotFound { id: String },
    #[error("run {id} is not active")]
    RunNotActive { id: String },
    #[error("run {id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        id: String,
        from: RunStatus,
        to: RunStatus,
    },
    #[error("date {date:?} is not a valid YYYY-MM-DD calendar date")]
    InvalidDate { date: String },
    #[error("step history goes backwards at {date} (previous {previous})")]
    UnorderedHistory { date: String, previous: String },
    #[error("node {id} not found")]
    NodeNotFound { id: String },
    #[error("node {id} is not reachable from the current position")]
    InvalidMove { id: String },
    #[error("node {id} is locked for {turns_remaining} more moves")]
    NodeLockedOut { id: String, turns_remaining: u32 },
    #[error("unsupported encounter type {0:?}")]
    UnsupportedEncounter(String),
    #[error("an encounter is already in progress at {node_id}")]
    EncounterInProgress { node_id: String },
    #[error("no encounter is in progress")]
    NoActiveEncounter,
    #[error("encounter has not reached a terminal state")]
    EncounterNotFinished,
    #[error("encounter is already complete")]
    EncounterAlreadyComplete,
    #[error("action {action} does not apply to a {kind} encounter")]
    ActionMismatch {
        action: &'static str,
        kind: &'static str,
    },
    #[error("selection {0:?} is not valid for this encounter")]
    InvalidSelection(String),
    #[error("tile ({row}, {col}) is already revealed")]
    TileAlreadyRevealed { row: usize, col: usize },
    #[error("trade option {option} was already used")]
    TradeOptionUsed { option: char },
    #[error("equipped weapon cannot be used against a monster of value {monster}")]
    WeaponUnusable { monster: u8 },
    #[error("room cannot be skipped right now")]
    SkipUnavailable,
    #[error("storage write for {key} failed: {message}")]
    Persistence { key: String, message: String },
}

impl DelveError {
    /// True for the "no state machine for this kind" condition.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedEncounter(_))
    }

    /// True when the underlying storage rejected a write.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_distinguishable() {
        let unsupported = DelveError::UnsupportedEncounter("boss_lair".into());
        assert!(unsupported.is_unsupported());
        assert!(!unsupported.is_persistence());

        let write = DelveError::Persistence {
            key: "delve.progression".into(),
            message: "disk full".into(),
        };
        assert!(write.is_persistence());
        assert_eq!(
            write.to_string(),
            "storage write for delve.progression failed: disk full"
        );
    }

    #[test]
    fn transition_message_uses_wire_names() {
        let err = DelveError::InvalidStatusTransition {
            id: "run-2024-01-15".into(),
            from: RunStatus::Queued,
            to: RunStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "run run-2024-01-15 cannot move from queued to completed"
        );
    }
}
