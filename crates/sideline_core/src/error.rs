use thiserror::Error;

use crate::availability::Ineligibility;
use crate::clock::GameOperation;
use crate::models::{GameId, GameStatus, Half, PlayerId, PositionId, RecordId};
use crate::substitution::{BatchFailure, SubstitutionRequest, SubstitutionStep};

/// Failure reported by a repository implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} {key} already exists with different content")]
    Conflict { entity: &'static str, key: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Cannot {operation} while game is {status} (half {half}, running: {running})")]
    InvalidTransition { operation: GameOperation, status: GameStatus, half: Half, running: bool },

    #[error("Player {player_id} already has open interval {record_id} in game {game_id}")]
    DuplicateOpenInterval { game_id: GameId, player_id: PlayerId, record_id: RecordId },

    #[error("Substitution {request} stopped at {failed_step} after {completed:?}: {source}")]
    PartialSubstitutionFailure {
        request: SubstitutionRequest,
        completed: Vec<SubstitutionStep>,
        failed_step: SubstitutionStep,
        source: Box<GameError>,
    },

    #[error("Player {player_id} cannot be fielded: {reason}")]
    EligibilityViolation { player_id: PlayerId, reason: Ineligibility },

    #[error("Position {position_id} is already held by {player_id}")]
    PositionOccupied { position_id: PositionId, player_id: PlayerId },

    #[error("Player {player_id} does not hold position {position_id}")]
    PositionMismatch { position_id: PositionId, player_id: PlayerId, occupant: Option<PlayerId> },

    #[error("Lineup already has {limit} players, cannot fill {position_id}")]
    LineupFull { position_id: PositionId, limit: u32 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Batch(Box<BatchFailure>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BatchFailure> for GameError {
    fn from(failure: BatchFailure) -> Self {
        GameError::Batch(Box::new(failure))
    }
}

impl GameError {
    /// Whether re-reading authoritative state and retrying can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GameError::InvalidTransition { .. } => true,
            GameError::DuplicateOpenInterval { .. } => true,
            GameError::PartialSubstitutionFailure { .. } => true,
            GameError::Batch(failure) => failure.error.is_recoverable(),
            GameError::Store(StoreError::Unavailable(_)) => true,
            GameError::Store(StoreError::Conflict { .. }) => true,
            GameError::PositionMismatch { .. } => true,
            GameError::LineupFull { .. } => false,
            GameError::EligibilityViolation { .. } => false,
            GameError::PositionOccupied { .. } => false,
            GameError::Configuration(_) => false,
            GameError::NotFound { .. } => false,
            GameError::Store(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        let transition = GameError::InvalidTransition {
            operation: GameOperation::Pause,
            status: GameStatus::Scheduled,
            half: Half::First,
            running: false,
        };
        assert!(transition.is_recoverable());
        assert!(!GameError::Configuration("half length missing".into()).is_recoverable());
        assert!(GameError::from(StoreError::Unavailable("offline".into())).is_recoverable());
        assert!(!GameError::LineupFull { position_id: "SUB".into(), limit: 7 }.is_recoverable());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = GameError::InvalidTransition {
            operation: GameOperation::Resume,
            status: GameStatus::Halftime,
            half: Half::First,
            running: false,
        };
        assert_eq!(
            err.to_string(),
            "Cannot resume while game is halftime (half 1, running: false)"
        );
    }
}
