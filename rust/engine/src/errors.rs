use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hand::PlayerId;

/// Coarse classification of a [`GameError`], used by callers to map failures
/// onto their own transport (status codes, exit codes, log levels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    PreconditionFailed,
    /// Internal inconsistency. Never caused by user input.
    InvariantViolation,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Session name must not be empty")]
    EmptyName,
    #[error("Player {0} is not in this session")]
    NotInSession(PlayerId),
    #[error("Player {0} is not part of this session")]
    NotParticipant(PlayerId),
    #[error("Only the session owner can do that (player {0} is not the owner)")]
    NotOwner(PlayerId),
    #[error("It's not player {actual}'s turn (expected player {expected})")]
    NotYourTurn { expected: PlayerId, actual: PlayerId },
    #[error("Player {0} already joined this session")]
    AlreadyJoined(PlayerId),
    #[error("Player {0} is already ready")]
    AlreadyReady(PlayerId),
    #[error("Session is full ({max} players)")]
    SessionFull { max: usize },
    #[error("Session already started")]
    AlreadyStarted,
    #[error("Session has already ended")]
    SessionEnded,
    #[error("Game already has a result")]
    GameAlreadyEnded,
    #[error("Session is not active")]
    NotActive,
    #[error("Session has not ended yet")]
    NotEnded,
    #[error("Not enough players: {actual} joined, {required} required")]
    NotEnoughPlayers { required: usize, actual: usize },
    #[error("All players must be ready")]
    PlayersNotReady,
    #[error("Blackjack can only be checked right after the deal")]
    InvalidWindow,
    #[error("Deck holds {available} cards, {required} needed")]
    InsufficientCards { required: usize, available: usize },
    #[error("No more cards in the deck")]
    EmptyDeck,
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotInSession(_) => ErrorKind::NotFound,
            GameError::NotParticipant(_) | GameError::NotOwner(_) | GameError::NotYourTurn { .. } => {
                ErrorKind::Forbidden
            }
            GameError::AlreadyJoined(_)
            | GameError::AlreadyReady(_)
            | GameError::SessionFull { .. }
            | GameError::AlreadyStarted
            | GameError::SessionEnded
            | GameError::GameAlreadyEnded => ErrorKind::Conflict,
            GameError::EmptyName
            | GameError::NotActive
            | GameError::NotEnded
            | GameError::NotEnoughPlayers { .. }
            | GameError::PlayersNotReady
            | GameError::InvalidWindow
            | GameError::InsufficientCards { .. }
            | GameError::EmptyDeck => ErrorKind::PreconditionFailed,
            GameError::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    /// Stable machine-readable code, e.g. `"not_your_turn"`.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::EmptyName => "empty_name",
            GameError::NotInSession(_) => "not_in_session",
            GameError::NotParticipant(_) => "not_participant",
            GameError::NotOwner(_) => "not_owner",
            GameError::NotYourTurn { .. } => "not_your_turn",
            GameError::AlreadyJoined(_) => "already_joined",
            GameError::AlreadyReady(_) => "already_ready",
            GameError::SessionFull { .. } => "session_full",
            GameError::AlreadyStarted => "already_started",
            GameError::SessionEnded => "session_ended",
            GameError::GameAlreadyEnded => "game_already_ended",
            GameError::NotActive => "not_active",
            GameError::NotEnded => "not_ended",
            GameError::NotEnoughPlayers { .. } => "not_enough_players",
            GameError::PlayersNotReady => "players_not_ready",
            GameError::InvalidWindow => "invalid_window",
            GameError::InsufficientCards { .. } => "insufficient_cards",
            GameError::EmptyDeck => "empty_deck",
            GameError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_validation_failures() {
        assert_eq!(GameError::NotInSession(3).kind(), ErrorKind::NotFound);
        assert_eq!(GameError::NotOwner(3).kind(), ErrorKind::Forbidden);
        assert_eq!(
            GameError::NotYourTurn {
                expected: 1,
                actual: 2
            }
            .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            GameError::SessionFull { max: 7 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(GameError::AlreadyStarted.kind(), ErrorKind::Conflict);
        assert_eq!(GameError::EmptyDeck.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(
            GameError::InvariantViolation("x".into()).kind(),
            ErrorKind::InvariantViolation
        );
    }

    #[test]
    fn messages_name_the_players_involved() {
        let err = GameError::NotYourTurn {
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.to_string(), "It's not player 2's turn (expected player 1)");
        assert_eq!(err.code(), "not_your_turn");
    }
}
