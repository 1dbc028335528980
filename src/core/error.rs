//! Error taxonomy for the engine.
//!
//! Configuration errors are fatal and raised before any record exists.
//! Rule violations reject a single action and leave the record untouched.
//! `TransactionAborted` and the duplicate-input variants are benign: they
//! mean another writer already handled the input, and the caller must not
//! retry the same submission.

use thiserror::Error;

use super::player::ParticipantId;
use super::state::Phase;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GameError>;

/// Every way an engine operation can fail.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// Participant count has no row in the configuration table.
    #[error("no configuration for {0} participants (supported: 5-10)")]
    Configuration(usize),

    /// Role assignment was asked to deal for an unsupported count.
    #[error("invalid participant count {0}: must be 5-10")]
    InvalidPlayerCount(usize),

    /// A role key outside the catalog.
    #[error("unknown role key `{0}`")]
    UnknownRole(String),

    /// A concurrent writer won the race, or the precondition no longer holds.
    #[error("transaction aborted: {0}")]
    TransactionAborted(&'static str),

    #[error("action not allowed during {0}")]
    WrongPhase(Phase),

    #[error("participant {0} is not in this game")]
    UnknownParticipant(ParticipantId),

    #[error("participant {0} is not the current leader")]
    NotLeader(ParticipantId),

    #[error("team must have exactly {expected} members, got {actual}")]
    WrongTeamSize { expected: usize, actual: usize },

    #[error("participant {0} appears more than once in the team")]
    DuplicateTeamMember(ParticipantId),

    #[error("participant {0} has already voted on this team")]
    AlreadyVoted(ParticipantId),

    #[error("participant {0} is not on the mission team")]
    NotOnTeam(ParticipantId),

    #[error("participant {0} has already played a card this round")]
    AlreadySubmitted(ParticipantId),

    #[error("participant {0} is loyal and may only play success")]
    IllegalCard(ParticipantId),

    #[error("participant {0} is not the assassin")]
    NotAssassin(ParticipantId),

    #[error("participant {0} is not a valid assassination target")]
    InvalidTarget(ParticipantId),

    #[error("seat of {0} is frozen once roles are assigned")]
    SeatFrozen(ParticipantId),

    /// Only the host may perform this action.
    #[error("only the host may do this")]
    HostOnly,

    /// Only a participant may perform this action.
    #[error("only a participant may do this")]
    ParticipantOnly,

    #[error("game {0} does not exist")]
    UnknownGame(String),

    #[error("game {0} already exists")]
    GameExists(String),
}

impl GameError {
    /// True when the error only means "someone else already handled it".
    ///
    /// Callers swallow these instead of surfacing them to the user.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            GameError::TransactionAborted(_)
                | GameError::AlreadyVoted(_)
                | GameError::AlreadySubmitted(_)
        )
    }

    /// True for errors raised before any state is created.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::Configuration(_) | GameError::InvalidPlayerCount(_)
        )
    }
}
