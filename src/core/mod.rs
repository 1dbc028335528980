//! Core engine types: ids, participants, the game record, actions, RNG,
//! configuration and errors.
//!
//! Everything else in the crate reads and writes the `Game` record defined
//! here; no component keeps a private copy that could drift from it.

pub mod action;
pub mod config;
pub mod error;
pub mod player;
pub mod rng;
pub mod state;

pub use action::{Action, Actor, TeamList};
pub use config::{
    config_for, required_team_size, DisconnectPolicy, EngineConfig, GameSettings, MissionConfig,
    DOUBLE_FAIL_MIN_PARTICIPANTS, DOUBLE_FAIL_ROUND, MAX_PARTICIPANTS, MAX_REJECTIONS,
    MIN_PARTICIPANTS, ROUNDS_TO_WIN, ROUND_COUNT,
};
pub use error::{GameError, Result};
pub use player::{GameCode, Participant, ParticipantId, Seat};
pub use rng::GameRng;
pub use state::{Ballot, Card, Game, MissionOutcome, Phase, VoteRecord, WinReason};
