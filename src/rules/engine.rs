//! Rules engine trait.
//!
//! A rules engine owns every phase transition of the shared record:
//! - `apply_action`: validate and apply one participant or host input
//! - `pending_step` / `advance`: detect and perform the transition that
//!   fires once all inputs are collected
//! - `is_terminal`: read the outcome once the game is over
//!
//! Engines mutate a `Game` value in place. The sync layer decides how that
//! value reaches the shared store.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Action, Actor, EngineConfig, Game, ParticipantId, Phase, Result, WinReason};
use crate::roles::Team;

/// Final outcome of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// `None` when the game was abandoned.
    pub winner: Option<Team>,
    pub reason: Option<WinReason>,
    pub assassination_target: Option<ParticipantId>,
}

impl GameResult {
    /// Check if a team won.
    #[must_use]
    pub fn is_winner(&self, team: Team) -> bool {
        self.winner == Some(team)
    }
}

/// A phase change produced by an engine call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

/// Transitions that fire once every expected input is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Everyone has seen their role.
    RolesConfirmed,
    /// Every participant has cast a ballot.
    VoteComplete,
    /// Every team member has played a card.
    MissionComplete,
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `apply_action` must leave `game` untouched when it returns an error
/// - `advance` must be idempotent: once a step's guard is set, calling it
///   again on the same record returns `None`
/// - `is_terminal`: return `None` while the game continues
pub trait RulesEngine {
    /// Get the engine configuration.
    fn config(&self) -> &EngineConfig;

    /// Apply one input, returning the phase change it caused, if any.
    fn apply_action(&mut self, game: &mut Game, actor: &Actor, action: &Action) -> Result<Option<Transition>>;

    /// The collection step that is complete but not yet processed.
    fn pending_step(&self, game: &Game) -> Option<Step>;

    /// Perform the pending step, if any.
    fn advance(&mut self, game: &mut Game) -> Option<Transition>;

    /// Check if the game is over.
    fn is_terminal(&self, game: &Game) -> Option<GameResult>;

    // === Convenience Methods ===

    /// Pause an observer should take before performing `step`.
    fn delay_for(&self, _step: Step, _game: &Game) -> Duration {
        Duration::ZERO
    }

    /// Advance until no step is pending.
    fn settle(&mut self, game: &mut Game) -> Vec<Transition> {
        std::iter::from_fn(|| self.advance(game)).collect()
    }
}
