//! Path-scoped writes.
//!
//! A `Patch` touches only the fields it names, so two devices writing
//! different paths at once never clobber each other. Preconditions pin the
//! phase and proposal a write was made against; a ballot cast for a team
//! that has since been replaced is dropped instead of leaking into the next
//! vote.

use serde::{Deserialize, Serialize};

use crate::core::{Ballot, Game, GameError, GameSettings, Participant, ParticipantId, Phase, Result};

/// One field-level write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "path")]
pub enum FieldWrite {
    /// `settings`
    Settings { settings: GameSettings },
    /// `participants/<id>`; `None` removes the entry.
    Participant { id: ParticipantId, participant: Option<Participant> },
    /// `participants/<id>/ready`
    Ready { id: ParticipantId, ready: bool },
    /// `votes/<id>`
    Ballot { id: ParticipantId, ballot: Ballot },
}

impl FieldWrite {
    fn apply(&self, game: &mut Game) {
        match self {
            FieldWrite::Settings { settings } => game.settings = *settings,
            FieldWrite::Participant { id, participant: Some(p) } => {
                game.participants.insert(id.clone(), p.clone());
            }
            FieldWrite::Participant { id, participant: None } => {
                game.participants.remove(id);
            }
            // Writing below a removed participant is a no-op, not a resurrection.
            FieldWrite::Ready { id, ready } => {
                if let Some(p) = game.participants.get_mut(id) {
                    p.ready = *ready;
                }
            }
            FieldWrite::Ballot { id, ballot } => {
                game.ballots.insert(id.clone(), *ballot);
            }
        }
    }
}

/// A set of field writes with optional preconditions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub expect_phase: Option<Phase>,
    pub expect_proposal: Option<u32>,
    pub writes: Vec<FieldWrite>,
}

impl Patch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn expect_phase(mut self, phase: Phase) -> Self {
        self.expect_phase = Some(phase);
        self
    }

    #[must_use]
    pub fn expect_proposal(mut self, proposal_number: u32) -> Self {
        self.expect_proposal = Some(proposal_number);
        self
    }

    #[must_use]
    pub fn write(mut self, write: FieldWrite) -> Self {
        self.writes.push(write);
        self
    }

    /// Fail with `TransactionAborted` when a precondition no longer holds.
    ///
    /// Ballots are first-write-wins: a second ballot from the same
    /// participant fails with `AlreadyVoted`.
    pub fn check(&self, game: &Game) -> Result<()> {
        if self.expect_phase.is_some_and(|phase| phase != game.phase) {
            return Err(GameError::TransactionAborted("phase changed"));
        }
        if self.expect_proposal.is_some_and(|n| n != game.proposal_number) {
            return Err(GameError::TransactionAborted("proposal changed"));
        }
        for write in &self.writes {
            if let FieldWrite::Ballot { id, .. } = write {
                if !game.contains(id) {
                    return Err(GameError::UnknownParticipant(id.clone()));
                }
                if game.ballots.contains_key(id) {
                    return Err(GameError::AlreadyVoted(id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Apply the writes after checking preconditions.
    pub fn apply(&self, game: &mut Game) -> Result<()> {
        self.check(game)?;
        for write in &self.writes {
            write.apply(game);
        }
        Ok(())
    }
}
