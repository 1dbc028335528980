//! The shared game record.
//!
//! ## Game
//!
//! One record per game code, read and written by every device. Every
//! client re-derives its view from the latest snapshot of this record, so
//! nothing here is private to a component.
//!
//! Collections use `im` persistent structures: each push hands every
//! subscriber a full snapshot, and cloning one is O(1).

use im::{HashMap as ImHashMap, HashSet as ImHashSet, Vector};
use serde::{Deserialize, Serialize};

use super::config::{config_for, required_team_size, GameSettings, MissionConfig};
use super::error::Result;
use super::player::{GameCode, Participant, ParticipantId, Seat};
use crate::roles::{RoleKey, Team};

/// Game phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Lobby,
    RoleReveal,
    TeamSelection,
    Voting,
    Mission,
    Assassination,
    GameOver,
}

impl Phase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Phase::GameOver
    }

    /// Phases during which `proposed_team` must be full.
    #[must_use]
    pub fn has_team(self) -> bool {
        matches!(self, Phase::Voting | Phase::Mission)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::RoleReveal => "role reveal",
            Phase::TeamSelection => "team selection",
            Phase::Voting => "voting",
            Phase::Mission => "mission",
            Phase::Assassination => "assassination",
            Phase::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// A vote on the proposed team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ballot {
    Approve,
    Reject,
}

/// A secret mission contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Card {
    Success,
    Fail,
}

/// Result of a completed round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    Success,
    Fail,
}

/// Why the game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    FiveRejections,
    EvilWonRounds,
    MerlinAssassinated,
    AssassinationFailed,
    ParticipantLeft,
}

impl std::fmt::Display for WinReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            WinReason::FiveRejections => "Five team proposals were rejected in a row!",
            WinReason::EvilWonRounds => "Evil won 3 missions!",
            WinReason::MerlinAssassinated => "The Assassin found and killed Merlin!",
            WinReason::AssassinationFailed => "The Assassin failed to find Merlin!",
            WinReason::ParticipantLeft => "A participant left and the game was abandoned.",
        };
        f.write_str(text)
    }
}

/// Tally of the most recent vote, kept for the reveal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub approved: bool,
    pub approvers: Vector<ParticipantId>,
    pub rejecters: Vector<ParticipantId>,
}

/// The single shared record for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub code: GameCode,
    pub phase: Phase,
    pub participants: ImHashMap<ParticipantId, Participant>,
    #[serde(default)]
    pub seat_order: Vector<ParticipantId>,
    #[serde(default)]
    pub settings: GameSettings,

    // === Round progression ===
    #[serde(default)]
    pub current_round: usize,
    #[serde(default)]
    pub round_results: Vector<MissionOutcome>,
    #[serde(default)]
    pub rejection_count: u8,
    #[serde(default)]
    pub current_leader_id: Option<ParticipantId>,
    #[serde(default)]
    pub leader_index: usize,
    /// Team proposals made so far. Conditional writes carry it so a ballot
    /// aimed at one proposal can never land on the next.
    #[serde(default)]
    pub proposal_number: u32,

    // === Inputs for the active proposal / mission ===
    #[serde(default)]
    pub proposed_team: Vector<ParticipantId>,
    #[serde(default)]
    pub ballots: ImHashMap<ParticipantId, Ballot>,
    /// Anonymous: no link from a card back to its submitter.
    #[serde(default)]
    pub submitted_cards: Vector<Card>,
    /// Who has played this round, unordered.
    #[serde(default)]
    pub card_submitters: ImHashSet<ParticipantId>,

    // === One-shot guards ===
    #[serde(default)]
    pub votes_tallied: bool,
    #[serde(default)]
    pub round_processed: bool,

    // === Reveal data ===
    #[serde(default)]
    pub last_vote: Option<VoteRecord>,
    /// Cards of the last scored round in shuffled reveal order.
    #[serde(default)]
    pub last_mission_cards: Vector<Card>,

    // === Outcome (GAME_OVER only) ===
    #[serde(default)]
    pub winner: Option<Team>,
    #[serde(default)]
    pub win_reason: Option<WinReason>,
    #[serde(default)]
    pub assassination_target: Option<ParticipantId>,
}

impl Game {
    /// Fresh lobby record.
    #[must_use]
    pub fn new(code: GameCode, settings: GameSettings) -> Self {
        Self {
            code,
            phase: Phase::Lobby,
            participants: ImHashMap::new(),
            seat_order: Vector::new(),
            settings,
            current_round: 0,
            round_results: Vector::new(),
            rejection_count: 0,
            current_leader_id: None,
            leader_index: 0,
            proposal_number: 0,
            proposed_team: Vector::new(),
            ballots: ImHashMap::new(),
            submitted_cards: Vector::new(),
            card_submitters: ImHashSet::new(),
            votes_tallied: false,
            round_processed: false,
            last_vote: None,
            last_mission_cards: Vector::new(),
            winner: None,
            win_reason: None,
            assassination_target: None,
        }
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Head count the table was dealt for.
    ///
    /// Fixed by the seat order once roles are dealt, so a participant who
    /// goes missing leaves a vacancy rather than a smaller table. Before
    /// seating this is the lobby head count.
    #[must_use]
    pub fn table_size(&self) -> usize {
        if self.seat_order.is_empty() {
            self.participants.len()
        } else {
            self.seat_order.len()
        }
    }

    /// Table row for the dealt head count.
    pub fn mission_config(&self) -> Result<MissionConfig> {
        config_for(self.table_size())
    }

    /// Team size the current round requires, `None` when the count is unsupported.
    #[must_use]
    pub fn required_team_size(&self) -> Option<usize> {
        required_team_size(self.current_round, self.table_size())
    }

    /// Look up a participant, yielding a vacancy when they are gone.
    #[must_use]
    pub fn seat<'a>(&'a self, id: &'a ParticipantId) -> Seat<'a> {
        match self.participants.get(id) {
            Some(participant) => Seat::Occupied(id, participant),
            None => Seat::Vacant(id),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    #[must_use]
    pub fn role_of(&self, id: &ParticipantId) -> Option<RoleKey> {
        self.participants.get(id).and_then(|p| p.role)
    }

    #[must_use]
    pub fn team_of(&self, id: &ParticipantId) -> Option<Team> {
        self.role_of(id).map(RoleKey::team)
    }

    #[must_use]
    pub fn is_leader(&self, id: &ParticipantId) -> bool {
        self.current_leader_id.as_ref() == Some(id)
    }

    #[must_use]
    pub fn is_on_team(&self, id: &ParticipantId) -> bool {
        self.proposed_team.contains(id)
    }

    /// Seats in turn order, falling back to id order before seating.
    ///
    /// Ids in `seat_order` whose participant has left come back as vacancies.
    pub fn seats(&self) -> Vec<Seat<'_>> {
        if self.seat_order.is_empty() {
            let mut ids: Vec<_> = self.participants.keys().collect();
            ids.sort();
            ids.into_iter().map(|id| self.seat(id)).collect()
        } else {
            self.seat_order.iter().map(|id| self.seat(id)).collect()
        }
    }

    /// Successes and fails so far.
    #[must_use]
    pub fn score(&self) -> (usize, usize) {
        let successes = self
            .round_results
            .iter()
            .filter(|r| **r == MissionOutcome::Success)
            .count();
        (successes, self.round_results.len() - successes)
    }

    /// Participants whose input the current phase is still waiting on.
    pub fn pending_inputs(&self) -> Vec<ParticipantId> {
        let ids = self.seats().into_iter().map(|s| s.id().clone());
        match self.phase {
            Phase::RoleReveal => ids
                .filter(|id| self.participants.get(id).is_some_and(|p| !p.ready))
                .collect(),
            Phase::TeamSelection => self.current_leader_id.iter().cloned().collect(),
            Phase::Voting => ids
                .filter(|id| self.contains(id) && !self.ballots.contains_key(id))
                .collect(),
            Phase::Mission => self
                .proposed_team
                .iter()
                .filter(|id| !self.card_submitters.contains(*id))
                .cloned()
                .collect(),
            Phase::Assassination => self
                .seats()
                .into_iter()
                .filter(|s| s.role() == Some(RoleKey::Assassin))
                .map(|s| s.id().clone())
                .collect(),
            Phase::Lobby | Phase::GameOver => Vec::new(),
        }
    }
}
