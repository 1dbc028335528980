//! What the shared host display shows.
//!
//! The host never sees roles until the game is over; the only secrets it
//! reveals are the vote split after a tally and the shuffled mission cards.

use serde::Serialize;

use crate::core::{
    config_for, Card, Game, GameCode, MissionOutcome, ParticipantId, Phase, WinReason, MAX_PARTICIPANTS,
    MAX_REJECTIONS, MIN_PARTICIPANTS,
};
use crate::roles::{RoleKey, Team};
use crate::rules::fails_required;

/// Whether the lobby can start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "missing")]
pub enum StartStatus {
    NeedMore(usize),
    TooMany,
    Ready,
}

impl StartStatus {
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        if count < MIN_PARTICIPANTS {
            StartStatus::NeedMore(MIN_PARTICIPANTS - count)
        } else if count > MAX_PARTICIPANTS {
            StartStatus::TooMany
        } else {
            StartStatus::Ready
        }
    }

    #[must_use]
    pub fn can_start(self) -> bool {
        self == StartStatus::Ready
    }
}

impl std::fmt::Display for StartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartStatus::NeedMore(n) => write!(f, "Need {n} more players"),
            StartStatus::TooMany => write!(f, "Too many players (max {MAX_PARTICIPANTS})"),
            StartStatus::Ready => f.write_str("Start Game"),
        }
    }
}

/// One slot of the mission track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissionToken {
    /// 1-based for display.
    pub number: usize,
    pub team_size: usize,
    /// This round needs two fails to fail.
    pub double_fail: bool,
    pub result: Option<MissionOutcome>,
    pub current: bool,
}

/// One seat around the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub id: ParticipantId,
    pub name: String,
    pub vacant: bool,
    pub leader: bool,
    pub on_team: bool,
    pub ready: bool,
    pub has_voted: bool,
    /// Only revealed once the game is over.
    pub role: Option<RoleKey>,
}

/// Names behind the last tally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoteReveal {
    pub approved: bool,
    pub approvers: Vec<String>,
    pub rejecters: Vec<String>,
}

/// Everything the host display renders, derived from one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostView {
    pub code: GameCode,
    pub phase: Phase,
    pub participant_count: usize,
    /// `Some` only in the lobby.
    pub start_status: Option<StartStatus>,
    pub mission_track: Vec<MissionToken>,
    pub vote_track: u8,
    pub max_rejections: u8,
    pub seats: Vec<SeatView>,
    pub leader_name: Option<String>,
    pub required_team_size: Option<usize>,
    /// Seats the current phase is still waiting on.
    pub waiting_on: Vec<String>,
    pub last_vote: Option<VoteReveal>,
    pub last_mission_cards: Vec<Card>,
    pub score: (usize, usize),
    pub winner: Option<Team>,
    pub win_reason: Option<WinReason>,
    pub assassination_target: Option<String>,
}

impl HostView {
    #[must_use]
    pub fn derive(game: &Game) -> Self {
        let count = game.participant_count();
        let over = game.phase.is_terminal();
        let name_of = |id: &ParticipantId| game.seat(id).name().to_owned();

        let seats: Vec<SeatView> = game
            .seats()
            .into_iter()
            .map(|seat| {
                let id = seat.id();
                SeatView {
                    id: id.clone(),
                    name: seat.name().to_owned(),
                    vacant: seat.is_vacant(),
                    leader: game.is_leader(id),
                    on_team: game.phase.has_team() && game.is_on_team(id),
                    ready: seat.participant().is_some_and(|p| p.ready),
                    has_voted: game.ballots.contains_key(id),
                    role: if over { seat.role() } else { None },
                }
            })
            .collect();

        if game.phase != Phase::Lobby && seats.iter().any(|s| s.vacant) {
            tracing::warn!(game = %game.code, phase = %game.phase, "stale snapshot: seat without participant");
        }

        Self {
            code: game.code.clone(),
            phase: game.phase,
            participant_count: count,
            start_status: (game.phase == Phase::Lobby).then(|| StartStatus::for_count(count)),
            mission_track: mission_track(game),
            vote_track: game.rejection_count,
            max_rejections: MAX_REJECTIONS,
            seats,
            leader_name: game.current_leader_id.as_ref().map(name_of),
            required_team_size: game.required_team_size(),
            waiting_on: game.pending_inputs().iter().map(name_of).collect(),
            last_vote: game.last_vote.as_ref().map(|vote| VoteReveal {
                approved: vote.approved,
                approvers: vote.approvers.iter().map(name_of).collect(),
                rejecters: vote.rejecters.iter().map(name_of).collect(),
            }),
            last_mission_cards: game.last_mission_cards.iter().copied().collect(),
            score: game.score(),
            winner: game.winner,
            win_reason: game.win_reason,
            assassination_target: game.assassination_target.as_ref().map(name_of),
        }
    }
}

/// The five round slots for the dealt table. Empty while the head count has no table row.
fn mission_track(game: &Game) -> Vec<MissionToken> {
    let count = game.table_size();
    let Ok(config) = config_for(count) else {
        return Vec::new();
    };
    config
        .team_sizes
        .iter()
        .enumerate()
        .map(|(round, &team_size)| {
            let result = game.round_results.get(round).copied();
            MissionToken {
                number: round + 1,
                team_size,
                double_fail: fails_required(round, count) == 2,
                result,
                current: game.phase != Phase::Lobby && round == game.current_round && result.is_none(),
            }
        })
        .collect()
}
