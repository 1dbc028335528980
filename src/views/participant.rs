//! What one participant's device shows.

use serde::Serialize;

use crate::core::{Card, Game, Phase, ParticipantId, Seat, WinReason};
use crate::roles::{knowledge_for, Knowledge, RoleKey, Team};

/// How the game ended for the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
    /// The game ended with no winner.
    Abandoned,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Outcome::Won => "You Won!",
            Outcome::Lost => "You Lost!",
            Outcome::Abandoned => "Game abandoned",
        })
    }
}

/// A seat the viewer can pick, by id and display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: ParticipantId,
    pub name: String,
}

/// Everything a participant's device renders, derived from one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    /// The viewer is not (or no longer) in the record.
    pub vacant: bool,
    pub phase: Phase,

    pub role: Option<RoleKey>,
    pub role_name: Option<&'static str>,
    pub role_description: Option<&'static str>,
    pub team: Option<Team>,
    pub banner: Option<&'static str>,
    pub knowledge_heading: Option<&'static str>,
    pub knowledge: Knowledge,

    pub ready: bool,
    pub round: usize,
    pub leader_name: Option<String>,
    pub is_leader: bool,
    pub required_team_size: Option<usize>,
    /// Seats the leader may nominate, in seat order.
    pub team_choices: Vec<Choice>,
    pub proposed_team: Vec<String>,
    pub on_team: bool,
    pub has_voted: bool,
    pub has_submitted: bool,
    pub allowed_cards: Vec<Card>,
    pub assassination_targets: Vec<Choice>,

    pub outcome: Option<Outcome>,
    pub win_reason: Option<WinReason>,
}

impl ParticipantView {
    /// Derive the view for `id`.
    ///
    /// Never fails: an absent viewer gets a vacancy view, and references to
    /// missing participants render as vacancies.
    #[must_use]
    pub fn derive(game: &Game, id: &ParticipantId) -> Self {
        let seat = game.seat(id);
        let participant = seat.participant();
        let role = participant.and_then(|p| p.role);

        if participant.is_some() && role.is_none() && game.phase != Phase::Lobby {
            tracing::warn!(game = %game.code, participant = %id, phase = %game.phase, "stale snapshot: role missing");
        }

        let info = role.map(RoleKey::info);
        let team = role.map(RoleKey::team);
        let present = participant.is_some();

        let leader_name = game.current_leader_id.as_ref().map(|leader| {
            let seat = game.seat(leader);
            if seat.is_vacant() {
                tracing::warn!(game = %game.code, leader = %leader, "stale snapshot: leader has no seat");
            }
            seat.name().to_owned()
        });
        let is_leader = present && game.is_leader(id);
        let on_team = present && game.phase.has_team() && game.is_on_team(id);
        let has_submitted = game.card_submitters.contains(id);

        let team_choices = if is_leader && game.phase == Phase::TeamSelection {
            occupied(game).collect()
        } else {
            Vec::new()
        };

        let allowed_cards = if on_team && game.phase == Phase::Mission && !has_submitted {
            match team {
                Some(Team::Good) => vec![Card::Success],
                _ => vec![Card::Success, Card::Fail],
            }
        } else {
            Vec::new()
        };

        let assassination_targets = if game.phase == Phase::Assassination && role == Some(RoleKey::Assassin) {
            occupied(game)
                .filter(|choice| game.team_of(&choice.id) == Some(Team::Good))
                .collect()
        } else {
            Vec::new()
        };

        let outcome = (game.phase == Phase::GameOver).then(|| match (game.winner, team) {
            (None, _) => Outcome::Abandoned,
            (Some(winner), Some(mine)) if winner == mine => Outcome::Won,
            (Some(_), _) => Outcome::Lost,
        });

        Self {
            id: id.clone(),
            name: seat.name().to_owned(),
            vacant: !present,
            phase: game.phase,
            role,
            role_name: info.map(|i| i.name),
            role_description: info.map(|i| i.description),
            team,
            banner: team.map(Team::banner),
            knowledge_heading: info.and_then(|i| i.knowledge_heading),
            knowledge: knowledge_for(game, id),
            ready: participant.is_some_and(|p| p.ready),
            round: game.current_round,
            leader_name,
            is_leader,
            required_team_size: game.required_team_size(),
            team_choices,
            proposed_team: game.proposed_team.iter().map(|m| game.seat(m).name().to_owned()).collect(),
            on_team,
            has_voted: game.ballots.contains_key(id),
            has_submitted,
            allowed_cards,
            assassination_targets,
            outcome,
            win_reason: game.win_reason,
        }
    }

    /// Whether the viewer may play a fail card right now.
    #[must_use]
    pub fn can_fail(&self) -> bool {
        self.allowed_cards.contains(&Card::Fail)
    }
}

fn occupied(game: &Game) -> impl Iterator<Item = Choice> + '_ {
    game.seats().into_iter().filter_map(|seat| match seat {
        Seat::Occupied(id, p) => Some(Choice { id: id.clone(), name: p.name.clone() }),
        Seat::Vacant(_) => None,
    })
}
