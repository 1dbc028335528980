//! Actions: who is acting and what they submit.
//!
//! Every mutation of the record that originates from a device is an
//! `Action` issued by an `Actor`. Transitions that fire once all inputs
//! are in (tallying votes, scoring a mission) are not actions; the rules
//! engine derives them from the record itself.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::config::GameSettings;
use super::player::ParticipantId;
use super::state::{Ballot, Card};

/// Who is issuing an action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// The shared host display.
    Host,
    /// A participant device.
    Participant(ParticipantId),
}

impl Actor {
    #[must_use]
    pub fn participant(id: impl Into<String>) -> Self {
        Actor::Participant(ParticipantId::new(id))
    }

    /// The participant id, `None` for the host.
    #[must_use]
    pub fn id(&self) -> Option<&ParticipantId> {
        match self {
            Actor::Host => None,
            Actor::Participant(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Host => f.write_str("host"),
            Actor::Participant(id) => write!(f, "{id}"),
        }
    }
}

/// Team nominations are at most five ids, so they stay inline.
pub type TeamList = SmallVec<[ParticipantId; 5]>;

/// A submitted input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Action {
    /// Join the lobby under a display name.
    Join { name: String },
    /// Leave the game (issued by presence cleanup).
    Leave,
    /// Host changes the optional roles.
    UpdateSettings { settings: GameSettings },
    /// Host deals roles and seats.
    Start,
    /// Participant has seen their role.
    Ready,
    /// Leader nominates the team.
    ProposeTeam { team: TeamList },
    CastBallot { ballot: Ballot },
    SubmitCard { card: Card },
    /// Assassin names a target.
    Assassinate { target: ParticipantId },
}

impl Action {
    /// Short name for logging. Never includes the secret payload.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Join { .. } => "join",
            Action::Leave => "leave",
            Action::UpdateSettings { .. } => "update_settings",
            Action::Start => "start",
            Action::Ready => "ready",
            Action::ProposeTeam { .. } => "propose_team",
            Action::CastBallot { .. } => "cast_ballot",
            Action::SubmitCard { .. } => "submit_card",
            Action::Assassinate { .. } => "assassinate",
        }
    }

    /// Build a proposal from any id list.
    #[must_use]
    pub fn propose<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Action::ProposeTeam {
            team: ids.into_iter().map(|id| ParticipantId::new(id)).collect(),
        }
    }
}
