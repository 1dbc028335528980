//! Who knows whom.
//!
//! The knowledge table is asymmetric and must be reproduced exactly:
//!
//! | viewer                     | sees                                  | label       |
//! |----------------------------|---------------------------------------|-------------|
//! | Merlin                     | evil, except Mordred                  | `Evil`      |
//! | Percival                   | Merlin and Morgana, indistinguishably | `Merlin?`   |
//! | Assassin, Morgana, Minion  | other evil, except Oberon             | `Evil Ally` |
//! | Mordred                    | other evil, except Oberon             | `Evil Ally` |
//! | Oberon, Loyal Servant      | nobody                                |             |
//!
//! Participants without a (known) role never appear in anyone's list, and
//! a viewer without one sees nothing.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::catalog::RoleKey;
use crate::core::{Game, Participant, ParticipantId};

/// How a known participant is presented to the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLabel {
    Evil,
    /// Either Merlin or Morgana; the viewer cannot tell which.
    MerlinOrMorgana,
    EvilAlly,
}

impl std::fmt::Display for KnowledgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            KnowledgeLabel::Evil => "Evil",
            KnowledgeLabel::MerlinOrMorgana => "Merlin?",
            KnowledgeLabel::EvilAlly => "Evil Ally",
        })
    }
}

/// One entry of a viewer's knowledge list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownParticipant {
    pub id: ParticipantId,
    pub name: String,
    pub label: KnowledgeLabel,
}

/// A viewer's knowledge list. Never longer than the evil team.
pub type Knowledge = SmallVec<[KnownParticipant; 4]>;

/// What `role` held by `viewer` perceives among `participants`.
///
/// Order follows the iteration order of `participants`.
pub fn knowledge_of<'a, I>(role: RoleKey, viewer: &ParticipantId, participants: I) -> Knowledge
where
    I: IntoIterator<Item = (&'a ParticipantId, &'a Participant)>,
{
    let rule: fn(RoleKey) -> Option<KnowledgeLabel> = match role {
        RoleKey::Merlin => |other| {
            (other.is_evil() && other != RoleKey::Mordred).then_some(KnowledgeLabel::Evil)
        },
        RoleKey::Percival => |other| {
            matches!(other, RoleKey::Merlin | RoleKey::Morgana)
                .then_some(KnowledgeLabel::MerlinOrMorgana)
        },
        RoleKey::Assassin | RoleKey::Morgana | RoleKey::Minion | RoleKey::Mordred => |other| {
            (other.is_evil() && other != RoleKey::Oberon).then_some(KnowledgeLabel::EvilAlly)
        },
        RoleKey::Oberon | RoleKey::LoyalServant => return Knowledge::new(),
    };

    participants
        .into_iter()
        .filter(|(id, _)| *id != viewer)
        .filter_map(|(id, p)| {
            let label = rule(p.role?)?;
            Some(KnownParticipant {
                id: id.clone(),
                name: p.name.clone(),
                label,
            })
        })
        .collect()
}

/// Knowledge for `viewer` in `game`, in seat order.
///
/// An absent viewer, or one without a known role, learns nothing.
#[must_use]
pub fn knowledge_for(game: &Game, viewer: &ParticipantId) -> Knowledge {
    let Some(role) = game.role_of(viewer) else {
        return Knowledge::new();
    };
    let seats = game.seats();
    knowledge_of(
        role,
        viewer,
        seats
            .iter()
            .filter_map(|seat| seat.participant().map(|p| (seat.id(), p))),
    )
}
