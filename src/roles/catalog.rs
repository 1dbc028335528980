//! Role catalog - static role data.
//!
//! Each role has a team and fixed display metadata. The catalog is
//! process-wide constant data; roles have no lifecycle of their own.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::GameError;

/// Team alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Good,
    Evil,
}

impl Team {
    /// Banner shown on the role card.
    #[must_use]
    pub fn banner(self) -> &'static str {
        match self {
            Team::Good => "Loyal Servant of Arthur",
            Team::Evil => "Minion of Mordred",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Team::Good => "good",
            Team::Evil => "evil",
        })
    }
}

/// Catalog key for a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleKey {
    Merlin,
    Percival,
    LoyalServant,
    Assassin,
    Morgana,
    Mordred,
    Oberon,
    Minion,
}

/// Static metadata for one role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleInfo {
    pub key: RoleKey,
    pub name: &'static str,
    pub team: Team,
    pub description: &'static str,
    /// Heading above the knowledge list. `None` for roles that learn nothing.
    pub knowledge_heading: Option<&'static str>,
}

const CATALOG: [RoleInfo; 8] = [
    RoleInfo {
        key: RoleKey::Merlin,
        name: "Merlin",
        team: Team::Good,
        description: "Knows who the evil players are (except Mordred)",
        knowledge_heading: Some("Evil players (shown as evil):"),
    },
    RoleInfo {
        key: RoleKey::Percival,
        name: "Percival",
        team: Team::Good,
        description: "Knows who Merlin is (but Morgana appears as Merlin too)",
        knowledge_heading: Some("One of these is Merlin:"),
    },
    RoleInfo {
        key: RoleKey::LoyalServant,
        name: "Loyal Servant",
        team: Team::Good,
        description: "A loyal servant of Arthur with no special abilities",
        knowledge_heading: None,
    },
    RoleInfo {
        key: RoleKey::Assassin,
        name: "Assassin",
        team: Team::Evil,
        description: "Can assassinate Merlin at the end if Good wins",
        knowledge_heading: Some("Your evil allies:"),
    },
    RoleInfo {
        key: RoleKey::Morgana,
        name: "Morgana",
        team: Team::Evil,
        description: "Appears as Merlin to Percival",
        knowledge_heading: Some("Your evil allies:"),
    },
    RoleInfo {
        key: RoleKey::Mordred,
        name: "Mordred",
        team: Team::Evil,
        description: "Unknown to Merlin",
        knowledge_heading: Some("Your evil allies:"),
    },
    RoleInfo {
        key: RoleKey::Oberon,
        name: "Oberon",
        team: Team::Evil,
        description: "Does not know other evil players, and they don't know him",
        knowledge_heading: Some("You work alone. You don't know your allies."),
    },
    RoleInfo {
        key: RoleKey::Minion,
        name: "Minion of Mordred",
        team: Team::Evil,
        description: "A generic evil minion",
        knowledge_heading: Some("Your evil allies:"),
    },
];

impl RoleKey {
    /// Every role, good first.
    pub const ALL: [RoleKey; 8] = [
        RoleKey::Merlin,
        RoleKey::Percival,
        RoleKey::LoyalServant,
        RoleKey::Assassin,
        RoleKey::Morgana,
        RoleKey::Mordred,
        RoleKey::Oberon,
        RoleKey::Minion,
    ];

    /// Catalog entry for this role.
    #[must_use]
    pub fn info(self) -> &'static RoleInfo {
        // CATALOG is declared in `ALL` order.
        &CATALOG[self as usize]
    }

    #[must_use]
    pub fn team(self) -> Team {
        self.info().team
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    #[must_use]
    pub fn is_evil(self) -> bool {
        self.team() == Team::Evil
    }

    /// Whether a game may contain more than one of this role.
    #[must_use]
    pub fn is_repeatable(self) -> bool {
        matches!(self, RoleKey::LoyalServant | RoleKey::Minion)
    }

    /// Stored key, e.g. `LOYAL_SERVANT`.
    #[must_use]
    pub fn as_key(self) -> &'static str {
        match self {
            RoleKey::Merlin => "MERLIN",
            RoleKey::Percival => "PERCIVAL",
            RoleKey::LoyalServant => "LOYAL_SERVANT",
            RoleKey::Assassin => "ASSASSIN",
            RoleKey::Morgana => "MORGANA",
            RoleKey::Mordred => "MORDRED",
            RoleKey::Oberon => "OBERON",
            RoleKey::Minion => "MINION",
        }
    }
}

impl FromStr for RoleKey {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RoleKey::ALL
            .into_iter()
            .find(|role| role.as_key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GameError::UnknownRole(s.to_string()))
    }
}

impl std::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Team for a raw stored key; unknown keys have no team.
#[must_use]
pub fn team_for_key(key: &str) -> Option<Team> {
    key.parse::<RoleKey>().ok().map(RoleKey::team)
}
