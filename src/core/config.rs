//! Game configuration.
//!
//! - `MissionConfig`: the fixed per-count table (team split and team sizes)
//! - `GameSettings`: optional roles chosen in the lobby
//! - `EngineConfig`: cosmetic delays, seeding, retries and disconnect policy
//!
//! The table is game-design data, not derived from a formula.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{GameError, Result};

/// Fewest participants a game can start with.
pub const MIN_PARTICIPANTS: usize = 5;

/// Most participants a game can start with.
pub const MAX_PARTICIPANTS: usize = 10;

/// Rounds in a full game.
pub const ROUND_COUNT: usize = 5;

/// Zero-based index of the round that needs two fails at larger tables.
pub const DOUBLE_FAIL_ROUND: usize = 3;

/// Smallest table at which the double-fail round applies.
pub const DOUBLE_FAIL_MIN_PARTICIPANTS: usize = 7;

/// Consecutive rejections that hand the game to evil.
pub const MAX_REJECTIONS: u8 = 5;

/// Rounds a team must win.
pub const ROUNDS_TO_WIN: usize = 3;

/// One row of the configuration table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionConfig {
    pub good: usize,
    pub evil: usize,
    pub team_sizes: [usize; ROUND_COUNT],
}

impl MissionConfig {
    /// Team size for a zero-based round, `None` past the last round.
    #[must_use]
    pub fn team_size(&self, round: usize) -> Option<usize> {
        self.team_sizes.get(round).copied()
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.good + self.evil
    }
}

/// Look up the table row for `participant_count`.
///
/// ```
/// use avalon_engine::core::config_for;
///
/// let cfg = config_for(7).unwrap();
/// assert_eq!((cfg.good, cfg.evil), (4, 3));
/// assert_eq!(cfg.team_sizes, [2, 3, 3, 4, 4]);
/// assert!(config_for(4).is_err());
/// ```
pub fn config_for(participant_count: usize) -> Result<MissionConfig> {
    let (good, evil, team_sizes) = match participant_count {
        5 => (3, 2, [2, 3, 2, 3, 3]),
        6 => (4, 2, [2, 3, 4, 3, 4]),
        7 => (4, 3, [2, 3, 3, 4, 4]),
        8 => (5, 3, [3, 4, 4, 5, 5]),
        9 => (6, 3, [3, 4, 4, 5, 5]),
        10 => (6, 4, [3, 4, 4, 5, 5]),
        other => return Err(GameError::Configuration(other)),
    };
    Ok(MissionConfig { good, evil, team_sizes })
}

/// Required team size for a round, `None` when either input is out of range.
#[must_use]
pub fn required_team_size(round: usize, participant_count: usize) -> Option<usize> {
    config_for(participant_count).ok()?.team_size(round)
}

/// Optional roles selected in the lobby.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    #[serde(default)]
    pub use_percival: bool,
    #[serde(default)]
    pub use_morgana: bool,
    #[serde(default)]
    pub use_mordred: bool,
    #[serde(default)]
    pub use_oberon: bool,
}

impl GameSettings {
    /// Every optional role enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            use_percival: true,
            use_morgana: true,
            use_mordred: true,
            use_oberon: true,
        }
    }

    #[must_use]
    pub fn with_percival(mut self) -> Self {
        self.use_percival = true;
        self
    }

    #[must_use]
    pub fn with_morgana(mut self) -> Self {
        self.use_morgana = true;
        self
    }

    #[must_use]
    pub fn with_mordred(mut self) -> Self {
        self.use_mordred = true;
        self
    }

    #[must_use]
    pub fn with_oberon(mut self) -> Self {
        self.use_oberon = true;
        self
    }
}

/// What happens when a participant leaves after roles are dealt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectPolicy {
    /// Refuse the removal; the seat stays and the game waits for it.
    #[default]
    FreezeSeat,
    /// End the game with no winner.
    AbortGame,
}

/// Engine-wide tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pause before leaving role reveal once everyone is ready.
    pub role_ready_delay: Duration,

    /// Pause after the last ballot so the vote can be shown.
    pub vote_reveal_delay: Duration,

    /// Base pause after the last card before scoring.
    pub mission_reveal_delay: Duration,

    /// Extra pause per revealed card.
    pub card_reveal_interval: Duration,

    /// Fixed seed for dealing. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Optimistic transaction attempts before giving up.
    pub max_transaction_retries: u32,

    pub disconnect_policy: DisconnectPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            role_ready_delay: Duration::ZERO,
            vote_reveal_delay: Duration::from_millis(3000),
            mission_reveal_delay: Duration::from_millis(2000),
            card_reveal_interval: Duration::from_millis(500),
            seed: None,
            max_transaction_retries: 8,
            disconnect_policy: DisconnectPolicy::FreezeSeat,
        }
    }
}

impl EngineConfig {
    /// Defaults with every cosmetic delay removed.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            role_ready_delay: Duration::ZERO,
            vote_reveal_delay: Duration::ZERO,
            mission_reveal_delay: Duration::ZERO,
            card_reveal_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Read `AVALON_*` variables, keeping defaults for absent or bad values.
    ///
    /// | variable                          | field                     |
    /// |-----------------------------------|---------------------------|
    /// | `AVALON_ROLE_READY_DELAY_MS`      | `role_ready_delay`        |
    /// | `AVALON_VOTE_REVEAL_DELAY_MS`     | `vote_reveal_delay`       |
    /// | `AVALON_MISSION_REVEAL_DELAY_MS`  | `mission_reveal_delay`    |
    /// | `AVALON_CARD_REVEAL_INTERVAL_MS`  | `card_reveal_interval`    |
    /// | `AVALON_SEED`                     | `seed`                    |
    /// | `AVALON_MAX_TRANSACTION_RETRIES`  | `max_transaction_retries` |
    /// | `AVALON_DISCONNECT_POLICY`        | `freeze_seat` / `abort_game` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(default, Duration::from_millis)
        };

        let disconnect_policy = match lookup("AVALON_DISCONNECT_POLICY").as_deref().map(str::trim) {
            Some("abort_game") => DisconnectPolicy::AbortGame,
            Some("freeze_seat") => DisconnectPolicy::FreezeSeat,
            Some(other) => {
                tracing::warn!(value = other, "unrecognised AVALON_DISCONNECT_POLICY, using default");
                defaults.disconnect_policy
            }
            None => defaults.disconnect_policy,
        };

        Self {
            role_ready_delay: millis("AVALON_ROLE_READY_DELAY_MS", defaults.role_ready_delay),
            vote_reveal_delay: millis("AVALON_VOTE_REVEAL_DELAY_MS", defaults.vote_reveal_delay),
            mission_reveal_delay: millis("AVALON_MISSION_REVEAL_DELAY_MS", defaults.mission_reveal_delay),
            card_reveal_interval: millis("AVALON_CARD_REVEAL_INTERVAL_MS", defaults.card_reveal_interval),
            seed: lookup("AVALON_SEED").and_then(|v| v.trim().parse().ok()),
            max_transaction_retries: lookup("AVALON_MAX_TRANSACTION_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_transaction_retries),
            disconnect_policy,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_transaction_retries(mut self, retries: u32) -> Self {
        self.max_transaction_retries = retries;
        self
    }

    /// Total pause before a mission of `card_count` cards is scored.
    #[must_use]
    pub fn mission_delay(&self, card_count: usize) -> Duration {
        self.mission_reveal_delay + self.card_reveal_interval * card_count as u32
    }
}
