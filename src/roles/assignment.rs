//! Role assignment and seating.
//!
//! `role_multiset` builds the exact roles for a table; `assign_roles`
//! shuffles them; `deal` hands them to participants and picks a seat order.
//! Roles and seats come from two separate forks of the game RNG so seat
//! position carries no information about role.

use serde::{Deserialize, Serialize};

use super::catalog::{RoleKey, Team};
use crate::core::{config_for, GameError, GameRng, GameSettings, ParticipantId, Result};

/// Roles for `participant_count` players before shuffling.
///
/// Merlin and Assassin are always present. Optional roles are added in the
/// order Percival, Morgana, Mordred, Oberon while their team has room; the
/// rest of each team is filled with Loyal Servants and Minions.
pub fn role_multiset(participant_count: usize, settings: &GameSettings) -> Result<Vec<RoleKey>> {
    let config = config_for(participant_count)
        .map_err(|_| GameError::InvalidPlayerCount(participant_count))?;

    let mut roles = Vec::with_capacity(participant_count);
    let mut good_left = config.good;
    let mut evil_left = config.evil;

    let mut take = |role: RoleKey, roles: &mut Vec<RoleKey>| {
        let left = match role.team() {
            Team::Good => &mut good_left,
            Team::Evil => &mut evil_left,
        };
        if *left > 0 {
            *left -= 1;
            roles.push(role);
        }
    };

    take(RoleKey::Merlin, &mut roles);
    take(RoleKey::Assassin, &mut roles);

    let optional = [
        (settings.use_percival, RoleKey::Percival),
        (settings.use_morgana, RoleKey::Morgana),
        (settings.use_mordred, RoleKey::Mordred),
        (settings.use_oberon, RoleKey::Oberon),
    ];
    for (enabled, role) in optional {
        if enabled {
            take(role, &mut roles);
        }
    }

    roles.extend(std::iter::repeat(RoleKey::LoyalServant).take(good_left));
    roles.extend(std::iter::repeat(RoleKey::Minion).take(evil_left));
    Ok(roles)
}

/// Shuffled roles for `participant_count` players.
pub fn assign_roles(
    participant_count: usize,
    settings: &GameSettings,
    rng: &mut GameRng,
) -> Result<Vec<RoleKey>> {
    let mut roles = role_multiset(participant_count, settings)?;
    rng.shuffle(&mut roles);
    Ok(roles)
}

/// Outcome of dealing a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Turn order; the first seat leads the first round.
    pub seat_order: Vec<ParticipantId>,
    /// Role per participant.
    pub roles: Vec<(ParticipantId, RoleKey)>,
}

impl Deal {
    #[must_use]
    pub fn role_of(&self, id: &ParticipantId) -> Option<RoleKey> {
        self.roles.iter().find(|(p, _)| p == id).map(|(_, r)| *r)
    }

    #[must_use]
    pub fn first_leader(&self) -> Option<&ParticipantId> {
        self.seat_order.first()
    }
}

/// Deal roles and seats to `participants`.
///
/// Ids are sorted first so a seeded RNG gives the same deal regardless of
/// the order the record happened to list them in.
pub fn deal<I>(participants: I, settings: &GameSettings, rng: &mut GameRng) -> Result<Deal>
where
    I: IntoIterator<Item = ParticipantId>,
{
    let mut ids: Vec<ParticipantId> = participants.into_iter().collect();
    ids.sort();
    ids.dedup();

    let mut role_rng = rng.fork();
    let mut seat_rng = rng.fork();

    let roles = assign_roles(ids.len(), settings, &mut role_rng)?;

    let mut seat_order = ids.clone();
    seat_rng.shuffle(&mut seat_order);

    Ok(Deal {
        seat_order,
        roles: ids.into_iter().zip(roles).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn counts(roles: &[RoleKey]) -> FxHashMap<RoleKey, usize> {
        let mut map = FxHashMap::default();
        for role in roles {
            *map.entry(*role).or_insert(0) += 1;
        }
        map
    }

    #[test]
    fn test_five_players_no_options() {
        let roles = role_multiset(5, &GameSettings::default()).unwrap();
        let c = counts(&roles);
        assert_eq!(c[&RoleKey::Merlin], 1);
        assert_eq!(c[&RoleKey::Assassin], 1);
        assert_eq!(c[&RoleKey::LoyalServant], 2);
        assert_eq!(c[&RoleKey::Minion], 1);
        assert_eq!(roles.len(), 5);
    }

    #[test]
    fn test_optional_roles_respect_team_room() {
        // 5 players: 2 evil slots, Assassin takes one, Morgana the other.
        let roles = role_multiset(5, &GameSettings::all()).unwrap();
        let c = counts(&roles);
        assert_eq!(c.get(&RoleKey::Morgana), Some(&1));
        assert_eq!(c.get(&RoleKey::Mordred), None);
        assert_eq!(c.get(&RoleKey::Oberon), None);
        assert_eq!(c.get(&RoleKey::Minion), None);
        assert_eq!(c.get(&RoleKey::Percival), Some(&1));
        assert_eq!(c.get(&RoleKey::LoyalServant), Some(&1));
    }

    #[test]
    fn test_ten_players_all_options() {
        let roles = role_multiset(10, &GameSettings::all()).unwrap();
        let c = counts(&roles);
        for role in [RoleKey::Morgana, RoleKey::Mordred, RoleKey::Oberon, RoleKey::Percival] {
            assert_eq!(c[&role], 1);
        }
        assert_eq!(c.get(&RoleKey::Minion), None);
        assert_eq!(c[&RoleKey::LoyalServant], 4);
    }

    #[test]
    fn test_invalid_counts() {
        for count in [0, 4, 11] {
            assert_eq!(
                role_multiset(count, &GameSettings::default()),
                Err(GameError::InvalidPlayerCount(count))
            );
        }
    }

    #[test]
    fn test_assign_roles_is_a_permutation() {
        let mut rng = GameRng::new(3);
        let settings = GameSettings::default().with_percival().with_mordred();
        let mut shuffled = assign_roles(8, &settings, &mut rng).unwrap();
        let mut plain = role_multiset(8, &settings).unwrap();
        shuffled.sort();
        plain.sort();
        assert_eq!(shuffled, plain);
    }

    #[test]
    fn test_deal_is_deterministic_per_seed() {
        let ids = |order: &[&str]| order.iter().map(|s| ParticipantId::new(*s)).collect::<Vec<_>>();
        let settings = GameSettings::default();

        let a = deal(ids(&["a", "b", "c", "d", "e"]), &settings, &mut GameRng::new(11)).unwrap();
        let b = deal(ids(&["e", "d", "c", "b", "a"]), &settings, &mut GameRng::new(11)).unwrap();
        assert_eq!(a, b);

        assert_eq!(a.seat_order.len(), 5);
        assert_eq!(a.roles.len(), 5);
        assert!(a.first_leader().is_some());
        for id in &a.seat_order {
            assert!(a.role_of(id).is_some());
        }
    }

    #[test]
    fn test_seat_position_does_not_track_role() {
        // Over many deals Merlin should sit first roughly 1/5 of the time.
        let settings = GameSettings::default();
        let mut rng = GameRng::new(2024);
        let ids: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|s| ParticipantId::new(*s)).collect();

        let mut merlin_first = 0;
        for _ in 0..2000 {
            let d = deal(ids.clone(), &settings, &mut rng).unwrap();
            let first = d.first_leader().unwrap();
            if d.role_of(first) == Some(RoleKey::Merlin) {
                merlin_first += 1;
            }
        }
        assert!((300..500).contains(&merlin_first), "merlin led {merlin_first} of 2000");
    }
}
