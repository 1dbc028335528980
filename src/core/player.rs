//! Participant identification and seats.
//!
//! ## ParticipantId
//!
//! Opaque, session-stable identifier chosen by the joining device.
//!
//! ## Seat
//!
//! Explicit lookup result for a participant that may have left. Every
//! derivation goes through `Seat` so an absent participant reads as a
//! vacancy instead of a crash.

use serde::{Deserialize, Deserializer, Serialize};

use super::rng::GameRng;
use crate::roles::RoleKey;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Opaque participant identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh `player_xxxxxxxxxxxxx` identifier.
    ///
    /// ```
    /// use avalon_engine::core::{GameRng, ParticipantId};
    ///
    /// let mut rng = GameRng::new(7);
    /// let id = ParticipantId::generate(&mut rng);
    /// assert!(id.as_str().starts_with("player_"));
    /// assert_eq!(id.as_str().len(), "player_".len() + 13);
    /// ```
    #[must_use]
    pub fn generate(rng: &mut GameRng) -> Self {
        let suffix: String = (0..13)
            .map(|_| BASE36[rng.gen_range_usize(0..BASE36.len())] as char)
            .collect();
        Self(format!("player_{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Code under which one game record is stored.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameCode(pub String);

impl GameCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generate a six-character join code.
    ///
    /// Ambiguous glyphs (`0`/`O`, `1`/`I`) are left out so the code can be
    /// read off a shared screen.
    #[must_use]
    pub fn generate(rng: &mut GameRng) -> Self {
        let code: String = (0..6)
            .map(|_| CODE_ALPHABET[rng.gen_range_usize(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A joined participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Display name.
    pub name: String,

    /// Assigned role. `None` until assignment, or when the stored key is
    /// outside the catalog.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<RoleKey>,

    /// Set once the participant has seen their role.
    #[serde(default)]
    pub ready: bool,
}

impl Participant {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            ready: false,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: RoleKey) -> Self {
        self.role = Some(role);
        self
    }
}

/// Unknown role keys degrade to "no role" rather than failing the whole record.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<RoleKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|key| match key.parse::<RoleKey>() {
        Ok(role) => Some(role),
        Err(err) => {
            tracing::warn!(%err, "ignoring role outside the catalog");
            None
        }
    }))
}

/// Result of looking a participant up by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seat<'a> {
    Occupied(&'a ParticipantId, &'a Participant),
    /// The id is referenced (seat order, team, leader) but the participant is gone.
    Vacant(&'a ParticipantId),
}

impl<'a> Seat<'a> {
    #[must_use]
    pub fn id(&self) -> &'a ParticipantId {
        match *self {
            Seat::Occupied(id, _) | Seat::Vacant(id) => id,
        }
    }

    #[must_use]
    pub fn participant(&self) -> Option<&'a Participant> {
        match *self {
            Seat::Occupied(_, p) => Some(p),
            Seat::Vacant(_) => None,
        }
    }

    /// Display name, or a placeholder for a vacancy.
    #[must_use]
    pub fn name(&self) -> &'a str {
        match *self {
            Seat::Occupied(_, p) => &p.name,
            Seat::Vacant(_) => "(vacant)",
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<RoleKey> {
        self.participant().and_then(|p| p.role)
    }

    #[must_use]
    pub fn is_vacant(&self) -> bool {
        matches!(self, Seat::Vacant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_display() {
        let id = ParticipantId::new("player_abc");
        assert_eq!(format!("{}", id), "player_abc");
        assert_eq!(id.as_str(), "player_abc");
    }

    #[test]
    fn test_generated_ids_are_deterministic() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);
        assert_eq!(ParticipantId::generate(&mut rng1), ParticipantId::generate(&mut rng2));
        assert_ne!(ParticipantId::generate(&mut rng1), ParticipantId::generate(&mut GameRng::new(43)));
    }

    #[test]
    fn test_game_code_alphabet() {
        let mut rng = GameRng::new(9);
        for _ in 0..50 {
            let code = GameCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_unknown_role_deserializes_as_none() {
        let json = r#"{"name":"Ann","role":"JESTER","ready":true}"#;
        let p: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(p.role, None);
        assert!(p.ready);

        let json = r#"{"name":"Bo","role":"MERLIN"}"#;
        let p: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(p.role, Some(RoleKey::Merlin));
        assert!(!p.ready);
    }

    #[test]
    fn test_seat_vacancy() {
        let id = ParticipantId::new("gone");
        let seat = Seat::Vacant(&id);
        assert!(seat.is_vacant());
        assert_eq!(seat.name(), "(vacant)");
        assert_eq!(seat.role(), None);
        assert_eq!(seat.id(), &id);

        let present = Participant::new("Cy").with_role(RoleKey::Oberon);
        let seat = Seat::Occupied(&id, &present);
        assert_eq!(seat.name(), "Cy");
        assert_eq!(seat.role(), Some(RoleKey::Oberon));
    }
}
