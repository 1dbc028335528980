//! Device operations against a shared store.
//!
//! Each operation is validated by running the rules against a scratch copy
//! of the latest snapshot. Inputs that only touch their own path (joining,
//! readiness, ballots, settings) are then written with a conditional
//! `update`; everything that reshapes the record goes through `transact`
//! so it is re-validated against whatever version actually wins.

use std::sync::Arc;

use crate::core::{
    Action, Actor, Ballot, Card, Game, GameError, GameSettings, ParticipantId, Phase, Result,
};
use crate::rules::{RulesEngine, Transition};
use crate::sync::{FieldWrite, GameStore, Patch, Snapshot};

/// A device's handle on one game.
pub struct Session<R> {
    store: Arc<dyn GameStore>,
    rules: R,
}

impl<R: RulesEngine> Session<R> {
    pub fn new(store: Arc<dyn GameStore>, rules: R) -> Self {
        Self { store, rules }
    }

    #[must_use]
    pub fn store(&self) -> &dyn GameStore {
        self.store.as_ref()
    }

    pub(crate) fn store_arc(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    #[must_use]
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Latest committed record.
    #[must_use]
    pub fn game(&self) -> Game {
        self.store.snapshot().game
    }

    /// Validate and commit one action.
    pub fn submit(&mut self, actor: &Actor, action: &Action) -> Result<Snapshot> {
        let before = self.store.snapshot().game;
        let mut scratch = before.clone();
        if let Err(err) = self.rules.apply_action(&mut scratch, actor, action) {
            log_rejection(&before, actor, action, &err);
            return Err(err);
        }

        let committed = match path_scoped(&before, &scratch, actor, action) {
            Some(patch) => self.store.update(&patch),
            None => {
                let rules = &mut self.rules;
                self.store.transact(&mut |game| {
                    let mut next = game.clone();
                    rules.apply_action(&mut next, actor, action)?;
                    Ok(next)
                })
            }
        };
        if let Err(err) = &committed {
            log_rejection(&before, actor, action, err);
        }
        committed
    }

    /// Run completion detection once.
    ///
    /// Returns the transition this call performed, or `None` when there was
    /// nothing to do or another observer got there first.
    pub fn detect_completion(&mut self) -> Result<Option<Transition>> {
        let rules = &mut self.rules;
        let mut performed = None;
        let outcome = self.store.transact(&mut |game| {
            let mut next = game.clone();
            performed = rules.advance(&mut next);
            if performed.is_none() {
                return Err(GameError::TransactionAborted("nothing to advance"));
            }
            Ok(next)
        });
        match outcome {
            Ok(_) => Ok(performed),
            Err(err) if err.is_benign() => Ok(None),
            Err(err) => Err(err),
        }
    }

    // === Operations ===

    pub fn join(&mut self, id: &ParticipantId, name: &str) -> Result<Snapshot> {
        self.submit(&Actor::Participant(id.clone()), &Action::Join { name: name.to_owned() })
    }

    /// Presence cleanup for a disconnected device.
    pub fn leave(&mut self, id: &ParticipantId) -> Result<Snapshot> {
        self.submit(&Actor::Participant(id.clone()), &Action::Leave)
    }

    pub fn update_settings(&mut self, settings: GameSettings) -> Result<Snapshot> {
        self.submit(&Actor::Host, &Action::UpdateSettings { settings })
    }

    pub fn start(&mut self) -> Result<Snapshot> {
        self.submit(&Actor::Host, &Action::Start)
    }

    pub fn ready(&mut self, id: &ParticipantId) -> Result<Snapshot> {
        self.submit(&Actor::Participant(id.clone()), &Action::Ready)
    }

    pub fn propose_team(&mut self, leader: &ParticipantId, team: &[ParticipantId]) -> Result<Snapshot> {
        let action = Action::ProposeTeam { team: team.iter().cloned().collect() };
        self.submit(&Actor::Participant(leader.clone()), &action)
    }

    pub fn cast_ballot(&mut self, id: &ParticipantId, ballot: Ballot) -> Result<Snapshot> {
        self.submit(&Actor::Participant(id.clone()), &Action::CastBallot { ballot })
    }

    pub fn submit_card(&mut self, id: &ParticipantId, card: Card) -> Result<Snapshot> {
        self.submit(&Actor::Participant(id.clone()), &Action::SubmitCard { card })
    }

    pub fn assassinate(&mut self, assassin: &ParticipantId, target: &ParticipantId) -> Result<Snapshot> {
        let action = Action::Assassinate { target: target.clone() };
        self.submit(&Actor::Participant(assassin.clone()), &action)
    }
}

/// The field writes for actions that only touch their own path.
fn path_scoped(before: &Game, after: &Game, actor: &Actor, action: &Action) -> Option<Patch> {
    let id = actor.id();
    let patch = match (action, id) {
        (Action::Join { .. }, Some(id)) => Patch::new().expect_phase(Phase::Lobby).write(FieldWrite::Participant {
            id: id.clone(),
            participant: after.participants.get(id).cloned(),
        }),
        (Action::Leave, Some(id)) if before.phase == Phase::Lobby => Patch::new()
            .expect_phase(Phase::Lobby)
            .write(FieldWrite::Participant { id: id.clone(), participant: None }),
        (Action::UpdateSettings { settings }, None) => Patch::new()
            .expect_phase(Phase::Lobby)
            .write(FieldWrite::Settings { settings: *settings }),
        (Action::Ready, Some(id)) => Patch::new()
            .expect_phase(Phase::RoleReveal)
            .write(FieldWrite::Ready { id: id.clone(), ready: true }),
        (Action::CastBallot { ballot }, Some(id)) => Patch::new()
            .expect_phase(Phase::Voting)
            .expect_proposal(before.proposal_number)
            .write(FieldWrite::Ballot { id: id.clone(), ballot: *ballot }),
        _ => return None,
    };
    Some(patch)
}

fn log_rejection(game: &Game, actor: &Actor, action: &Action, err: &GameError) {
    if err.is_benign() {
        tracing::debug!(
            game = %game.code,
            phase = %game.phase,
            participant = %actor,
            action = action.kind(),
            error = %err,
            "duplicate or late input ignored"
        );
    } else {
        tracing::warn!(
            game = %game.code,
            phase = %game.phase,
            participant = %actor,
            action = action.kind(),
            error = %err,
            "action rejected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, GameCode};
    use crate::rules::AvalonRules;
    use crate::sync::MemoryStore;

    fn session() -> Session<AvalonRules> {
        let store = Arc::new(MemoryStore::new(Game::new(GameCode::new("SESS01"), GameSettings::default())));
        Session::new(store, AvalonRules::new(EngineConfig::immediate().with_seed(9)))
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn joined(count: usize) -> Session<AvalonRules> {
        let mut session = session();
        for i in 0..count {
            session.join(&pid(&format!("p{i}")), &format!("Player {i}")).unwrap();
        }
        session
    }

    #[test]
    fn test_lobby_join_leave_settings() {
        let mut session = joined(3);
        assert_eq!(session.game().participant_count(), 3);
        session.leave(&pid("p1")).unwrap();
        assert_eq!(session.game().participant_count(), 2);
        session.update_settings(GameSettings::all()).unwrap();
        assert!(session.game().settings.use_percival);
        assert_eq!(session.start(), Err(GameError::InvalidPlayerCount(2)));
    }

    #[test]
    fn test_detect_completion_is_exactly_once() {
        let mut session = joined(5);
        session.start().unwrap();
        for i in 0..5 {
            session.ready(&pid(&format!("p{i}"))).unwrap();
        }

        let mut second = Session::new(Arc::clone(&session.store), AvalonRules::new(EngineConfig::immediate()));
        let first = session.detect_completion().unwrap();
        assert_eq!(first.map(|t| t.to), Some(Phase::TeamSelection));
        assert_eq!(second.detect_completion().unwrap(), None);
        assert_eq!(session.game().phase, Phase::TeamSelection);
    }

    #[test]
    fn test_late_ballot_is_dropped() {
        let mut session = joined(5);
        session.start().unwrap();
        for i in 0..5 {
            session.ready(&pid(&format!("p{i}"))).unwrap();
        }
        session.detect_completion().unwrap();

        let game = session.game();
        let leader = game.current_leader_id.clone().unwrap();
        let team: Vec<_> = game.seat_order.iter().take(2).cloned().collect();
        session.propose_team(&leader, &team).unwrap();

        let voter = pid("p0");
        session.cast_ballot(&voter, Ballot::Reject).unwrap();
        assert_eq!(session.cast_ballot(&voter, Ballot::Approve), Err(GameError::AlreadyVoted(voter.clone())));

        // A ballot written against proposal 1 after proposal 2 was made.
        let mut game = session.game();
        game.proposal_number = 2;
        game.ballots.clear();
        session.store().set(game);
        let stale = Patch::new()
            .expect_phase(Phase::Voting)
            .expect_proposal(1)
            .write(FieldWrite::Ballot { id: voter, ballot: Ballot::Approve });
        assert!(session.store().update(&stale).is_err());
        assert!(session.game().ballots.is_empty());
    }
}
