//! The Avalon state machine.
//!
//! `AvalonRules` validates every input against the record, applies it, and
//! performs the collection steps (vote tally, mission scoring) once their
//! inputs are complete. Each collection step carries a one-shot guard in the
//! record (`votes_tallied`, `round_processed`) so re-running `advance` on a
//! record that already moved on is a no-op.

use std::time::Duration;

use crate::core::{
    Action, Actor, Ballot, Card, DisconnectPolicy, EngineConfig, Game, GameError, GameRng,
    GameSettings, MissionOutcome, Participant, ParticipantId, Phase, Result, VoteRecord, WinReason,
    MAX_REJECTIONS,
};
use crate::roles::{deal, RoleKey, Team};
use crate::rules::engine::{GameResult, RulesEngine, Step, Transition};
use crate::rules::mission::{evaluate_win, resolve_round, WinState};

/// Seat after `index` in a table of `seat_count`, wrapping around.
///
/// ```
/// use avalon_engine::rules::next_seat;
///
/// assert_eq!(next_seat(5, 3), 4);
/// assert_eq!(next_seat(5, 4), 0);
/// ```
#[must_use]
pub fn next_seat(seat_count: usize, index: usize) -> usize {
    if seat_count == 0 {
        0
    } else {
        (index + 1) % seat_count
    }
}

/// Rules engine for one or more Avalon games.
#[derive(Clone, Debug)]
pub struct AvalonRules {
    config: EngineConfig,
    rng: GameRng,
}

impl Default for AvalonRules {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AvalonRules {
    /// Create an engine, seeding its RNG from `config.seed` when present.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let rng = GameRng::from_seed_or_entropy(config.seed);
        Self { config, rng }
    }

    /// Create an engine that draws from an existing RNG.
    #[must_use]
    pub fn with_rng(config: EngineConfig, rng: GameRng) -> Self {
        Self { config, rng }
    }

    #[must_use]
    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    // === Actions ===

    fn join(game: &mut Game, id: &ParticipantId, name: &str) -> Result<()> {
        require_phase(game, Phase::Lobby)?;
        match game.participants.get_mut(id) {
            Some(existing) => existing.name = name.to_owned(),
            None => {
                game.participants.insert(id.clone(), Participant::new(name));
            }
        }
        Ok(())
    }

    fn leave(&self, game: &mut Game, id: &ParticipantId) -> Result<()> {
        if !game.contains(id) || game.phase.is_terminal() {
            return Ok(());
        }
        if game.phase == Phase::Lobby {
            game.participants.remove(id);
            return Ok(());
        }
        match self.config.disconnect_policy {
            DisconnectPolicy::FreezeSeat => Err(GameError::SeatFrozen(id.clone())),
            DisconnectPolicy::AbortGame => {
                game.participants.remove(id);
                finish(game, None, WinReason::ParticipantLeft, None);
                Ok(())
            }
        }
    }

    fn update_settings(game: &mut Game, settings: &GameSettings) -> Result<()> {
        require_phase(game, Phase::Lobby)?;
        game.settings = *settings;
        Ok(())
    }

    fn start(&mut self, game: &mut Game) -> Result<()> {
        require_phase(game, Phase::Lobby)?;
        let dealt = deal(game.participants.keys().cloned(), &game.settings, &mut self.rng)?;

        for (id, role) in &dealt.roles {
            if let Some(participant) = game.participants.get_mut(id) {
                participant.role = Some(*role);
                participant.ready = false;
            }
        }
        game.seat_order = dealt.seat_order.iter().cloned().collect();
        game.leader_index = 0;
        game.current_leader_id = dealt.first_leader().cloned();
        game.current_round = 0;
        game.round_results.clear();
        game.rejection_count = 0;
        game.proposal_number = 0;
        clear_round(game);
        game.phase = Phase::RoleReveal;
        Ok(())
    }

    fn ready(game: &mut Game, id: &ParticipantId) -> Result<()> {
        require_phase(game, Phase::RoleReveal)?;
        let participant = game
            .participants
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownParticipant(id.clone()))?;
        participant.ready = true;
        Ok(())
    }

    fn propose_team(game: &mut Game, id: &ParticipantId, team: &[ParticipantId]) -> Result<()> {
        require_phase(game, Phase::TeamSelection)?;
        require_member(game, id)?;
        if !game.is_leader(id) {
            return Err(GameError::NotLeader(id.clone()));
        }
        let expected = game
            .required_team_size()
            .ok_or(GameError::Configuration(game.table_size()))?;
        if team.len() != expected {
            return Err(GameError::WrongTeamSize { expected, actual: team.len() });
        }
        for (i, member) in team.iter().enumerate() {
            if team[..i].contains(member) {
                return Err(GameError::DuplicateTeamMember(member.clone()));
            }
            require_member(game, member)?;
        }

        game.proposed_team = team.iter().cloned().collect();
        game.ballots.clear();
        game.votes_tallied = false;
        game.proposal_number += 1;
        game.phase = Phase::Voting;
        Ok(())
    }

    fn cast_ballot(game: &mut Game, id: &ParticipantId, ballot: Ballot) -> Result<()> {
        require_phase(game, Phase::Voting)?;
        require_member(game, id)?;
        if game.votes_tallied {
            return Err(GameError::TransactionAborted("vote already tallied"));
        }
        if game.ballots.contains_key(id) {
            return Err(GameError::AlreadyVoted(id.clone()));
        }
        game.ballots.insert(id.clone(), ballot);
        Ok(())
    }

    fn submit_card(game: &mut Game, id: &ParticipantId, card: Card) -> Result<()> {
        require_phase(game, Phase::Mission)?;
        require_member(game, id)?;
        if !game.is_on_team(id) {
            return Err(GameError::NotOnTeam(id.clone()));
        }
        if game.card_submitters.contains(id) {
            return Err(GameError::AlreadySubmitted(id.clone()));
        }
        if game.round_processed || game.submitted_cards.len() >= game.proposed_team.len() {
            return Err(GameError::TransactionAborted("card list full"));
        }
        if card == Card::Fail && game.team_of(id) == Some(Team::Good) {
            return Err(GameError::IllegalCard(id.clone()));
        }
        game.submitted_cards.push_back(card);
        game.card_submitters.insert(id.clone());
        Ok(())
    }

    fn assassinate(game: &mut Game, id: &ParticipantId, target: &ParticipantId) -> Result<()> {
        require_phase(game, Phase::Assassination)?;
        require_member(game, id)?;
        if game.role_of(id) != Some(RoleKey::Assassin) {
            return Err(GameError::NotAssassin(id.clone()));
        }
        if game.team_of(target) != Some(Team::Good) {
            return Err(GameError::InvalidTarget(target.clone()));
        }

        if game.role_of(target) == Some(RoleKey::Merlin) {
            finish(game, Some(Team::Evil), WinReason::MerlinAssassinated, Some(target.clone()));
        } else {
            finish(game, Some(Team::Good), WinReason::AssassinationFailed, Some(target.clone()));
        }
        Ok(())
    }

    // === Collection steps ===

    fn tally_votes(game: &mut Game) {
        let mut record = VoteRecord::default();
        for seat in game.seats() {
            match game.ballots.get(seat.id()) {
                Some(Ballot::Approve) => record.approvers.push_back(seat.id().clone()),
                Some(Ballot::Reject) => record.rejecters.push_back(seat.id().clone()),
                None => {}
            }
        }
        record.approved = record.approvers.len() > record.rejecters.len();
        game.votes_tallied = true;

        tracing::debug!(
            game = %game.code,
            round = game.current_round,
            approvals = record.approvers.len(),
            rejections = record.rejecters.len(),
            "vote tallied"
        );

        let approved = record.approved;
        game.last_vote = Some(record);

        if approved {
            game.rejection_count = 0;
            game.submitted_cards.clear();
            game.card_submitters.clear();
            game.round_processed = false;
            game.phase = Phase::Mission;
            return;
        }

        game.rejection_count += 1;
        if game.rejection_count >= MAX_REJECTIONS {
            finish(game, Some(Team::Evil), WinReason::FiveRejections, None);
            return;
        }
        rotate_leader(game);
        game.proposed_team.clear();
        game.ballots.clear();
        game.phase = Phase::TeamSelection;
    }

    fn score_mission(&mut self, game: &mut Game) {
        game.round_processed = true;

        let cards: Vec<Card> = game
            .submitted_cards
            .iter()
            .take(game.proposed_team.len())
            .copied()
            .collect();
        let outcome = resolve_round(&cards, game.current_round, game.table_size());
        game.round_results.push_back(outcome);

        let mut reveal = cards;
        self.rng.shuffle(&mut reveal);
        game.last_mission_cards = reveal.into_iter().collect();

        tracing::debug!(
            game = %game.code,
            round = game.current_round,
            fails = game.last_mission_cards.iter().filter(|c| **c == Card::Fail).count(),
            success = outcome == MissionOutcome::Success,
            "mission scored"
        );

        match evaluate_win(&game.round_results) {
            WinState::Evil => finish(game, Some(Team::Evil), WinReason::EvilWonRounds, None),
            WinState::GoodPendingAssassination => {
                clear_round(game);
                game.round_processed = true;
                game.phase = Phase::Assassination;
            }
            WinState::Undecided => {
                game.current_round += 1;
                rotate_leader(game);
                clear_round(game);
                game.rejection_count = 0;
                game.phase = Phase::TeamSelection;
            }
        }
    }
}

impl RulesEngine for AvalonRules {
    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn apply_action(&mut self, game: &mut Game, actor: &Actor, action: &Action) -> Result<Option<Transition>> {
        let from = game.phase;

        // Work on a copy so a rejected action leaves the record untouched.
        let mut next = game.clone();
        match action {
            Action::UpdateSettings { settings } => {
                require_host(actor)?;
                Self::update_settings(&mut next, settings)?;
            }
            Action::Start => {
                require_host(actor)?;
                self.start(&mut next)?;
            }
            Action::Join { name } => Self::join(&mut next, participant_id(actor)?, name)?,
            Action::Leave => self.leave(&mut next, participant_id(actor)?)?,
            Action::Ready => Self::ready(&mut next, participant_id(actor)?)?,
            Action::ProposeTeam { team } => Self::propose_team(&mut next, participant_id(actor)?, team)?,
            Action::CastBallot { ballot } => Self::cast_ballot(&mut next, participant_id(actor)?, *ballot)?,
            Action::SubmitCard { card } => Self::submit_card(&mut next, participant_id(actor)?, *card)?,
            Action::Assassinate { target } => Self::assassinate(&mut next, participant_id(actor)?, target)?,
        }
        *game = next;

        tracing::trace!(game = %game.code, actor = %actor, action = action.kind(), "action applied");
        Ok(transition(game, from))
    }

    fn pending_step(&self, game: &Game) -> Option<Step> {
        match game.phase {
            Phase::RoleReveal
                if !game.participants.is_empty() && game.participants.values().all(|p| p.ready) =>
            {
                Some(Step::RolesConfirmed)
            }
            Phase::Voting
                if !game.votes_tallied
                    && !game.participants.is_empty()
                    && game.participants.keys().all(|id| game.ballots.contains_key(id)) =>
            {
                Some(Step::VoteComplete)
            }
            Phase::Mission
                if !game.round_processed
                    && !game.proposed_team.is_empty()
                    && game.submitted_cards.len() >= game.proposed_team.len() =>
            {
                Some(Step::MissionComplete)
            }
            _ => None,
        }
    }

    fn advance(&mut self, game: &mut Game) -> Option<Transition> {
        let step = self.pending_step(game)?;
        let from = game.phase;
        match step {
            Step::RolesConfirmed => game.phase = Phase::TeamSelection,
            Step::VoteComplete => Self::tally_votes(game),
            Step::MissionComplete => self.score_mission(game),
        }
        transition(game, from)
    }

    fn delay_for(&self, step: Step, game: &Game) -> Duration {
        match step {
            Step::RolesConfirmed => self.config.role_ready_delay,
            Step::VoteComplete => self.config.vote_reveal_delay,
            Step::MissionComplete => self.config.mission_delay(game.submitted_cards.len()),
        }
    }

    fn is_terminal(&self, game: &Game) -> Option<GameResult> {
        if !game.phase.is_terminal() {
            return None;
        }
        Some(GameResult {
            winner: game.winner,
            reason: game.win_reason,
            assassination_target: game.assassination_target.clone(),
        })
    }
}

fn require_host(actor: &Actor) -> Result<()> {
    match actor {
        Actor::Host => Ok(()),
        Actor::Participant(_) => Err(GameError::HostOnly),
    }
}

fn participant_id(actor: &Actor) -> Result<&ParticipantId> {
    actor.id().ok_or(GameError::ParticipantOnly)
}

fn require_phase(game: &Game, phase: Phase) -> Result<()> {
    if game.phase == phase {
        Ok(())
    } else {
        Err(GameError::WrongPhase(game.phase))
    }
}

fn require_member(game: &Game, id: &ParticipantId) -> Result<()> {
    if game.contains(id) {
        Ok(())
    } else {
        Err(GameError::UnknownParticipant(id.clone()))
    }
}

fn rotate_leader(game: &mut Game) {
    if game.seat_order.is_empty() {
        return;
    }
    game.leader_index = next_seat(game.seat_order.len(), game.leader_index);
    game.current_leader_id = game.seat_order.get(game.leader_index).cloned();
}

fn clear_round(game: &mut Game) {
    game.proposed_team.clear();
    game.ballots.clear();
    game.submitted_cards.clear();
    game.card_submitters.clear();
    game.votes_tallied = false;
    game.round_processed = false;
}

/// Record the outcome. A game that is already over keeps its first outcome.
fn finish(game: &mut Game, winner: Option<Team>, reason: WinReason, target: Option<ParticipantId>) {
    if game.phase.is_terminal() {
        return;
    }
    game.phase = Phase::GameOver;
    game.winner = winner;
    game.win_reason = Some(reason);
    game.assassination_target = target;
}

fn transition(game: &Game, from: Phase) -> Option<Transition> {
    if game.phase == from {
        return None;
    }
    tracing::info!(
        game = %game.code,
        from = %from,
        to = %game.phase,
        round = game.current_round,
        "phase transition"
    );
    Some(Transition { from, to: game.phase })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameCode;
    use crate::rules::mission::fails_required;

    fn rules() -> AvalonRules {
        AvalonRules::new(EngineConfig::immediate().with_seed(7))
    }

    fn actor(id: &str) -> Actor {
        Actor::participant(id)
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn lobby(count: usize) -> Game {
        let mut game = Game::new(GameCode::new("TEST01"), GameSettings::default());
        let mut rules = rules();
        for i in 0..count {
            let id = format!("p{i}");
            rules
                .apply_action(&mut game, &actor(&id), &Action::Join { name: format!("Player {i}") })
                .unwrap();
        }
        game
    }

    /// A started game with every participant ready and roles fixed by hand.
    fn in_team_selection(roles: &[RoleKey]) -> (AvalonRules, Game) {
        let mut rules = rules();
        let mut game = lobby(roles.len());
        rules.apply_action(&mut game, &Actor::Host, &Action::Start).unwrap();

        let order: Vec<_> = (0..roles.len()).map(|i| pid(&format!("p{i}"))).collect();
        for (id, role) in order.iter().zip(roles) {
            game.participants.get_mut(id).unwrap().role = Some(*role);
        }
        game.seat_order = order.iter().cloned().collect();
        game.leader_index = 0;
        game.current_leader_id = Some(order[0].clone());

        for id in &order {
            rules.apply_action(&mut game, &Actor::Participant(id.clone()), &Action::Ready).unwrap();
        }
        assert_eq!(rules.advance(&mut game).map(|t| t.to), Some(Phase::TeamSelection));
        (rules, game)
    }

    fn five() -> (AvalonRules, Game) {
        in_team_selection(&[
            RoleKey::Merlin,
            RoleKey::LoyalServant,
            RoleKey::LoyalServant,
            RoleKey::Assassin,
            RoleKey::Minion,
        ])
    }

    fn vote_all(rules: &mut AvalonRules, game: &mut Game, ballot: Ballot) {
        let ids: Vec<_> = game.seat_order.iter().filter(|id| game.contains(id)).cloned().collect();
        for id in ids {
            rules.apply_action(game, &Actor::Participant(id), &Action::CastBallot { ballot }).unwrap();
        }
    }

    fn propose_current(rules: &mut AvalonRules, game: &mut Game, team: &[&str]) {
        let leader = game.current_leader_id.clone().unwrap();
        rules
            .apply_action(game, &Actor::Participant(leader), &Action::propose(team.iter().copied()))
            .unwrap();
    }

    #[test]
    fn test_next_seat_wraps() {
        assert_eq!(next_seat(7, 6), 0);
        assert_eq!(next_seat(7, 0), 1);
        assert_eq!(next_seat(0, 3), 0);
        let mut index = 2;
        for _ in 0..10 {
            index = next_seat(10, index);
        }
        assert_eq!(index, 2);
    }

    #[test]
    fn test_join_and_rejoin() {
        let mut rules = rules();
        let mut game = lobby(2);
        rules
            .apply_action(&mut game, &actor("p0"), &Action::Join { name: "Renamed".into() })
            .unwrap();
        assert_eq!(game.participant_count(), 2);
        assert_eq!(game.participants[&pid("p0")].name, "Renamed");
    }

    #[test]
    fn test_host_and_participant_actions_are_separate() {
        let mut rules = rules();
        let mut game = lobby(5);
        assert_eq!(
            rules.apply_action(&mut game, &actor("p0"), &Action::Start),
            Err(GameError::HostOnly)
        );
        assert_eq!(
            rules.apply_action(&mut game, &Actor::Host, &Action::Ready),
            Err(GameError::ParticipantOnly)
        );
    }

    #[test]
    fn test_start_requires_supported_count() {
        let mut rules = rules();
        let mut game = lobby(4);
        assert_eq!(
            rules.apply_action(&mut game, &Actor::Host, &Action::Start),
            Err(GameError::InvalidPlayerCount(4))
        );
        assert_eq!(game.phase, Phase::Lobby);

        let mut game = lobby(11);
        assert!(rules.apply_action(&mut game, &Actor::Host, &Action::Start).is_err());
    }

    #[test]
    fn test_start_deals_roles_and_seats() {
        let mut rules = rules();
        let mut game = lobby(5);
        let transition = rules.apply_action(&mut game, &Actor::Host, &Action::Start).unwrap();
        assert_eq!(transition, Some(Transition { from: Phase::Lobby, to: Phase::RoleReveal }));
        assert_eq!(game.seat_order.len(), 5);
        assert!(game.participants.values().all(|p| p.role.is_some() && !p.ready));
        assert_eq!(game.current_leader_id.as_ref(), game.seat_order.front());

        let settings = GameSettings::all();
        assert_eq!(
            rules.apply_action(&mut game, &Actor::Host, &Action::UpdateSettings { settings }),
            Err(GameError::WrongPhase(Phase::RoleReveal))
        );
    }

    #[test]
    fn test_role_reveal_waits_for_everyone() {
        let mut rules = rules();
        let mut game = lobby(5);
        rules.apply_action(&mut game, &Actor::Host, &Action::Start).unwrap();
        for i in 0..4 {
            rules.apply_action(&mut game, &actor(&format!("p{i}")), &Action::Ready).unwrap();
            assert_eq!(rules.pending_step(&game), None);
        }
        rules.apply_action(&mut game, &actor("p4"), &Action::Ready).unwrap();
        assert_eq!(rules.pending_step(&game), Some(Step::RolesConfirmed));
        assert!(rules.advance(&mut game).is_some());
        assert!(rules.advance(&mut game).is_none());
    }

    #[test]
    fn test_leave_policies() {
        let mut rules = rules();
        let mut game = lobby(6);
        rules.apply_action(&mut game, &actor("p5"), &Action::Leave).unwrap();
        assert_eq!(game.participant_count(), 5);

        rules.apply_action(&mut game, &Actor::Host, &Action::Start).unwrap();
        assert_eq!(
            rules.apply_action(&mut game, &actor("p1"), &Action::Leave),
            Err(GameError::SeatFrozen(pid("p1")))
        );
        assert!(game.contains(&pid("p1")));

        let mut aborting =
            AvalonRules::new(EngineConfig::immediate().with_disconnect_policy(DisconnectPolicy::AbortGame));
        aborting.apply_action(&mut game, &actor("p1"), &Action::Leave).unwrap();
        assert_eq!(game.phase, Phase::GameOver);
        let result = aborting.is_terminal(&game).unwrap();
        assert_eq!(result.winner, None);
        assert_eq!(result.reason, Some(WinReason::ParticipantLeft));
    }

    #[test]
    fn test_propose_validation() {
        let (mut rules, mut game) = five();
        assert_eq!(
            rules.apply_action(&mut game, &actor("p1"), &Action::propose(["p0", "p1"])),
            Err(GameError::NotLeader(pid("p1")))
        );
        assert_eq!(
            rules.apply_action(&mut game, &actor("p0"), &Action::propose(["p0", "p1", "p2"])),
            Err(GameError::WrongTeamSize { expected: 2, actual: 3 })
        );
        assert_eq!(
            rules.apply_action(&mut game, &actor("p0"), &Action::propose(["p1", "p1"])),
            Err(GameError::DuplicateTeamMember(pid("p1")))
        );
        assert_eq!(
            rules.apply_action(&mut game, &actor("p0"), &Action::propose(["p1", "ghost"])),
            Err(GameError::UnknownParticipant(pid("ghost")))
        );
        assert_eq!(game.phase, Phase::TeamSelection);

        propose_current(&mut rules, &mut game, &["p0", "p1"]);
        assert_eq!(game.phase, Phase::Voting);
        assert_eq!(game.proposal_number, 1);
    }

    #[test]
    fn test_duplicate_ballot_is_rejected() {
        let (mut rules, mut game) = five();
        propose_current(&mut rules, &mut game, &["p0", "p1"]);
        let approve = Action::CastBallot { ballot: Ballot::Approve };
        let reject = Action::CastBallot { ballot: Ballot::Reject };
        rules.apply_action(&mut game, &actor("p2"), &approve).unwrap();
        let err = rules.apply_action(&mut game, &actor("p2"), &reject).unwrap_err();
        assert_eq!(err, GameError::AlreadyVoted(pid("p2")));
        assert!(err.is_benign());
        assert_eq!(game.ballots[&pid("p2")], Ballot::Approve);

        assert_eq!(
            rules.apply_action(&mut game, &actor("stranger"), &approve),
            Err(GameError::UnknownParticipant(pid("stranger")))
        );
    }

    #[test]
    fn test_tie_vote_is_a_rejection() {
        let (mut rules, mut game) = in_team_selection(&[
            RoleKey::Merlin,
            RoleKey::LoyalServant,
            RoleKey::LoyalServant,
            RoleKey::LoyalServant,
            RoleKey::Assassin,
            RoleKey::Minion,
        ]);
        propose_current(&mut rules, &mut game, &["p0", "p1"]);
        for (i, id) in ["p0", "p1", "p2", "p3", "p4", "p5"].iter().enumerate() {
            let ballot = if i < 3 { Ballot::Approve } else { Ballot::Reject };
            rules.apply_action(&mut game, &actor(id), &Action::CastBallot { ballot }).unwrap();
        }
        let t = rules.advance(&mut game).unwrap();
        assert_eq!(t.to, Phase::TeamSelection);
        assert_eq!(game.rejection_count, 1);
        assert_eq!(game.current_leader_id, Some(pid("p1")));
        let last = game.last_vote.as_ref().unwrap();
        assert!(!last.approved);
        assert_eq!(last.approvers.len(), 3);
    }

    #[test]
    fn test_five_rejections_end_the_game() {
        let (mut rules, mut game) = five();
        for attempt in 1..=5u8 {
            let leader = game.current_leader_id.clone().unwrap();
            let other = game.seat_order.iter().find(|id| **id != leader).cloned().unwrap();
            let team = [leader.as_str().to_owned(), other.as_str().to_owned()];
            rules
                .apply_action(&mut game, &Actor::Participant(leader), &Action::propose(team.iter().map(String::as_str)))
                .unwrap();
            vote_all(&mut rules, &mut game, Ballot::Reject);
            rules.advance(&mut game).unwrap();
            if attempt < 5 {
                assert_eq!(game.rejection_count, attempt);
                assert_eq!(game.phase, Phase::TeamSelection);
            }
        }
        let result = rules.is_terminal(&game).unwrap();
        assert!(result.is_winner(Team::Evil));
        assert_eq!(result.reason, Some(WinReason::FiveRejections));
    }

    #[test]
    fn test_approval_resets_rejections() {
        let (mut rules, mut game) = five();
        propose_current(&mut rules, &mut game, &["p0", "p1"]);
        vote_all(&mut rules, &mut game, Ballot::Reject);
        rules.advance(&mut game);
        assert_eq!(game.rejection_count, 1);

        propose_current(&mut rules, &mut game, &["p1", "p2"]);
        vote_all(&mut rules, &mut game, Ballot::Approve);
        assert_eq!(rules.advance(&mut game).unwrap().to, Phase::Mission);
        assert_eq!(game.rejection_count, 0);
    }

    #[test]
    fn test_vote_tally_is_exactly_once() {
        let (mut rules, mut game) = five();
        propose_current(&mut rules, &mut game, &["p0", "p1"]);
        vote_all(&mut rules, &mut game, Ballot::Approve);
        let mut copy = game.clone();
        assert!(rules.advance(&mut game).is_some());
        assert!(rules.advance(&mut game).is_none());

        // A stale copy that already has the guard set does nothing.
        copy.votes_tallied = true;
        assert!(rules.advance(&mut copy).is_none());
    }

    #[test]
    fn test_card_rules() {
        let (mut rules, mut game) = five();
        propose_current(&mut rules, &mut game, &["p1", "p3"]);
        vote_all(&mut rules, &mut game, Ballot::Approve);
        rules.advance(&mut game);

        let fail = Action::SubmitCard { card: Card::Fail };
        let success = Action::SubmitCard { card: Card::Success };
        assert_eq!(rules.apply_action(&mut game, &actor("p0"), &success), Err(GameError::NotOnTeam(pid("p0"))));
        assert_eq!(rules.apply_action(&mut game, &actor("p1"), &fail), Err(GameError::IllegalCard(pid("p1"))));

        rules.apply_action(&mut game, &actor("p3"), &fail).unwrap();
        assert_eq!(
            rules.apply_action(&mut game, &actor("p3"), &success),
            Err(GameError::AlreadySubmitted(pid("p3")))
        );
        assert_eq!(rules.pending_step(&game), None);

        rules.apply_action(&mut game, &actor("p1"), &success).unwrap();
        assert_eq!(game.submitted_cards.len(), 2);
        assert_eq!(rules.pending_step(&game), Some(Step::MissionComplete));

        let t = rules.advance(&mut game).unwrap();
        assert_eq!(t.to, Phase::TeamSelection);
        assert_eq!(game.round_results.iter().copied().collect::<Vec<_>>(), vec![MissionOutcome::Fail]);
        assert_eq!(game.current_round, 1);
        assert_eq!(game.current_leader_id, Some(pid("p1")));
        assert!(game.submitted_cards.is_empty());
        assert_eq!(game.last_mission_cards.len(), 2);
    }

    fn run_mission(rules: &mut AvalonRules, game: &mut Game, team: &[&str], fail_by: &[&str]) {
        propose_current(rules, game, team);
        vote_all(rules, game, Ballot::Approve);
        rules.advance(game).unwrap();
        for id in team {
            let card = if fail_by.contains(id) { Card::Fail } else { Card::Success };
            rules.apply_action(game, &actor(id), &Action::SubmitCard { card }).unwrap();
        }
        rules.advance(game).unwrap();
    }

    #[test]
    fn test_vacated_seat_keeps_the_table_row() {
        let (mut rules, mut game) = in_team_selection(&[
            RoleKey::Merlin,
            RoleKey::LoyalServant,
            RoleKey::LoyalServant,
            RoleKey::LoyalServant,
            RoleKey::Assassin,
            RoleKey::Minion,
            RoleKey::Minion,
        ]);
        game.participants.remove(&pid("p6"));
        assert_eq!(game.table_size(), 7);
        assert_eq!(fails_required(3, game.table_size()), 2);

        run_mission(&mut rules, &mut game, &["p1", "p2"], &[]);
        run_mission(&mut rules, &mut game, &["p1", "p2", "p4"], &["p4"]);

        // Six present would need four here.
        assert_eq!(game.required_team_size(), Some(3));
        let four = Action::propose(["p0", "p1", "p2", "p3"]);
        assert_eq!(
            rules.apply_action(&mut game, &actor("p2"), &four),
            Err(GameError::WrongTeamSize { expected: 3, actual: 4 })
        );
        run_mission(&mut rules, &mut game, &["p0", "p1", "p2"], &[]);

        // Round four still needs two fails.
        assert_eq!(game.required_team_size(), Some(4));
        run_mission(&mut rules, &mut game, &["p1", "p2", "p4", "p5"], &["p4"]);
        assert_eq!(game.round_results.get(3), Some(&MissionOutcome::Success));
        assert_eq!(game.phase, Phase::Assassination);
    }

    #[test]
    fn test_three_fails_end_the_game() {
        let (mut rules, mut game) = five();
        run_mission(&mut rules, &mut game, &["p3", "p4"], &["p3"]);
        run_mission(&mut rules, &mut game, &["p0", "p3", "p4"], &["p4"]);
        run_mission(&mut rules, &mut game, &["p3", "p4"], &["p3", "p4"]);
        let result = rules.is_terminal(&game).unwrap();
        assert!(result.is_winner(Team::Evil));
        assert_eq!(result.reason, Some(WinReason::EvilWonRounds));
    }

    #[test]
    fn test_assassination() {
        let (mut rules, mut game) = five();
        run_mission(&mut rules, &mut game, &["p0", "p1"], &[]);
        run_mission(&mut rules, &mut game, &["p0", "p1", "p2"], &[]);
        run_mission(&mut rules, &mut game, &["p1", "p2"], &[]);
        assert_eq!(game.phase, Phase::Assassination);
        assert!(rules.is_terminal(&game).is_none());

        let mut merlin_hit = game.clone();

        assert_eq!(
            rules.apply_action(&mut game, &actor("p4"), &Action::Assassinate { target: pid("p0") }),
            Err(GameError::NotAssassin(pid("p4")))
        );
        assert_eq!(
            rules.apply_action(&mut game, &actor("p3"), &Action::Assassinate { target: pid("p4") }),
            Err(GameError::InvalidTarget(pid("p4")))
        );

        rules
            .apply_action(&mut game, &actor("p3"), &Action::Assassinate { target: pid("p1") })
            .unwrap();
        let result = rules.is_terminal(&game).unwrap();
        assert!(result.is_winner(Team::Good));
        assert_eq!(result.reason, Some(WinReason::AssassinationFailed));
        assert_eq!(result.assassination_target, Some(pid("p1")));

        rules
            .apply_action(&mut merlin_hit, &actor("p3"), &Action::Assassinate { target: pid("p0") })
            .unwrap();
        let result = rules.is_terminal(&merlin_hit).unwrap();
        assert!(result.is_winner(Team::Evil));
        assert_eq!(result.reason, Some(WinReason::MerlinAssassinated));
    }

    #[test]
    fn test_delays() {
        let (mut rules, mut game) = five();
        let slow = AvalonRules::default();
        assert_eq!(slow.delay_for(Step::VoteComplete, &game), Duration::from_millis(3000));

        propose_current(&mut rules, &mut game, &["p0", "p1"]);
        vote_all(&mut rules, &mut game, Ballot::Approve);
        rules.advance(&mut game);
        for id in ["p0", "p1"] {
            rules.apply_action(&mut game, &actor(id), &Action::SubmitCard { card: Card::Success }).unwrap();
        }
        assert_eq!(slow.delay_for(Step::MissionComplete, &game), Duration::from_millis(3000));
        assert_eq!(rules.delay_for(Step::MissionComplete, &game), Duration::ZERO);
    }

    #[test]
    fn test_game_over_keeps_first_outcome() {
        let (_, mut game) = five();
        finish(&mut game, Some(Team::Evil), WinReason::FiveRejections, None);
        finish(&mut game, Some(Team::Good), WinReason::AssassinationFailed, None);
        assert_eq!(game.winner, Some(Team::Evil));
        assert_eq!(game.win_reason, Some(WinReason::FiveRejections));
    }

    #[test]
    fn test_rejected_action_leaves_record_untouched() {
        let (mut rules, mut game) = five();
        let before = game.clone();
        let _ = rules.apply_action(&mut game, &actor("p0"), &Action::propose(["p0", "ghost"]));
        assert_eq!(game, before);
    }
}
