//! Mission scoring and win evaluation.

use serde::{Deserialize, Serialize};

use crate::core::{Card, MissionOutcome, DOUBLE_FAIL_MIN_PARTICIPANTS, DOUBLE_FAIL_ROUND, ROUNDS_TO_WIN};

/// Fail cards needed to sink round `round` at a table of `participant_count`.
#[must_use]
pub fn fails_required(round: usize, participant_count: usize) -> usize {
    if round == DOUBLE_FAIL_ROUND && participant_count >= DOUBLE_FAIL_MIN_PARTICIPANTS {
        2
    } else {
        1
    }
}

/// Score one round's cards.
///
/// ```
/// use avalon_engine::core::{Card, MissionOutcome};
/// use avalon_engine::rules::resolve_round;
///
/// let cards = [Card::Fail, Card::Success, Card::Fail, Card::Success];
/// assert_eq!(resolve_round(&cards, 3, 7), MissionOutcome::Fail);
/// assert_eq!(resolve_round(&cards[1..], 3, 7), MissionOutcome::Success);
/// ```
#[must_use]
pub fn resolve_round(cards: &[Card], round: usize, participant_count: usize) -> MissionOutcome {
    let fails = cards.iter().filter(|c| **c == Card::Fail).count();
    if fails >= fails_required(round, participant_count) {
        MissionOutcome::Fail
    } else {
        MissionOutcome::Success
    }
}

/// Aggregate state of the round track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinState {
    /// Keep playing.
    Undecided,
    /// Good has three successes; the assassin still gets a shot.
    GoodPendingAssassination,
    Evil,
}

/// Evaluate the round track. Only counts matter, not order.
pub fn evaluate_win<'a, I>(results: I) -> WinState
where
    I: IntoIterator<Item = &'a MissionOutcome>,
{
    let (successes, fails) = results
        .into_iter()
        .fold((0, 0), |(s, f), r| match r {
            MissionOutcome::Success => (s + 1, f),
            MissionOutcome::Fail => (s, f + 1),
        });

    if successes >= ROUNDS_TO_WIN {
        WinState::GoodPendingAssassination
    } else if fails >= ROUNDS_TO_WIN {
        WinState::Evil
    } else {
        WinState::Undecided
    }
}
