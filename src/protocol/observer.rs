//! Host-side completion detection loop.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use super::session::Session;
use crate::rules::{GameResult, RulesEngine};
use crate::sync::{GameStore, Snapshot};

/// Watches a store and performs every collection step once its inputs are in.
///
/// Any number of observers may watch the same store: the one-shot guards in
/// the record make sure each step is performed once.
pub struct HostObserver<R> {
    session: Session<R>,
}

impl<R: RulesEngine> HostObserver<R> {
    pub fn new(store: Arc<dyn GameStore>, rules: R) -> Self {
        Self { session: Session::new(store, rules) }
    }

    /// Run until the game is over, returning its result.
    ///
    /// Returns `None` if the store stops publishing first.
    pub async fn run(mut self) -> Option<GameResult> {
        let store = Arc::clone(self.session.store_arc());
        let mut rx = store.subscribe();
        let mut latest = store.snapshot();

        loop {
            if let Some(result) = self.session.rules().is_terminal(&latest.game) {
                tracing::info!(game = %latest.game.code, winner = ?result.winner, "observer finished");
                return Some(result);
            }

            if let Some(step) = self.session.rules().pending_step(&latest.game) {
                let delay = self.session.rules().delay_for(step, &latest.game);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match self.session.detect_completion() {
                    Ok(Some(transition)) => {
                        tracing::debug!(game = %latest.game.code, step = ?step, to = %transition.to, "step performed");
                    }
                    Ok(None) => {}
                    Err(err) => tracing::warn!(game = %latest.game.code, error = %err, "completion detection failed"),
                }
                latest = newer(latest, store.snapshot());
                continue;
            }

            match rx.recv().await {
                Ok(snapshot) => latest = newer(latest, snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(game = %latest.game.code, skipped, "observer lagged, re-reading record");
                    latest = newer(latest, store.snapshot());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Keep whichever snapshot is more recent.
fn newer(current: Snapshot, candidate: Snapshot) -> Snapshot {
    if candidate.version >= current.version {
        candidate
    } else {
        current
    }
}
