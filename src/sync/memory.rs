//! In-memory store with optimistic version counters.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

use super::{GameStore, Patch, Snapshot};
use crate::core::{EngineConfig, Game, GameCode, GameError, GameRng, GameSettings, Result};

/// Pushed snapshots buffered per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Single-process store for one game record.
#[derive(Debug)]
pub struct MemoryStore {
    code: GameCode,
    current: Mutex<Snapshot>,
    tx: broadcast::Sender<Snapshot>,
    max_retries: u32,
}

impl MemoryStore {
    #[must_use]
    pub fn new(game: Game) -> Self {
        Self::with_config(game, &EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(game: Game, config: &EngineConfig) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            code: game.code.clone(),
            current: Mutex::new(Snapshot { version: 0, game }),
            tx,
            max_retries: config.max_transaction_retries.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `game` as the next version and push it. Caller holds the lock.
    fn commit(&self, current: &mut Snapshot, game: Game) -> Snapshot {
        current.version += 1;
        current.game = game;
        let snapshot = current.clone();
        // No subscribers is fine; the snapshot is still readable.
        let _ = self.tx.send(snapshot.clone());
        snapshot
    }
}

impl GameStore for MemoryStore {
    fn code(&self) -> &GameCode {
        &self.code
    }

    fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    fn set(&self, game: Game) -> Snapshot {
        let mut current = self.lock();
        self.commit(&mut current, game)
    }

    fn update(&self, patch: &Patch) -> Result<Snapshot> {
        let mut current = self.lock();
        let mut game = current.game.clone();
        if let Err(err) = patch.apply(&mut game) {
            tracing::debug!(game = %self.code, phase = %current.game.phase, error = %err, "update rejected");
            return Err(err);
        }
        Ok(self.commit(&mut current, game))
    }

    fn transact(&self, f: &mut dyn FnMut(&Game) -> Result<Game>) -> Result<Snapshot> {
        for attempt in 1..=self.max_retries {
            let base = self.snapshot();
            let next = f(&base.game)?;

            let mut current = self.lock();
            if current.version == base.version {
                return Ok(self.commit(&mut current, next));
            }
            tracing::debug!(
                game = %self.code,
                attempt,
                seen = base.version,
                latest = current.version,
                "transaction lost a race, retrying"
            );
        }
        tracing::warn!(game = %self.code, retries = self.max_retries, "transaction gave up");
        Err(GameError::TransactionAborted("too many concurrent writers"))
    }
}

/// Stores for many games, keyed by code.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    config: EngineConfig,
    stores: Mutex<FxHashMap<GameCode, Arc<MemoryStore>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            stores: Mutex::new(FxHashMap::default()),
        }
    }

    fn stores(&self) -> MutexGuard<'_, FxHashMap<GameCode, Arc<MemoryStore>>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new record under its own code.
    pub fn create(&self, game: Game) -> Result<Arc<MemoryStore>> {
        let mut stores = self.stores();
        if stores.contains_key(&game.code) {
            return Err(GameError::GameExists(game.code.to_string()));
        }
        let code = game.code.clone();
        let store = Arc::new(MemoryStore::with_config(game, &self.config));
        stores.insert(code.clone(), Arc::clone(&store));
        tracing::info!(game = %code, "game created");
        Ok(store)
    }

    /// Create a lobby under a fresh random code.
    pub fn create_lobby(&self, settings: GameSettings, rng: &mut GameRng) -> Arc<MemoryStore> {
        loop {
            let game = Game::new(GameCode::generate(rng), settings);
            if let Ok(store) = self.create(game) {
                return store;
            }
        }
    }

    pub fn open(&self, code: &GameCode) -> Result<Arc<MemoryStore>> {
        self.stores()
            .get(code)
            .cloned()
            .ok_or_else(|| GameError::UnknownGame(code.to_string()))
    }

    pub fn remove(&self, code: &GameCode) -> Option<Arc<MemoryStore>> {
        let removed = self.stores().remove(code);
        if removed.is_some() {
            tracing::info!(game = %code, "game removed");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores().is_empty()
    }
}
