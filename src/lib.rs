//! # avalon-engine
//!
//! Rules engine for The Resistance: Avalon, played on one shared record that
//! many devices read and write at once.
//!
//! ## Design Principles
//!
//! 1. **One Record**: Every fact about a game lives in the `Game` record.
//!    Devices hold no private state the record cannot reproduce.
//!
//! 2. **Validate at the Authority**: Every input is checked against the
//!    record by the rules engine. Duplicate ballots and cards are rejected,
//!    never trusted to the device.
//!
//! 3. **Exactly-Once Transitions**: Vote tallies and mission scoring carry a
//!    one-shot guard set in the same transaction as the transition, so any
//!    number of observers can race to perform them.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs`, so every
//!   transaction works on a cheap copy of the record.
//!
//! - **Deterministic RNG**: Dealing and reveal shuffles come from a seeded
//!   ChaCha stream; a fixed seed replays a game exactly.
//!
//! ## Modules
//!
//! - `core`: ids, participants, the game record, actions, RNG, configuration
//! - `roles`: role catalog, who-knows-whom, role assignment
//! - `rules`: mission scoring, win evaluation, the phase state machine
//! - `sync`: shared record storage with push and optimistic transactions
//! - `protocol`: device operations and host completion detection
//! - `views`: derived participant and host views
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use avalon_engine::{
//!     AvalonRules, EngineConfig, Game, GameCode, GameSettings, MemoryStore, ParticipantId, Phase,
//!     Session,
//! };
//!
//! let store = Arc::new(MemoryStore::new(Game::new(GameCode::new("CAMLOT"), GameSettings::default())));
//! let mut session = Session::new(store, AvalonRules::new(EngineConfig::immediate().with_seed(1)));
//!
//! for name in ["Ann", "Bo", "Cy", "Di", "Ed"] {
//!     session.join(&ParticipantId::new(name.to_lowercase()), name).unwrap();
//! }
//! session.start().unwrap();
//! assert_eq!(session.game().phase, Phase::RoleReveal);
//! ```

pub mod core;
pub mod protocol;
pub mod roles;
pub mod rules;
pub mod sync;
pub mod views;

// Re-export commonly used types
pub use crate::core::{
    Action, Actor, Ballot, Card, DisconnectPolicy, EngineConfig, Game, GameCode, GameError,
    GameRng, GameSettings, MissionOutcome, Participant, ParticipantId, Phase,
    Result, Seat, WinReason,
};

pub use crate::roles::{Knowledge, KnowledgeLabel, RoleKey, Team};

pub use crate::rules::{AvalonRules, GameResult, RulesEngine, Step, Transition, WinState};

pub use crate::sync::{FieldWrite, GameStore, MemoryBackend, MemoryStore, Patch, Snapshot};

pub use crate::protocol::{HostObserver, Session};

pub use crate::views::{HostView, ParticipantView};
