//! Shared record storage.
//!
//! Every device reads and writes one `Game` record per game code through a
//! `GameStore`:
//! - `subscribe`: whole-record push of every committed version
//! - `set`: replace the record
//! - `update`: conditional field writes, last write wins per field
//! - `transact`: optimistic read-modify-write of the whole record
//!
//! Writers never assume they observe their own write before the next push.

pub mod memory;
pub mod patch;

pub use memory::{MemoryBackend, MemoryStore};
pub use patch::{FieldWrite, Patch};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::{Game, GameCode, Result};

/// A committed version of the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Bumped on every commit.
    pub version: u64,
    pub game: Game,
}

/// Storage for one game record.
///
/// ## Implementation Notes
///
/// - Every commit must bump `version` and push the new snapshot to
///   subscribers
/// - `transact` must re-run `f` against the latest record when another
///   writer commits first, and give up with `TransactionAborted` after the
///   configured number of attempts
/// - An `Err` returned by `f` aborts the transaction without writing
pub trait GameStore: Send + Sync {
    fn code(&self) -> &GameCode;

    /// Latest committed snapshot.
    fn snapshot(&self) -> Snapshot;

    /// Receive every snapshot committed after this call.
    fn subscribe(&self) -> broadcast::Receiver<Snapshot>;

    /// Replace the whole record.
    fn set(&self, game: Game) -> Snapshot;

    /// Apply field writes if the patch preconditions hold.
    fn update(&self, patch: &Patch) -> Result<Snapshot>;

    /// Read-modify-write the record.
    fn transact(&self, f: &mut dyn FnMut(&Game) -> Result<Game>) -> Result<Snapshot>;
}
