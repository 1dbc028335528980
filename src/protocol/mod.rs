//! Aggregation protocol: how devices and the host drive a shared record.
//!
//! ## Flow
//!
//! 1. Devices call `Session` operations; each input is validated against
//!    the latest snapshot and committed with a conditional write.
//! 2. Every observer re-runs completion detection on each pushed snapshot.
//!    The step's guard is set inside the same transaction as the step, so
//!    the first observer to commit wins and the rest see nothing to do.
//! 3. `HostObserver` adds the cosmetic pause before each step.

pub mod observer;
pub mod session;

pub use observer::HostObserver;
pub use session::Session;
