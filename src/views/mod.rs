//! Derived views for devices and the host display.
//!
//! Views are pure functions of one snapshot. They never fail: a referenced
//! participant that is missing renders as a vacancy and a warning is
//! logged, since the next pushed snapshot will usually fix it.

pub mod host;
pub mod participant;

pub use host::{HostView, MissionToken, SeatView, StartStatus, VoteReveal};
pub use participant::{Choice, Outcome, ParticipantView};
