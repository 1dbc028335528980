//! Game rules: mission scoring, win evaluation and the phase state machine.
//!
//! `RulesEngine` is the seam between the rules and the sync layer; the
//! protocol drives any engine through it and never interprets Avalon
//! concepts directly. `AvalonRules` is the implementation.

pub mod avalon;
pub mod engine;
pub mod mission;

pub use avalon::{next_seat, AvalonRules};
pub use engine::{GameResult, RulesEngine, Step, Transition};
pub use mission::{evaluate_win, fails_required, resolve_round, WinState};
