//! Round phases and timer tokens

use std::fmt;
use std::time::Duration;

/// State of the current round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Target or question shown, input locked
    Presenting,
    /// Input unlocked, waiting for exactly one selection
    WaitingForInput,
    /// Answer shown and scored
    Revealing,
    /// All rounds played; only acknowledge-and-exit remains
    Finished,
}

impl Phase {
    pub fn accepts_input(self) -> bool {
        self == Phase::WaitingForInput
    }

    pub fn is_finished(self) -> bool {
        self == Phase::Finished
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Presenting => "presenting",
            Phase::WaitingForInput => "waiting",
            Phase::Revealing => "revealing",
            Phase::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Identifies the session and phase a timer was issued for.
///
/// Every transition bumps the session's generation, so a token from an
/// earlier phase or an abandoned session no longer matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub session_id: u64,
    pub generation: u64,
}

/// Request to fire `token` after `delay`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub delay: Duration,
    pub token: TimerToken,
}
