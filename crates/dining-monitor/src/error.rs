//! Error types for the dining monitor.
//!
//! The only failure a well-behaved caller observes is a cancelled wait.
//! The remaining variants reject calls that break the acquire/release
//! contract before they can corrupt shared state.

use thiserror::Error;

use crate::state::Phase;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Blocking operations that can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Waiting for both adjacent chopsticks.
    RequestResources,
    /// Waiting for the talk privilege.
    RequestTalk,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestResources => f.write_str("request_resources"),
            Self::RequestTalk => f.write_str("request_talk"),
        }
    }
}

/// Errors surfaced by [`Monitor`](crate::Monitor) operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// A table needs at least one seat.
    #[error("a monitor needs at least one philosopher")]
    EmptyTable,

    /// Actor id outside `[1, N]`.
    #[error("unknown philosopher {id}: ids run from 1 to {count}")]
    UnknownActor {
        /// The id supplied by the caller.
        id: usize,
        /// Number of seats at the table.
        count: usize,
    },

    /// A blocking call was cancelled before its condition held.
    ///
    /// Shared state is left as it was: the actor stays `Hungry`/`Starving`
    /// (or queued for talk) and may retry or [`abandon`](crate::Monitor::abandon).
    #[error("philosopher {id} was interrupted in {operation}")]
    Interrupted {
        /// The interrupted actor.
        id: usize,
        /// The call that was waiting.
        operation: Operation,
    },

    /// `release_resources` called by an actor that is not eating.
    #[error("philosopher {id} cannot release chopsticks while {phase}")]
    NotEating {
        /// The caller.
        id: usize,
        /// Its phase at the time of the call.
        phase: Phase,
    },

    /// `end_talk` called by an actor that does not hold the privilege.
    #[error("philosopher {id} is not talking")]
    NotTalking {
        /// The caller.
        id: usize,
    },

    /// `request_talk` called by the current talker.
    #[error("philosopher {id} is already talking")]
    AlreadyTalking {
        /// The caller.
        id: usize,
    },
}

/// A broken table invariant.
///
/// Unreachable under correct locking. Debug builds treat one as a fatal
/// assertion; tests use [`MonitorStatus::check`](crate::MonitorStatus::check).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two adjacent philosophers hold a shared chopstick.
    #[error("adjacent philosophers {left} and {right} are both eating")]
    AdjacentEating {
        /// First actor id.
        left: usize,
        /// Second actor id.
        right: usize,
    },

    /// The talk privilege names a seat that does not exist.
    #[error("talk privilege held by unknown philosopher {id}")]
    UnknownTalker {
        /// The recorded talker.
        id: usize,
    },

    /// A counter passed the limit without promotion.
    #[error("philosopher {id} has starve count {count} above limit {limit} but is {phase}")]
    UnpromotedStarvation {
        /// The actor.
        id: usize,
        /// Its counter.
        count: u32,
        /// Configured limit.
        limit: u32,
        /// Its phase.
        phase: Phase,
    },
}
