//! # Dining Monitor
//!
//! A synchronization monitor for the dining philosophers: N threads
//! around a ring of chopsticks, each needing both neighbors' chopsticks to
//! eat, plus one talk privilege that at most one philosopher holds at a
//! time.
//!
//! ## Guarantees
//!
//! - **Mutual exclusion**: adjacent philosophers never eat together
//! - **Talk exclusivity**: at most one philosopher talks at a time
//! - **Bounded starvation**: after `starve_limit` denials a philosopher is
//!   promoted to `Starving` and wins admission over hungry neighbors
//! - **Targeted wakes**: every notification goes to one named waiter
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`Monitor`] | Lock, per-philosopher seats, public operations |
//! | [`MonitorConfig`] | Starvation limit |
//! | [`Phase`] | Eating-cycle state of one philosopher |
//! | [`MonitorStatus`] | Snapshot of the table with invariant check |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::thread;
//! use dining_monitor::Monitor;
//!
//! let monitor = Monitor::new(5)?;
//!
//! thread::scope(|s| {
//!     for id in 1..=5 {
//!         let monitor = &monitor;
//!         s.spawn(move || -> dining_monitor::Result<()> {
//!             for _ in 0..3 {
//!                 monitor.request_resources(id)?;
//!                 monitor.release_resources(id)?;
//!                 monitor.request_talk(id)?;
//!                 monitor.end_talk(id)?;
//!             }
//!             Ok(())
//!         });
//!     }
//! });
//!
//! assert_eq!(monitor.status_report().eating(), 0);
//! # Ok::<(), dining_monitor::MonitorError>(())
//! ```
//!
//! ## Cancellation
//!
//! [`Monitor::interrupt`] cancels a philosopher's blocking wait. The call
//! returns [`MonitorError::Interrupted`] and the table is left valid: the
//! philosopher may retry, or call [`Monitor::abandon`] to withdraw.

mod config;
mod error;
mod monitor;
mod state;
mod table;

pub use config::{MonitorConfig, DEFAULT_STARVE_LIMIT};
pub use error::{InvariantViolation, MonitorError, Operation, Result};
pub use monitor::Monitor;
pub use state::{ActorStatus, MonitorStatus, Phase};
