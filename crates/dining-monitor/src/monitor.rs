//! # Dining Monitor
//!
//! A single mutex guards the whole `Table`; each philosopher owns a
//! `Seat` with its own condition variable. Blocking calls wait on their
//! own seat, and every transition names exactly which seats to wake, so
//! no call ever broadcasts.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Monitor                    │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ Mutex<Table>                           │  │
//! │  │   phases · starve counters · talker    │  │
//! │  │   talk queue · interrupt marks         │  │
//! │  └────────────────────────────────────────┘  │
//! │  ┌──────┬──────┬──────┬──────┬──────┐        │
//! │  │Seat 1│Seat 2│Seat 3│ ...  │Seat N│        │
//! │  └──────┴──────┴──────┴──────┴──────┘        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dining_monitor::{Monitor, Phase};
//!
//! let monitor = Monitor::new(5)?;
//!
//! monitor.request_resources(1)?;
//! assert_eq!(monitor.status(1)?.phase, Phase::Eating);
//! monitor.release_resources(1)?;
//!
//! monitor.request_talk(3)?;
//! monitor.end_talk(3)?;
//! # Ok::<(), dining_monitor::MonitorError>(())
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Operation, Result};
use crate::state::{ActorStatus, MonitorStatus, Phase};
use crate::table::{Table, Wakeups};

/// One philosopher's wake channel.
#[derive(Debug, Default)]
struct Seat {
    ready: Condvar,
}

impl Seat {
    fn wake(&self) {
        self.ready.notify_one();
    }
}

/// Synchronization monitor for N philosophers around a ring of chopsticks.
///
/// Philosophers are identified by ids `1..=N`. The monitor is shared by
/// reference between the philosopher threads, usually through
/// `std::thread::scope` or an `Arc`.
///
/// # Contract
///
/// Every successful [`request_resources`](Self::request_resources) must be
/// followed by [`release_resources`](Self::release_resources), and every
/// successful [`request_talk`](Self::request_talk) by
/// [`end_talk`](Self::end_talk). A caller whose wait was
/// [interrupted](Self::interrupt) either retries or calls
/// [`abandon`](Self::abandon).
#[derive(Debug)]
pub struct Monitor {
    config: MonitorConfig,
    table: Mutex<Table>,
    seats: Box<[Seat]>,
}

impl Monitor {
    /// Creates a monitor for `philosophers` seats with the default limit.
    ///
    /// # Errors
    ///
    /// [`MonitorError::EmptyTable`] when `philosophers` is zero.
    pub fn new(philosophers: usize) -> Result<Self> {
        Self::with_config(philosophers, MonitorConfig::new())
    }

    /// Creates a monitor with a custom configuration.
    ///
    /// # Errors
    ///
    /// [`MonitorError::EmptyTable`] when `philosophers` is zero.
    pub fn with_config(philosophers: usize, config: MonitorConfig) -> Result<Self> {
        if philosophers == 0 {
            return Err(MonitorError::EmptyTable);
        }

        debug!(
            philosophers,
            starve_limit = config.starve_limit,
            "monitor created"
        );

        Ok(Self {
            table: Mutex::new(Table::new(philosophers, config.starve_limit)),
            seats: (0..philosophers).map(|_| Seat::default()).collect(),
            config,
        })
    }

    /// Number of seats at the table.
    #[inline]
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.seats.len()
    }

    /// The configured starvation limit.
    #[inline]
    #[must_use]
    pub const fn starve_limit(&self) -> u32 {
        self.config.starve_limit
    }

    /// Blocks until philosopher `id` holds both adjacent chopsticks.
    ///
    /// On return the philosopher is `Eating`. A philosopher that was
    /// admitted while it was away returns immediately.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::UnknownActor`] for an id outside `1..=N`
    /// - [`MonitorError::Interrupted`] if [`interrupt`](Self::interrupt)ed
    ///   before admission; the philosopher stays hungry or starving
    pub fn request_resources(&self, id: usize) -> Result<()> {
        let slot = self.slot(id)?;
        let mut table = self.lock();

        let wakeups = table.request(slot);
        self.deliver(wakeups);
        Self::verify(&table);

        while table.phase(slot) != Phase::Eating {
            if table.take_interrupt(slot) {
                warn!(id, phase = %table.phase(slot), "wait for chopsticks interrupted");
                return Err(MonitorError::Interrupted {
                    id,
                    operation: Operation::RequestResources,
                });
            }
            table = self.wait(slot, table);
        }

        Ok(())
    }

    /// Puts down both chopsticks and re-tests both neighbors. Never blocks.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::UnknownActor`] for an id outside `1..=N`
    /// - [`MonitorError::NotEating`] if the philosopher is not eating
    pub fn release_resources(&self, id: usize) -> Result<()> {
        let slot = self.slot(id)?;
        let mut table = self.lock();

        let phase = table.phase(slot);
        if phase != Phase::Eating {
            return Err(MonitorError::NotEating { id, phase });
        }

        let wakeups = table.release(slot);
        self.deliver(wakeups);
        Self::verify(&table);
        Ok(())
    }

    /// Blocks until philosopher `id` holds the talk privilege.
    ///
    /// Talking is independent of the eating cycle: the philosopher's phase
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::UnknownActor`] for an id outside `1..=N`
    /// - [`MonitorError::AlreadyTalking`] if `id` already holds the privilege
    /// - [`MonitorError::Interrupted`] if interrupted while waiting
    pub fn request_talk(&self, id: usize) -> Result<()> {
        let slot = self.slot(id)?;
        let mut table = self.lock();

        if table.talker() == Some(slot) {
            return Err(MonitorError::AlreadyTalking { id });
        }

        if !table.try_take_talk(slot) {
            table.queue_for_talk(slot);
            loop {
                if table.take_interrupt(slot) {
                    let wakeups = table.leave_talk_queue(slot);
                    self.deliver(wakeups);
                    warn!(id, "wait for talk privilege interrupted");
                    return Err(MonitorError::Interrupted {
                        id,
                        operation: Operation::RequestTalk,
                    });
                }
                table = self.wait(slot, table);
                if table.try_take_talk(slot) {
                    break;
                }
            }
        }

        Self::verify(&table);
        Ok(())
    }

    /// Releases the talk privilege and wakes one waiting philosopher.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::UnknownActor`] for an id outside `1..=N`
    /// - [`MonitorError::NotTalking`] if `id` does not hold the privilege
    pub fn end_talk(&self, id: usize) -> Result<()> {
        let slot = self.slot(id)?;
        let mut table = self.lock();

        if table.talker() != Some(slot) {
            return Err(MonitorError::NotTalking { id });
        }

        let wakeups = table.end_talk(slot);
        self.deliver(wakeups);
        Self::verify(&table);
        Ok(())
    }

    /// Cancels philosopher `id`'s current or next blocking wait.
    ///
    /// A blocked call returns [`MonitorError::Interrupted`]. If `id` is not
    /// blocked, the mark stays pending until a call would have to wait.
    ///
    /// # Errors
    ///
    /// [`MonitorError::UnknownActor`] for an id outside `1..=N`.
    pub fn interrupt(&self, id: usize) -> Result<()> {
        let slot = self.slot(id)?;
        let mut table = self.lock();
        debug!(id, "interrupt requested");
        let wakeups = table.interrupt(slot);
        self.deliver(wakeups);
        Ok(())
    }

    /// Withdraws everything philosopher `id` asked for.
    ///
    /// Used after an interrupted wait when the caller will not retry. A
    /// pending request returns to `Thinking` and its neighbors are
    /// re-tested; chopsticks granted while the caller was away are put
    /// down; the talk privilege or a place in its queue is given up. Any
    /// pending interrupt is cleared.
    ///
    /// # Errors
    ///
    /// [`MonitorError::UnknownActor`] for an id outside `1..=N`.
    pub fn abandon(&self, id: usize) -> Result<()> {
        let slot = self.slot(id)?;
        let mut table = self.lock();

        let mut wakeups = table.abandon_meal(slot);
        wakeups.extend(table.abandon_talk(slot));
        table.take_interrupt(slot);
        self.deliver(wakeups);
        Self::verify(&table);
        Ok(())
    }

    /// Snapshot of one philosopher.
    ///
    /// # Errors
    ///
    /// [`MonitorError::UnknownActor`] for an id outside `1..=N`.
    pub fn status(&self, id: usize) -> Result<ActorStatus> {
        let slot = self.slot(id)?;
        Ok(self.lock().actor_status(slot))
    }

    /// Snapshot of the whole table.
    #[must_use]
    pub fn status_report(&self) -> MonitorStatus {
        self.lock().snapshot()
    }

    fn slot(&self, id: usize) -> Result<usize> {
        if id == 0 || id > self.seats.len() {
            return Err(MonitorError::UnknownActor {
                id,
                count: self.seats.len(),
            });
        }
        Ok(id - 1)
    }

    // A panic under the lock only happens on an invariant violation, which
    // is already fatal, so poisoning carries no extra information.
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, slot: usize, table: MutexGuard<'a, Table>) -> MutexGuard<'a, Table> {
        self.seats[slot]
            .ready
            .wait(table)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, wakeups: Wakeups) {
        for slot in wakeups {
            self.seats[slot].wake();
        }
    }

    fn verify(table: &Table) {
        if cfg!(debug_assertions) {
            if let Err(violation) = table.snapshot().check() {
                panic!("monitor invariant violated: {violation}");
            }
        }
    }
}
