//! Outcome of a dinner.

use std::fmt;
use std::time::Duration;

use dining_monitor::MonitorStatus;
use serde::Serialize;

/// What one philosopher managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhilosopherReport {
    /// 1-indexed philosopher id.
    pub id: usize,
    /// Completed meals.
    pub meals: usize,
    /// Completed talks.
    pub talks: usize,
    /// Waits cancelled by the deadline.
    pub interruptions: usize,
    /// Longest time spent blocked for chopsticks, in milliseconds.
    pub longest_wait_ms: u64,
    /// Whether every configured round was completed.
    pub completed: bool,
}

impl PhilosopherReport {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub(crate) fn record_wait(&mut self, waited: Duration) {
        let ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
        self.longest_wait_ms = self.longest_wait_ms.max(ms);
    }
}

/// Summary of a finished dinner.
#[derive(Debug, Clone, Serialize)]
pub struct DinnerReport {
    /// One entry per philosopher, ordered by id.
    pub philosophers: Vec<PhilosopherReport>,
    /// Wall-clock duration of the dinner, in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the deadline cut the dinner short.
    pub stopped_early: bool,
    /// Monitor state after every philosopher left.
    pub final_status: MonitorStatus,
}

impl DinnerReport {
    /// Total meals across the table.
    #[must_use]
    pub fn total_meals(&self) -> usize {
        self.philosophers.iter().map(|p| p.meals).sum()
    }

    /// Total talks across the table.
    #[must_use]
    pub fn total_talks(&self) -> usize {
        self.philosophers.iter().map(|p| p.talks).sum()
    }

    /// True when every philosopher finished all rounds.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.philosophers.iter().all(|p| p.completed)
    }
}

impl fmt::Display for DinnerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4} {:>6} {:>6} {:>12} {:>14} {:>9}",
            "id", "meals", "talks", "interrupted", "longest wait", "finished"
        )?;
        for p in &self.philosophers {
            writeln!(
                f,
                "{:>4} {:>6} {:>6} {:>12} {:>12}ms {:>9}",
                p.id,
                p.meals,
                p.talks,
                p.interruptions,
                p.longest_wait_ms,
                if p.completed { "yes" } else { "no" }
            )?;
        }
        write!(
            f,
            "{} meals, {} talks in {}ms{}",
            self.total_meals(),
            self.total_talks(),
            self.elapsed_ms,
            if self.stopped_early {
                " (stopped at deadline)"
            } else {
                ""
            }
        )
    }
}
