//! Philosopher threads driving the monitor.
//!
//! Each philosopher runs on a scoped thread and borrows the one
//! [`Monitor`] owned by the [`Dinner`]. A round is
//! think → eat → maybe talk. When the optional deadline passes, a watchdog
//! raises the stop flag and interrupts every philosopher; an interrupted
//! philosopher reports the cancelled wait, withdraws its requests and
//! leaves the table.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use dining_monitor::{Monitor, MonitorError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{DinnerConfig, TableConfig};
use crate::report::{DinnerReport, PhilosopherReport};
use crate::{Result, TableError};

/// A table of philosophers sharing one monitor.
///
/// # Example
///
/// ```rust
/// use dining_table::{Dinner, TableConfig};
///
/// let mut config = TableConfig::default();
/// config.dinner.rounds = 3;
/// config.dinner.seed = Some(7);
///
/// let dinner = Dinner::new(config)?;
/// let report = dinner.run()?;
/// assert_eq!(report.total_meals(), 4 * 3);
/// # Ok::<(), dining_table::TableError>(())
/// ```
#[derive(Debug)]
pub struct Dinner {
    config: TableConfig,
    monitor: Monitor,
}

impl Dinner {
    /// Validates `config` and sets the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TableConfig) -> Result<Self> {
        config.validate()?;
        let monitor = Monitor::with_config(config.philosophers, config.monitor)?;
        Ok(Self { config, monitor })
    }

    /// The shared monitor.
    #[must_use]
    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// The configuration this dinner was built from.
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Runs every philosopher to completion or until the deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if a philosopher thread panics or the monitor
    /// rejects a call. Interrupted waits are counted, not returned.
    pub fn run(&self) -> Result<DinnerReport> {
        let seats = self.config.philosophers;
        let dinner = &self.config.dinner;
        let seed = dinner.seed.unwrap_or_else(rand::random);
        let stop = AtomicBool::new(false);
        let started = Instant::now();

        info!(
            philosophers = seats,
            rounds = dinner.rounds,
            starve_limit = self.monitor.starve_limit(),
            seed,
            "dinner started"
        );

        let results = thread::scope(|s| {
            let (done_tx, done_rx) = mpsc::channel::<()>();
            let stop = &stop;

            let watchdog = dinner.deadline_ms.map(|ms| {
                s.spawn(move || self.watch(Duration::from_millis(ms), &done_rx, stop))
            });

            let handles: Vec<_> = (1..=seats)
                .map(|id| {
                    let philosopher = Philosopher {
                        id,
                        monitor: &self.monitor,
                        dinner,
                        stop,
                        rng: StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
                    };
                    (id, s.spawn(move || philosopher.dine()))
                })
                .collect();

            let results: Vec<Result<PhilosopherReport>> = handles
                .into_iter()
                .map(|(id, handle)| {
                    handle
                        .join()
                        .map_err(|_| TableError::PhilosopherPanicked { id })
                        .and_then(|report| report)
                })
                .collect();

            drop(done_tx);
            if let Some(watchdog) = watchdog {
                if watchdog.join().is_err() {
                    warn!("deadline watchdog panicked");
                }
            }
            results
        });

        let philosophers = results.into_iter().collect::<Result<Vec<_>>>()?;
        let interrupted = stop.load(Ordering::Acquire);
        if interrupted {
            // The deadline can fire after a philosopher has left; clear
            // any interrupt it never consumed.
            for id in 1..=seats {
                self.monitor.abandon(id)?;
            }
        }

        let mut report = DinnerReport {
            philosophers,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            stopped_early: false,
            final_status: self.monitor.status_report(),
        };
        report.stopped_early = interrupted && !report.all_completed();

        info!(
            meals = report.total_meals(),
            talks = report.total_talks(),
            elapsed_ms = report.elapsed_ms,
            stopped_early = report.stopped_early,
            "dinner finished"
        );
        Ok(report)
    }

    fn watch(&self, deadline: Duration, done: &mpsc::Receiver<()>, stop: &AtomicBool) {
        if done.recv_timeout(deadline) != Err(RecvTimeoutError::Timeout) {
            return;
        }

        warn!(
            deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            "deadline reached, interrupting philosophers"
        );
        stop.store(true, Ordering::Release);
        for id in 1..=self.config.philosophers {
            if let Err(e) = self.monitor.interrupt(id) {
                warn!(id, error = %e, "failed to interrupt philosopher");
            }
        }
    }
}

struct Philosopher<'a> {
    id: usize,
    monitor: &'a Monitor,
    dinner: &'a DinnerConfig,
    stop: &'a AtomicBool,
    rng: StdRng,
}

impl Philosopher<'_> {
    fn dine(mut self) -> Result<PhilosopherReport> {
        let mut report = PhilosopherReport::new(self.id);
        let mut finished = 0;

        for round in 1..=self.dinner.rounds {
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            match self.round(round, &mut report) {
                Ok(()) => finished = round,
                Err(MonitorError::Interrupted { operation, .. }) => {
                    warn!(id = self.id, round, %operation, "interrupted, leaving the table");
                    report.interruptions += 1;
                    break;
                }
                Err(e) => {
                    warn!(id = self.id, round, error = %e, "call rejected, leaving the table");
                    self.monitor.abandon(self.id)?;
                    return Err(e.into());
                }
            }
        }

        report.completed = finished == self.dinner.rounds;
        if !report.completed {
            self.monitor.abandon(self.id)?;
        }
        Ok(report)
    }

    fn round(
        &mut self,
        round: usize,
        report: &mut PhilosopherReport,
    ) -> dining_monitor::Result<()> {
        self.pause(self.dinner.think_ms);

        let asked = Instant::now();
        self.monitor.request_resources(self.id)?;
        report.record_wait(asked.elapsed());

        debug!(id = self.id, round, "eating");
        self.pause(self.dinner.eat_ms);
        self.monitor.release_resources(self.id)?;
        report.meals += 1;

        if self.rng.gen_bool(self.dinner.talk_probability) {
            self.monitor.request_talk(self.id)?;
            debug!(id = self.id, round, "talking");
            self.pause(self.dinner.talk_ms);
            self.monitor.end_talk(self.id)?;
            report.talks += 1;
        }

        Ok(())
    }

    fn pause(&mut self, max_ms: u64) {
        if max_ms == 0 {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_millis(self.rng.gen_range(0..=max_ms)));
        }
    }
}
