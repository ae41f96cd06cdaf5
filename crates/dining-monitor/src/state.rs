//! Per-actor state and read-only snapshots of the table.

use serde::Serialize;

use crate::error::InvariantViolation;

/// Where a philosopher is in its eating cycle.
///
/// Talking is tracked separately, so a philosopher can hold the talk
/// privilege in any phase without losing its place in the eating cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not competing for chopsticks.
    #[default]
    Thinking,
    /// Waiting for both chopsticks.
    Hungry,
    /// Holding both chopsticks.
    Eating,
    /// Denied more than `starve_limit` times; wins ties against hungry neighbors.
    Starving,
}

impl Phase {
    /// True for the two phases that compete for chopsticks.
    #[inline]
    #[must_use]
    pub const fn wants_to_eat(self) -> bool {
        matches!(self, Self::Hungry | Self::Starving)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Thinking => "thinking",
            Self::Hungry => "hungry",
            Self::Eating => "eating",
            Self::Starving => "starving",
        };
        f.write_str(name)
    }
}

/// Snapshot of one philosopher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActorStatus {
    /// 1-indexed actor id.
    pub id: usize,
    /// Eating-cycle phase.
    pub phase: Phase,
    /// Consecutive denied admissions since the last meal.
    pub starve_count: u32,
    /// Whether this actor holds the talk privilege.
    pub talking: bool,
}

/// Snapshot of the whole table, taken under the monitor lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    /// One entry per seat, ordered by id.
    pub actors: Vec<ActorStatus>,
    /// Id of the current talker, if any.
    pub talker: Option<usize>,
    /// Actors blocked in `request_talk`.
    pub talk_waiters: usize,
    /// Configured starvation limit.
    pub starve_limit: u32,
}

impl MonitorStatus {
    /// Number of philosophers currently eating.
    #[must_use]
    pub fn eating(&self) -> usize {
        self.count(Phase::Eating)
    }

    /// Number of philosophers in `phase`.
    #[must_use]
    pub fn count(&self, phase: Phase) -> usize {
        self.actors.iter().filter(|a| a.phase == phase).count()
    }

    /// True iff someone holds the talk privilege.
    #[inline]
    #[must_use]
    pub fn talking_flag(&self) -> bool {
        self.talker.is_some()
    }

    /// Verifies the table invariants on this snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: adjacent eaters, an unknown
    /// talker, or an unpromoted counter above the limit.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        let n = self.actors.len();
        if n > 1 {
            for (i, actor) in self.actors.iter().enumerate() {
                let next = &self.actors[(i + 1) % n];
                if actor.phase == Phase::Eating && next.phase == Phase::Eating {
                    return Err(InvariantViolation::AdjacentEating {
                        left: actor.id,
                        right: next.id,
                    });
                }
            }
        }

        if let Some(id) = self.talker {
            if id == 0 || id > n {
                return Err(InvariantViolation::UnknownTalker { id });
            }
        }

        for actor in &self.actors {
            if actor.starve_count > self.starve_limit && actor.phase != Phase::Starving {
                return Err(InvariantViolation::UnpromotedStarvation {
                    id: actor.id,
                    count: actor.starve_count,
                    limit: self.starve_limit,
                    phase: actor.phase,
                });
            }
        }

        Ok(())
    }
}
