//! The shared state guarded by the monitor lock.
//!
//! Every method here runs with the lock held. Transitions never block and
//! never notify anyone directly: they return the seats that must be woken
//! as [`Wakeups`], and the monitor delivers them. Slots are 0-indexed.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::state::{ActorStatus, MonitorStatus, Phase};

/// Seats whose waiter must be woken after a transition.
///
/// Each entry addresses exactly one philosopher's condition variable.
/// Dropping a non-empty set loses a wake-up, hence `must_use`.
#[must_use = "undelivered wake-ups leave a waiter blocked"]
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Wakeups(Vec<usize>);

impl Wakeups {
    fn push(&mut self, slot: usize) {
        if !self.0.contains(&slot) {
            self.0.push(slot);
        }
    }

    pub(crate) fn extend(&mut self, other: Wakeups) {
        for slot in other.0 {
            self.push(slot);
        }
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[usize] {
        &self.0
    }
}

impl IntoIterator for Wakeups {
    type Item = usize;
    type IntoIter = std::vec::IntoIter<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug)]
pub(crate) struct Table {
    phases: Vec<Phase>,
    starve: Vec<u32>,
    interrupted: Vec<bool>,
    talker: Option<usize>,
    talk_queue: VecDeque<usize>,
    starve_limit: u32,
}

impl Table {
    pub(crate) fn new(seats: usize, starve_limit: u32) -> Self {
        Self {
            phases: vec![Phase::Thinking; seats],
            starve: vec![0; seats],
            interrupted: vec![false; seats],
            talker: None,
            talk_queue: VecDeque::new(),
            starve_limit,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub(crate) fn phase(&self, slot: usize) -> Phase {
        self.phases[slot]
    }

    #[inline]
    fn left(&self, slot: usize) -> usize {
        (slot + 1) % self.len()
    }

    #[inline]
    fn right(&self, slot: usize) -> usize {
        (slot + self.len() - 1) % self.len()
    }

    /// Marks `slot` hungry and runs the admission test.
    ///
    /// A retrying starving philosopher is marked hungry again; its counter
    /// is already past the limit, so a denial promotes it straight back.
    /// One that was admitted while away is already eating.
    pub(crate) fn request(&mut self, slot: usize) -> Wakeups {
        let mut wakeups = Wakeups::default();
        if self.phases[slot] == Phase::Eating {
            return wakeups;
        }
        self.phases[slot] = Phase::Hungry;
        self.test(slot, &mut wakeups);
        wakeups
    }

    /// Puts both chopsticks down and re-tests both neighbors.
    pub(crate) fn release(&mut self, slot: usize) -> Wakeups {
        debug_assert_eq!(self.phases[slot], Phase::Eating);
        self.phases[slot] = Phase::Thinking;
        debug!(id = slot + 1, "chopsticks released");

        let mut wakeups = Wakeups::default();
        self.test(self.right(slot), &mut wakeups);
        self.test(self.left(slot), &mut wakeups);
        wakeups
    }

    /// Returns `slot` to thinking regardless of where its request stands.
    pub(crate) fn abandon_meal(&mut self, slot: usize) -> Wakeups {
        match self.phases[slot] {
            Phase::Thinking => Wakeups::default(),
            Phase::Eating => self.release(slot),
            Phase::Hungry | Phase::Starving => {
                self.phases[slot] = Phase::Thinking;
                self.starve[slot] = 0;
                debug!(id = slot + 1, "request abandoned");

                // A neighbor may have deferred to us.
                let mut wakeups = Wakeups::default();
                self.test(self.right(slot), &mut wakeups);
                self.test(self.left(slot), &mut wakeups);
                wakeups
            }
        }
    }

    /// The admission test.
    ///
    /// No-op unless `slot` wants to eat. A hungry philosopher with clear
    /// neighbors still defers to a starving neighbor; starving philosophers
    /// never defer.
    fn test(&mut self, slot: usize, wakeups: &mut Wakeups) {
        if !self.phases[slot].wants_to_eat() {
            return;
        }

        let left = self.left(slot);
        let right = self.right(slot);

        if self.phases[left] == Phase::Eating || self.phases[right] == Phase::Eating {
            self.deny(slot);
            return;
        }

        if self.phases[slot] != Phase::Starving {
            let mut starving: Vec<usize> = Vec::with_capacity(2);
            for neighbor in [right, left] {
                if neighbor != slot
                    && self.phases[neighbor] == Phase::Starving
                    && !starving.contains(&neighbor)
                {
                    starving.push(neighbor);
                }
            }

            if !starving.is_empty() {
                self.deny(slot);
                for neighbor in starving {
                    debug!(
                        id = slot + 1,
                        starving = neighbor + 1,
                        "deferring to starving neighbor"
                    );
                    self.test(neighbor, wakeups);
                }
                return;
            }
        }

        self.phases[slot] = Phase::Eating;
        self.starve[slot] = 0;
        debug!(id = slot + 1, "admitted to eat");
        wakeups.push(slot);
    }

    fn deny(&mut self, slot: usize) {
        self.starve[slot] = self.starve[slot].saturating_add(1);
        if self.starve[slot] > self.starve_limit && self.phases[slot] != Phase::Starving {
            self.phases[slot] = Phase::Starving;
            info!(
                id = slot + 1,
                denials = self.starve[slot],
                limit = self.starve_limit,
                "philosopher is starving"
            );
        }
    }

    pub(crate) fn interrupt(&mut self, slot: usize) -> Wakeups {
        self.interrupted[slot] = true;
        let mut wakeups = Wakeups::default();
        wakeups.push(slot);
        wakeups
    }

    /// Consumes a pending interrupt.
    pub(crate) fn take_interrupt(&mut self, slot: usize) -> bool {
        std::mem::replace(&mut self.interrupted[slot], false)
    }

    #[inline]
    pub(crate) fn talker(&self) -> Option<usize> {
        self.talker
    }

    /// Grants the talk privilege if it is free.
    pub(crate) fn try_take_talk(&mut self, slot: usize) -> bool {
        if self.talker.is_some() {
            return false;
        }
        self.talker = Some(slot);
        self.talk_queue.retain(|&waiting| waiting != slot);
        debug!(id = slot + 1, "talk privilege granted");
        true
    }

    pub(crate) fn queue_for_talk(&mut self, slot: usize) {
        if !self.talk_queue.contains(&slot) {
            self.talk_queue.push_back(slot);
        }
    }

    /// Frees the talk privilege and wakes one waiter.
    pub(crate) fn end_talk(&mut self, slot: usize) -> Wakeups {
        debug_assert_eq!(self.talker, Some(slot));
        self.talker = None;
        debug!(
            id = slot + 1,
            waiting = self.talk_queue.len(),
            "talk privilege released"
        );
        self.wake_talk_head()
    }

    /// Removes `slot` from the talk queue, passing the wake on if the
    /// privilege is free so it is not lost with the departing waiter.
    pub(crate) fn leave_talk_queue(&mut self, slot: usize) -> Wakeups {
        self.talk_queue.retain(|&waiting| waiting != slot);
        if self.talker.is_none() {
            self.wake_talk_head()
        } else {
            Wakeups::default()
        }
    }

    /// Drops the privilege if `slot` holds it, otherwise leaves the queue.
    pub(crate) fn abandon_talk(&mut self, slot: usize) -> Wakeups {
        if self.talker == Some(slot) {
            self.end_talk(slot)
        } else {
            self.leave_talk_queue(slot)
        }
    }

    fn wake_talk_head(&self) -> Wakeups {
        let mut wakeups = Wakeups::default();
        if let Some(&head) = self.talk_queue.front() {
            wakeups.push(head);
        }
        wakeups
    }

    pub(crate) fn actor_status(&self, slot: usize) -> ActorStatus {
        ActorStatus {
            id: slot + 1,
            phase: self.phases[slot],
            starve_count: self.starve[slot],
            talking: self.talker == Some(slot),
        }
    }

    pub(crate) fn snapshot(&self) -> MonitorStatus {
        MonitorStatus {
            actors: (0..self.len()).map(|slot| self.actor_status(slot)).collect(),
            talker: self.talker.map(|slot| slot + 1),
            talk_waiters: self.talk_queue.len(),
            starve_limit: self.starve_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(table: &Table) {
        table.snapshot().check().unwrap();
    }

    #[test]
    fn test_uncontended_request_is_admitted() {
        let mut table = Table::new(5, 2);
        let wakeups = table.request(0);

        assert_eq!(wakeups.slots(), &[0]);
        assert_eq!(table.phase(0), Phase::Eating);
        assert_eq!(table.starve[0], 0);
    }

    #[test]
    fn test_neighbor_eating_denies_and_counts() {
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        let wakeups = table.request(1);

        assert!(wakeups.slots().is_empty());
        assert_eq!(table.phase(1), Phase::Hungry);
        assert_eq!(table.starve[1], 1);
        assert_valid(&table);
    }

    #[test]
    fn test_release_admits_waiting_neighbor() {
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        let _ = table.request(1);

        let wakeups = table.release(0);
        assert_eq!(wakeups.slots(), &[1]);
        assert_eq!(table.phase(0), Phase::Thinking);
        assert_eq!(table.phase(1), Phase::Eating);
        assert_eq!(table.starve[1], 0);
    }

    #[test]
    fn test_non_adjacent_philosophers_eat_together() {
        let mut table = Table::new(5, 2);
        let _ = table.request(0);
        let wakeups = table.request(2);

        assert_eq!(wakeups.slots(), &[2]);
        assert_eq!(table.snapshot().eating(), 2);
        assert_valid(&table);
    }

    #[test]
    fn test_promotion_after_limit_denials() {
        // Philosophers 1 and 3 take turns while 2 keeps asking.
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        let _ = table.request(1);
        let _ = table.request(2);
        assert_eq!(table.starve[1], 1);

        // 3 is tested first and wins; 2 is denied again.
        let wakeups = table.release(0);
        assert_eq!(wakeups.slots(), &[2]);
        assert_eq!(table.starve[1], 2);
        assert_eq!(table.phase(1), Phase::Hungry);

        let _ = table.request(0);
        let _ = table.request(1);
        assert_eq!(table.starve[1], 3);
        assert_eq!(table.phase(1), Phase::Starving);
        assert_valid(&table);

        // The next release admits the starving philosopher, not 1.
        let wakeups = table.release(2);
        assert_eq!(wakeups.slots(), &[1]);
        assert_eq!(table.phase(1), Phase::Eating);
        assert_eq!(table.starve[1], 0);
        assert_eq!(table.phase(0), Phase::Hungry);
        assert_valid(&table);
    }

    #[test]
    fn test_hungry_defers_to_starving_neighbor() {
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        for _ in 0..3 {
            let _ = table.request(1);
        }
        assert_eq!(table.phase(1), Phase::Starving);
        let _ = table.request(2);
        assert_eq!(table.starve[2], 1);

        // 3 is tested first with clear neighbors, but 2 is starving.
        let wakeups = table.release(0);
        assert_eq!(wakeups.slots(), &[1]);
        assert_eq!(table.phase(1), Phase::Eating);
        assert_eq!(table.phase(2), Phase::Hungry);
        assert_eq!(table.starve[2], 2);
        assert_valid(&table);
    }

    #[test]
    fn test_deferred_philosopher_eats_after_starving_neighbor() {
        let mut table = Table::new(5, 2);
        let _ = table.request(2);
        for _ in 0..3 {
            let _ = table.request(1);
        }
        assert_eq!(table.phase(1), Phase::Starving);

        // 1 has clear neighbors but must wait for starving 2.
        let wakeups = table.request(0);
        assert!(wakeups.slots().is_empty());
        assert_eq!(table.phase(0), Phase::Hungry);

        let wakeups = table.release(2);
        assert_eq!(wakeups.slots(), &[1]);
        assert_eq!(table.phase(0), Phase::Hungry);

        let wakeups = table.release(1);
        assert_eq!(wakeups.slots(), &[0]);
        assert_eq!(table.phase(0), Phase::Eating);
        assert_eq!(table.starve[0], 0);
    }

    #[test]
    fn test_starving_does_not_defer_to_starving() {
        let mut table = Table::new(5, 0);
        let _ = table.request(2);
        let _ = table.request(1);
        let _ = table.request(3);
        assert_eq!(table.phase(1), Phase::Starving);
        assert_eq!(table.phase(3), Phase::Starving);

        // Releasing 3 admits both starving neighbors; they are not adjacent.
        let wakeups = table.release(2);
        assert_eq!(wakeups.slots(), &[1, 3]);
        assert_valid(&table);
    }

    #[test]
    fn test_counter_never_passes_limit_unpromoted() {
        let limit = 3;
        let mut table = Table::new(2, limit);
        let _ = table.request(0);
        for _ in 0..10 {
            let _ = table.request(1);
            if table.phase(1) != Phase::Starving {
                assert!(table.starve[1] <= limit + 1);
            }
            assert_valid(&table);
        }
        assert_eq!(table.phase(1), Phase::Starving);
    }

    #[test]
    fn test_retry_while_neighbor_eats_stays_starving() {
        let mut table = Table::new(2, 0);
        let _ = table.request(0);
        let _ = table.request(1);
        assert_eq!(table.phase(1), Phase::Starving);

        let wakeups = table.request(1);
        assert!(wakeups.slots().is_empty());
        assert_eq!(table.phase(1), Phase::Starving);
        assert_eq!(table.starve[1], 2);
        assert_valid(&table);
    }

    #[test]
    fn test_starving_retry_defers_to_starving_neighbor() {
        let mut table = Table::new(4, 0);
        let _ = table.request(2);
        let _ = table.request(1);
        assert_eq!(table.phase(1), Phase::Starving);

        // 1 has clear neighbors, defers to starving 2 and is promoted.
        let _ = table.request(0);
        assert_eq!(table.phase(0), Phase::Starving);
        assert_eq!(table.starve[0], 1);

        // On retry 1 is hungry again, so it still defers to 2.
        let wakeups = table.request(0);
        assert!(wakeups.slots().is_empty());
        assert_eq!(table.phase(0), Phase::Starving);
        assert_eq!(table.starve[0], 2);
        assert_eq!(table.phase(1), Phase::Starving);
        assert_valid(&table);
    }

    #[test]
    fn test_deferral_to_same_neighbor_on_both_sides_counts_once() {
        let mut table = Table::new(2, 0);
        let _ = table.request(0);
        let _ = table.request(1);
        assert_eq!(table.phase(1), Phase::Starving);

        // Put 1 down without re-testing so 2 is starving with clear chopsticks.
        table.phases[0] = Phase::Thinking;
        let before = table.starve[0];

        let wakeups = table.request(0);
        assert_eq!(wakeups.slots(), &[1]);
        assert_eq!(table.starve[0], before + 1);
        assert_eq!(table.phase(1), Phase::Eating);
        assert_eq!(table.phase(0), Phase::Starving);
        assert_valid(&table);
    }

    #[test]
    fn test_hungry_defers_to_both_starving_neighbors() {
        let mut table = Table::new(4, 0);
        let _ = table.request(1);
        let _ = table.request(3);
        let _ = table.request(0);
        let _ = table.request(2);
        assert_eq!(table.phase(0), Phase::Starving);
        assert_eq!(table.phase(2), Phase::Starving);

        // Put 2 and 4 down without re-testing; 2 then faces starving 1 and 3.
        table.phases[1] = Phase::Thinking;
        table.phases[3] = Phase::Thinking;

        let wakeups = table.request(1);
        assert_eq!(wakeups.slots(), &[0, 2]);
        assert_eq!(table.phase(0), Phase::Eating);
        assert_eq!(table.phase(2), Phase::Eating);
        assert_eq!(table.phase(1), Phase::Starving);
        assert_eq!(table.starve[1], 1);
        assert_valid(&table);
    }

    #[test]
    fn test_retry_while_already_eating_is_noop() {
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        let wakeups = table.request(0);
        assert!(wakeups.slots().is_empty());
        assert_eq!(table.phase(0), Phase::Eating);
    }

    #[test]
    fn test_single_seat_always_eats() {
        let mut table = Table::new(1, 2);
        let wakeups = table.request(0);
        assert_eq!(wakeups.slots(), &[0]);
        let _ = table.release(0);
        assert_eq!(table.phase(0), Phase::Thinking);
    }

    #[test]
    fn test_full_cycle_restores_initial_state() {
        let mut table = Table::new(5, 2);
        let before = table.snapshot();
        for slot in 0..5 {
            let _ = table.request(slot);
            let _ = table.release(slot);
        }
        assert_eq!(table.snapshot(), before);
    }

    #[test]
    fn test_abandon_hungry_resets_and_retests() {
        let mut table = Table::new(3, 0);
        let _ = table.request(0);
        let _ = table.request(1);
        assert_eq!(table.phase(1), Phase::Starving);

        let wakeups = table.abandon_meal(1);
        assert!(wakeups.slots().is_empty());
        assert_eq!(table.phase(1), Phase::Thinking);
        assert_eq!(table.starve[1], 0);
        assert_valid(&table);
    }

    #[test]
    fn test_abandon_unblocks_deferring_neighbor() {
        let mut table = Table::new(5, 2);
        let _ = table.request(2);
        for _ in 0..3 {
            let _ = table.request(1);
        }
        let _ = table.request(0);
        assert_eq!(table.phase(0), Phase::Hungry);

        let wakeups = table.abandon_meal(1);
        assert_eq!(wakeups.slots(), &[0]);
        assert_eq!(table.phase(0), Phase::Eating);
    }

    #[test]
    fn test_abandon_while_eating_releases() {
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        let _ = table.request(1);
        let wakeups = table.abandon_meal(0);
        assert_eq!(wakeups.slots(), &[1]);
    }

    #[test]
    fn test_interrupt_is_consumed_once() {
        let mut table = Table::new(2, 2);
        let wakeups = table.interrupt(1);
        assert_eq!(wakeups.slots(), &[1]);
        assert!(table.take_interrupt(1));
        assert!(!table.take_interrupt(1));
    }

    #[test]
    fn test_talk_is_exclusive() {
        let mut table = Table::new(3, 2);
        assert!(table.try_take_talk(0));
        assert!(!table.try_take_talk(1));
        assert_eq!(table.talker(), Some(0));
        assert!(table.snapshot().actors[0].talking);
    }

    #[test]
    fn test_end_talk_wakes_queue_head_only() {
        let mut table = Table::new(4, 2);
        assert!(table.try_take_talk(0));
        table.queue_for_talk(2);
        table.queue_for_talk(1);
        table.queue_for_talk(2);
        assert_eq!(table.snapshot().talk_waiters, 2);

        let wakeups = table.end_talk(0);
        assert_eq!(wakeups.slots(), &[2]);
        assert_eq!(table.talker(), None);

        assert!(table.try_take_talk(2));
        assert_eq!(table.snapshot().talk_waiters, 1);
    }

    #[test]
    fn test_leaving_queue_passes_wake_when_free() {
        let mut table = Table::new(4, 2);
        table.queue_for_talk(1);
        table.queue_for_talk(2);

        let wakeups = table.leave_talk_queue(1);
        assert_eq!(wakeups.slots(), &[2]);

        assert!(table.try_take_talk(3));
        let wakeups = table.leave_talk_queue(2);
        assert!(wakeups.slots().is_empty());
    }

    #[test]
    fn test_talking_does_not_touch_phase() {
        let mut table = Table::new(3, 2);
        let _ = table.request(0);
        assert!(table.try_take_talk(0));
        assert_eq!(table.phase(0), Phase::Eating);
        let _ = table.end_talk(0);
        assert_eq!(table.phase(0), Phase::Eating);
    }
}
