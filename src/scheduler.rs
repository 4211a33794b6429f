//! Single-shot delayed transitions
//!
//! Timers are kept in a min-heap ordered by deadline, ties broken by
//! scheduling order. Nothing blocks: the driver asks for the next deadline,
//! waits for input up to that point, then drains whatever is due.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// Handle of one scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Entry<E> {
    deadline: Instant,
    id: TimerId,
    owner: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed so BinaryHeap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// A timer that reached its deadline
#[derive(Debug, PartialEq, Eq)]
pub struct Fired<E> {
    pub id: TimerId,
    pub owner: u64,
    pub event: E,
    /// A later timer was scheduled for the same owner before this one fired
    pub superseded: bool,
}

/// Deadline-ordered queue of single-shot timers, one logical slot per owner
pub struct PhaseScheduler<E> {
    heap: BinaryHeap<Entry<E>>,
    /// Most recent timer per owner
    current: FxHashMap<u64, TimerId>,
    next_id: u64,
}

impl<E> PhaseScheduler<E> {
    pub fn new() -> Self {
        PhaseScheduler {
            heap: BinaryHeap::new(),
            current: FxHashMap::default(),
            next_id: 0,
        }
    }

    /// Schedule `event` to fire once, `delay` after `now`.
    ///
    /// An owner's earlier timer is not removed; it still fires, flagged as
    /// superseded.
    pub fn after(&mut self, now: Instant, delay: Duration, owner: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Entry {
            deadline: now + delay,
            id,
            owner,
            event,
        });
        self.current.insert(owner, id);
        id
    }

    /// Pop every timer whose deadline is at or before `now`, earliest first
    pub fn drain_due(&mut self, now: Instant) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while self.heap.peek().is_some_and(|entry| entry.deadline <= now) {
            let Some(entry) = self.heap.pop() else {
                break;
            };
            let superseded = self.current.get(&entry.owner) != Some(&entry.id);
            if !superseded {
                self.current.remove(&entry.owner);
            }
            fired.push(Fired {
                id: entry.id,
                owner: entry.owner,
                event: entry.event,
                superseded,
            });
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Time left until the next deadline, zero if already due
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Outstanding timer for `owner`, if any
    #[cfg(test)]
    pub fn pending_for(&self, owner: u64) -> Option<TimerId> {
        self.current.get(&owner).copied()
    }

    /// Drop the bookkeeping for an abandoned owner. Its queued timers still
    /// fire and come back flagged as superseded.
    pub fn forget(&mut self, owner: u64) {
        self.current.remove(&owner);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<E> Default for PhaseScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = PhaseScheduler::new();
        scheduler.after(t0, ms(300), 1, "late");
        scheduler.after(t0, ms(100), 2, "early");
        scheduler.after(t0, ms(200), 3, "middle");

        let fired: Vec<_> = scheduler
            .drain_due(t0 + ms(300))
            .into_iter()
            .map(|f| f.event)
            .collect();
        assert_eq!(fired, vec!["early", "middle", "late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_not_due_stays_queued() {
        let t0 = Instant::now();
        let mut scheduler = PhaseScheduler::new();
        scheduler.after(t0, ms(500), 1, ());
        assert!(scheduler.drain_due(t0 + ms(499)).is_empty());
        assert_eq!(scheduler.time_until_next(t0 + ms(400)), Some(ms(100)));
        assert_eq!(scheduler.drain_due(t0 + ms(500)).len(), 1);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_fires_exactly_once() {
        let t0 = Instant::now();
        let mut scheduler = PhaseScheduler::new();
        scheduler.after(t0, ms(10), 1, ());
        assert_eq!(scheduler.drain_due(t0 + ms(10)).len(), 1);
        assert!(scheduler.drain_due(t0 + ms(1000)).is_empty());
    }

    #[test]
    fn test_equal_deadlines_keep_schedule_order() {
        let t0 = Instant::now();
        let mut scheduler = PhaseScheduler::new();
        scheduler.after(t0, ms(0), 1, 'a');
        scheduler.after(t0, ms(0), 2, 'b');
        let fired: Vec<_> = scheduler.drain_due(t0).into_iter().map(|f| f.event).collect();
        assert_eq!(fired, vec!['a', 'b']);
    }

    #[test]
    fn test_supersede_only_affects_same_owner() {
        let t0 = Instant::now();
        let mut scheduler = PhaseScheduler::new();
        let first = scheduler.after(t0, ms(100), 7, "first");
        scheduler.after(t0, ms(100), 8, "other owner");
        let second = scheduler.after(t0, ms(200), 7, "second");
        assert_ne!(first, second);
        assert_eq!(scheduler.pending_for(7), Some(second));

        let fired = scheduler.drain_due(t0 + ms(200));
        assert_eq!(fired.len(), 3);
        assert!(fired[0].superseded);
        assert_eq!(fired[0].event, "first");
        assert!(!fired[1].superseded);
        assert!(!fired[2].superseded);
        assert_eq!(scheduler.pending_for(7), None);
    }

    #[test]
    fn test_forget_marks_queued_timer_stale() {
        let t0 = Instant::now();
        let mut scheduler = PhaseScheduler::new();
        scheduler.after(t0, ms(50), 3, ());
        scheduler.forget(3);
        let fired = scheduler.drain_due(t0 + ms(50));
        assert_eq!(fired.len(), 1);
        assert!(fired[0].superseded);
    }
}
