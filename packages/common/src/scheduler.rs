//! # Deferred Callback Scheduler
//!
//! All suspension points in the canvas core (debounce, acknowledgment
//! timeout, retry backoff, drag watchdog, frame throttle) are timers rather
//! than blocking waits. The scheduler holds at most one pending deadline per
//! timer kind: re-arming a kind replaces its previous deadline.
//!
//! Time is always passed in by the caller, which keeps every component
//! deterministic under test and lets any event loop drive it.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use web_time::Instant;

/// Deterministic timer queue keyed by timer kind
#[derive(Debug)]
pub struct Scheduler<K> {
    /// Pending entries ordered by (deadline, insertion sequence)
    queue: BTreeMap<(Instant, u64), K>,

    /// Reverse index so a kind can be re-armed or cancelled
    by_kind: HashMap<K, (Instant, u64)>,

    next_seq: u64,
}

impl<K: Copy + Eq + Hash> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            by_kind: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Arm (or re-arm) a timer
    pub fn schedule(&mut self, kind: K, at: Instant) {
        self.cancel(kind);
        let key = (at, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(key, kind);
        self.by_kind.insert(kind, key);
    }

    /// Cancel a pending timer. Returns true if one was pending.
    pub fn cancel(&mut self, kind: K) -> bool {
        match self.by_kind.remove(&kind) {
            Some(key) => {
                self.queue.remove(&key);
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self, kind: K) -> Option<Instant> {
        self.by_kind.get(&kind).map(|(at, _)| *at)
    }

    pub fn is_pending(&self, kind: K) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest timer due at `now`
    ///
    /// Timers are returned one at a time so that handling one timer may
    /// arm or cancel others before the next is considered.
    pub fn pop_due(&mut self, now: Instant) -> Option<(K, Instant)> {
        let (&(at, seq), _) = self.queue.iter().next()?;
        if at > now {
            return None;
        }

        let kind = self.queue.remove(&(at, seq))?;
        self.by_kind.remove(&kind);
        Some((kind, at))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.by_kind.clear();
    }
}

impl<K: Copy + Eq + Hash> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Timer {
        A,
        B,
    }

    #[test]
    fn test_rearm_replaces_deadline() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();

        scheduler.schedule(Timer::A, t0 + Duration::from_millis(100));
        scheduler.schedule(Timer::A, t0 + Duration::from_millis(300));

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.deadline(Timer::A), Some(t0 + Duration::from_millis(300)));
        assert!(scheduler.pop_due(t0 + Duration::from_millis(200)).is_none());
        assert_eq!(
            scheduler.pop_due(t0 + Duration::from_millis(300)),
            Some((Timer::A, t0 + Duration::from_millis(300)))
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();

        scheduler.schedule(Timer::B, t0 + Duration::from_millis(50));
        scheduler.schedule(Timer::A, t0 + Duration::from_millis(20));

        let now = t0 + Duration::from_millis(100);
        assert_eq!(scheduler.pop_due(now).map(|(k, _)| k), Some(Timer::A));
        assert_eq!(scheduler.pop_due(now).map(|(k, _)| k), Some(Timer::B));
        assert_eq!(scheduler.pop_due(now), None);
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();

        scheduler.schedule(Timer::A, t0);
        assert!(scheduler.cancel(Timer::A));
        assert!(!scheduler.cancel(Timer::A));
        assert_eq!(scheduler.next_deadline(), None);
    }
}
