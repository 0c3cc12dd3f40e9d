//! # Change Detector
//!
//! Single dispatch point for mutation notifications drained from the
//! visual tree journal.
//!
//! Filtering happens before any listener runs. A record is dropped when:
//! - its target is not attached under the canvas root,
//! - its target, an added node, or a removed node carries a marker class,
//! - it is a class change whose previous value carried a marker class.
//!
//! A batch with at least one surviving record (re)arms a trailing-edge
//! debounce. Only the deadline after the last qualifying batch fires.

use easel_tree::{ContentFilter, MutationBatch, MutationKind, MutationRecord};
use std::time::Duration;
use tracing::debug;
use web_time::Instant;

pub type ListenerId = u64;

type MutationListener = Box<dyn FnMut(&MutationBatch)>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectorStats {
    /// Batches dispatched
    pub observed: u64,
    /// Batches dropped entirely by the filter
    pub filtered: u64,
    /// Batches that reached listeners
    pub qualifying: u64,
    /// Debounce deadlines that fired
    pub fired: u64,
}

pub struct ChangeDetector {
    filter: ContentFilter,
    debounce: Duration,
    deadline: Option<Instant>,
    listeners: Vec<(ListenerId, MutationListener)>,
    next_listener: ListenerId,
    stats: DetectorStats,
}

impl ChangeDetector {
    pub fn new(filter: ContentFilter, debounce: Duration) -> Self {
        Self {
            filter,
            debounce,
            deadline: None,
            listeners: Vec::new(),
            next_listener: 0,
            stats: DetectorStats::default(),
        }
    }

    /// Register a listener for qualifying (already filtered) batches
    pub fn subscribe(&mut self, listener: impl FnMut(&MutationBatch) + 'static) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn is_qualifying_record(&self, record: &MutationRecord) -> bool {
        if !record.attached {
            return false;
        }

        let touches_marker = self.filter.has_marker(&record.target.classes)
            || record
                .added
                .iter()
                .chain(record.removed.iter())
                .any(|node| self.filter.has_marker(&node.classes));
        if touches_marker {
            return false;
        }

        match &record.kind {
            MutationKind::Attribute {
                name,
                old_value: Some(old),
            } if name == "class" => !self.filter.class_value_has_marker(old),
            _ => true,
        }
    }

    pub fn is_qualifying(&self, batch: &MutationBatch) -> bool {
        batch.records.iter().any(|r| self.is_qualifying_record(r))
    }

    /// Filter, notify listeners, and arm the debounce
    ///
    /// Returns the new debounce deadline when at least one batch qualified.
    pub fn dispatch(&mut self, batches: Vec<MutationBatch>, now: Instant) -> Option<Instant> {
        let mut armed = false;

        for batch in batches {
            self.stats.observed += 1;

            let records: Vec<MutationRecord> = batch
                .records
                .into_iter()
                .filter(|r| self.is_qualifying_record(r))
                .collect();

            if records.is_empty() {
                self.stats.filtered += 1;
                debug!(batch = batch.seq, "Ignored internal mutation batch");
                continue;
            }

            let filtered = MutationBatch {
                seq: batch.seq,
                records,
            };
            self.stats.qualifying += 1;
            for (_, listener) in self.listeners.iter_mut() {
                listener(&filtered);
            }
            armed = true;
        }

        if !armed {
            return None;
        }

        let deadline = now + self.debounce;
        self.deadline = Some(deadline);
        debug!(debounce_ms = self.debounce.as_millis() as u64, "Debounce armed");
        Some(deadline)
    }

    /// Fire the trailing edge if the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.stats.fired += 1;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drop a pending debounce without firing it
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats
    }
}
