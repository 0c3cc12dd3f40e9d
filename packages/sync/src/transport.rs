//! # Sync Transport
//!
//! Acknowledgment protocol between the canvas and the host, expressed as a
//! pure state machine. Every input takes `now` and returns the
//! [`SyncAction`]s the orchestrator must carry out; the transport itself
//! never touches timers, storage or the bridge.
//!
//! ```text
//!            submit                ack_success
//!   Idle ──────────────▶ AwaitingAck ──────────────▶ Idle (synced)
//!                          │    ▲
//!      ack_failure/timeout │    │ resend
//!                          ▼    │
//!                        BackingOff
//!                          │
//!          retries spent   ▼
//!                        Idle (failed, rollback)
//! ```
//!
//! At most one snapshot is ever awaiting acknowledgment.

use crate::backoff::RetryPolicy;
use crate::config::SyncConfig;
use crate::errors::{FailureReason, SyncError};
use easel_tree::Snapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use web_time::Instant;

/// User-visible synchronization status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Synced,
    Syncing,
    Failed,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Synced => write!(f, "synced"),
            SyncState::Syncing => write!(f, "syncing"),
            SyncState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingAck,
    BackingOff,
}

/// Side effects requested by the transport, in execution order
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Hand the snapshot to the host bridge
    Submit(Snapshot),
    ScheduleAckTimeout(Instant),
    CancelAckTimeout,
    /// Re-serialize the current tree and call [`SyncTransport::resend`] at this instant
    ScheduleRetry(Instant),
    PersistPending(Snapshot),
    ClearPersisted,
    /// Replace the live tree with this known-good snapshot
    Rollback(Snapshot),
    StatusChanged(SyncState),
    Failed(SyncError),
    /// Mutations were absorbed during the flight; start another cycle now
    Resync,
}

#[derive(Debug)]
pub struct SyncTransport {
    policy: RetryPolicy,
    ack_timeout: Duration,
    phase: Phase,
    state: SyncState,
    last_synced: Option<Snapshot>,
    in_flight: Option<Snapshot>,
    retries_used: u32,
    dirty: bool,
}

impl SyncTransport {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            policy: RetryPolicy::from_config(config),
            ack_timeout: config.ack_timeout(),
            phase: Phase::Idle,
            state: SyncState::Synced,
            last_synced: None,
            in_flight: None,
            retries_used: 0,
            dirty: false,
        }
    }

    /// Treat `snapshot` as already acknowledged (startup baseline)
    pub fn set_baseline(&mut self, snapshot: Snapshot) {
        self.last_synced = Some(snapshot);
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn last_synced(&self) -> Option<&Snapshot> {
        self.last_synced.as_ref()
    }

    /// Snapshot most recently handed to the host, if not yet resolved
    pub fn pending(&self) -> Option<&Snapshot> {
        self.in_flight.as_ref()
    }

    /// Whether a snapshot is awaiting acknowledgment
    pub fn is_in_flight(&self) -> bool {
        self.phase == Phase::AwaitingAck
    }

    /// Whether a cycle is unresolved (awaiting ack or backing off)
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Current attempt number, 1-based; 0 when idle
    pub fn attempt(&self) -> u32 {
        match self.phase {
            Phase::Idle => 0,
            _ => self.retries_used + 1,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that content changed while a cycle is unresolved
    pub fn mark_dirty(&mut self) {
        if self.phase == Phase::AwaitingAck {
            self.dirty = true;
        }
    }

    /// Start a cycle for a freshly serialized snapshot
    ///
    /// Skipped when the snapshot equals the last acknowledged one. While a
    /// cycle is unresolved the request is absorbed instead: an awaiting
    /// request turns dirty, and a pending retry will serialize the latest
    /// tree anyway.
    pub fn submit(&mut self, snapshot: Snapshot, now: Instant) -> Vec<SyncAction> {
        if self.is_busy() {
            debug!(attempt = self.attempt(), "Sync already in progress, absorbing trigger");
            self.mark_dirty();
            return Vec::new();
        }

        if self.last_synced.as_ref() == Some(&snapshot) {
            debug!("Snapshot unchanged since last sync, skipping");
            return self.set_state(SyncState::Synced).into_iter().collect();
        }

        self.start(snapshot, now)
    }

    /// Start a cycle even if the snapshot equals the last acknowledged one
    pub fn retrigger(&mut self, snapshot: Snapshot, now: Instant) -> Vec<SyncAction> {
        if self.is_busy() {
            self.mark_dirty();
            return Vec::new();
        }
        info!("Sync retriggered");
        self.start(snapshot, now)
    }

    fn start(&mut self, snapshot: Snapshot, now: Instant) -> Vec<SyncAction> {
        self.retries_used = 0;
        self.dirty = false;

        let mut actions: Vec<SyncAction> = self.set_state(SyncState::Syncing).into_iter().collect();
        actions.extend(self.send(snapshot, now));
        actions
    }

    /// Send a retry with the current tree's snapshot
    pub fn resend(&mut self, snapshot: Snapshot, now: Instant) -> Vec<SyncAction> {
        if self.phase != Phase::BackingOff {
            warn!("Retry fired with no failed request pending, ignoring");
            return Vec::new();
        }
        debug!(attempt = self.retries_used + 1, "Resending snapshot");
        self.send(snapshot, now)
    }

    fn send(&mut self, snapshot: Snapshot, now: Instant) -> Vec<SyncAction> {
        self.phase = Phase::AwaitingAck;
        self.in_flight = Some(snapshot.clone());

        info!(
            attempt = self.retries_used + 1,
            nodes = snapshot.node_count(),
            "Submitting snapshot"
        );

        vec![
            SyncAction::PersistPending(snapshot.clone()),
            SyncAction::Submit(snapshot),
            SyncAction::ScheduleAckTimeout(now + self.ack_timeout),
        ]
    }

    pub fn ack_success(&mut self, _now: Instant) -> Vec<SyncAction> {
        if self.phase != Phase::AwaitingAck {
            warn!("Success acknowledgment with no request awaiting, ignoring");
            return Vec::new();
        }

        let attempts = self.retries_used + 1;
        self.phase = Phase::Idle;
        self.retries_used = 0;
        self.last_synced = self.in_flight.take();
        info!(attempts, "Snapshot acknowledged");

        let mut actions = vec![SyncAction::CancelAckTimeout, SyncAction::ClearPersisted];
        if self.dirty {
            self.dirty = false;
            actions.push(SyncAction::Resync);
        } else {
            actions.extend(self.set_state(SyncState::Synced));
        }
        actions
    }

    pub fn ack_failure(&mut self, now: Instant) -> Vec<SyncAction> {
        if self.phase != Phase::AwaitingAck {
            warn!("Failure acknowledgment with no request awaiting, ignoring");
            return Vec::new();
        }
        let mut actions = vec![SyncAction::CancelAckTimeout];
        actions.extend(self.fail(FailureReason::Rejected, now));
        actions
    }

    /// The acknowledgment timer fired
    pub fn ack_timeout(&mut self, now: Instant) -> Vec<SyncAction> {
        if self.phase != Phase::AwaitingAck {
            debug!("Stale acknowledgment timeout, ignoring");
            return Vec::new();
        }
        self.fail(FailureReason::Timeout, now)
    }

    fn fail(&mut self, reason: FailureReason, now: Instant) -> Vec<SyncAction> {
        let attempt = self.retries_used + 1;

        if self.policy.allows_retry(self.retries_used) {
            let delay = self.policy.delay(self.retries_used);
            self.retries_used += 1;
            self.phase = Phase::BackingOff;

            let err = SyncError::Transient { attempt, reason };
            debug!(attempt, %reason, delay_ms = delay.as_millis() as u64, "{}", err);
            return vec![SyncAction::Failed(err), SyncAction::ScheduleRetry(now + delay)];
        }

        self.phase = Phase::Idle;
        self.retries_used = 0;
        self.dirty = false;

        let err = SyncError::Terminal {
            attempts: attempt,
            reason,
        };
        error!(attempts = attempt, %reason, "{}", err);

        let mut actions: Vec<SyncAction> = Vec::new();
        if let Some(pending) = self.in_flight.take() {
            actions.push(SyncAction::PersistPending(pending));
        }
        actions.push(SyncAction::Failed(err));
        actions.extend(self.set_state(SyncState::Failed));
        match &self.last_synced {
            Some(good) => actions.push(SyncAction::Rollback(good.clone())),
            None => warn!("No known-good snapshot to roll back to"),
        }
        actions
    }

    fn set_state(&mut self, state: SyncState) -> Option<SyncAction> {
        if self.state == state {
            return None;
        }
        self.state = state;
        Some(SyncAction::StatusChanged(state))
    }
}
