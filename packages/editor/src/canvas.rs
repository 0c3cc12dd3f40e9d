//! # Canvas
//!
//! Owns every piece of the editing core and carries out the actions and
//! effects the clock-free components ask for.
//!
//! ```text
//!  host edits ─▶ VisualTree ─journal─▶ ChangeDetector ─Debounce─┐
//!                   ▲                                           ▼
//!   pointer ─▶ DragController ─Drop─▶ execute      Serializer ─▶ SyncTransport
//!                   │                                           │
//!        Watchdog/Frame timers        AckTimeout/RetryBackoff ◀─┤
//!                                                               ▼
//!                                              HostBridge / SnapshotStore
//! ```
//!
//! Every input takes `now`. Timers live in one [`Scheduler`] with one
//! entry per [`TimerKind`]; [`Canvas::advance`] fires everything due, each
//! timer at its own deadline, so a caller jumping the clock forward still
//! sees retries and timeouts in the order they would have happened.

use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::events::EditorEvent;
use easel_common::{Point, Scheduler};
use easel_drag::{
    content_index, execute, CancelReason, DragController, DragEffect, DragFeedback, DragSource,
    DragState, DropCommit, DropPayload, DropRequest, IndicatorFeedback, Modifiers, PaletteItem,
};
use easel_sync::{
    recover, rollback, ChangeDetector, DetectorStats, HostBridge, ListenerId, MemoryStore,
    PendingSnapshot, SnapshotStore, SyncAction, SyncError, SyncState, SyncTransport,
};
use easel_tree::{
    rebuild_into, ContentFilter, IdGenerator, MutationBatch, NodeKey, Serializer, Snapshot,
    TreeError, VisualTree,
};
use tracing::{debug, error, info, warn};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Debounce,
    AckTimeout,
    RetryBackoff,
    Watchdog,
    Frame,
}

pub struct CanvasBuilder {
    config: EditorConfig,
    tree: Option<VisualTree>,
    ids: Option<IdGenerator>,
    bridge: Option<Box<dyn HostBridge>>,
    store: Option<Box<dyn SnapshotStore>>,
    feedback: Option<Box<dyn DragFeedback>>,
}

impl CanvasBuilder {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            tree: None,
            ids: None,
            bridge: None,
            store: None,
            feedback: None,
        }
    }

    /// Start from an existing tree instead of an empty `<main>`
    pub fn with_tree(mut self, tree: VisualTree) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Fixed id generator, for reproducible ids
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn with_bridge(mut self, bridge: impl HostBridge + 'static) -> Self {
        self.bridge = Some(Box::new(bridge));
        self
    }

    pub fn with_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_feedback(mut self, feedback: impl DragFeedback + 'static) -> Self {
        self.feedback = Some(Box::new(feedback));
        self
    }

    /// Assemble the canvas and run startup
    ///
    /// With a bridge, a pending snapshot left in the store is restored and
    /// submitted once; otherwise the current tree becomes the known-good
    /// baseline. Without a bridge, synchronization stays off for the
    /// lifetime of the canvas.
    pub fn build(self, now: Instant) -> Result<Canvas, EditorError> {
        let config = self.config;
        let filter = config.content.clone();
        let ids = self
            .ids
            .unwrap_or_else(|| IdGenerator::new(config.serializer.id_prefix.clone()));
        let feedback = self
            .feedback
            .unwrap_or_else(|| Box::new(IndicatorFeedback::new(config.drag.indicator_class.clone())));

        let mut canvas = Canvas {
            tree: self.tree.unwrap_or_else(|| VisualTree::new("main")),
            serializer: Serializer::new(filter.clone(), ids),
            detector: ChangeDetector::new(filter.clone(), config.sync.debounce()),
            transport: SyncTransport::new(&config.sync),
            drag: DragController::new(config.drag.clone(), config.zones.clone()),
            feedback,
            scheduler: Scheduler::new(),
            bridge: self.bridge,
            store: self.store.unwrap_or_else(|| Box::new(MemoryStore::new())),
            events: Vec::new(),
            filter,
            config,
        };
        // construction is not an edit
        canvas.tree.discard_mutations();

        if canvas.bridge.is_none() {
            let err = SyncError::BridgeUnavailable;
            error!("{}", err);
            canvas.events.push(EditorEvent::BridgeUnavailable);
            return Ok(canvas);
        }

        let root = canvas.tree.root();
        match recover(&mut canvas.tree, root, canvas.store.as_mut())? {
            Some(pending) => {
                canvas.events.push(EditorEvent::Recovered {
                    nodes: pending.snapshot.node_count(),
                });
                canvas.sync_now(now)?;
            }
            None => {
                let baseline = canvas.serialize()?;
                info!(nodes = baseline.node_count(), "Canvas ready");
                canvas.transport.set_baseline(baseline);
            }
        }
        Ok(canvas)
    }
}

pub struct Canvas {
    config: EditorConfig,
    filter: ContentFilter,
    tree: VisualTree,
    serializer: Serializer,
    detector: ChangeDetector,
    transport: SyncTransport,
    drag: DragController,
    feedback: Box<dyn DragFeedback>,
    scheduler: Scheduler<TimerKind>,
    bridge: Option<Box<dyn HostBridge>>,
    store: Box<dyn SnapshotStore>,
    events: Vec<EditorEvent>,
}

impl Canvas {
    pub fn builder(config: EditorConfig) -> CanvasBuilder {
        CanvasBuilder::new(config)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    /// Direct tree access; edits are picked up on the next [`Canvas::advance`]
    pub fn tree_mut(&mut self) -> &mut VisualTree {
        &mut self.tree
    }

    pub fn sync_state(&self) -> SyncState {
        self.transport.state()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn last_synced(&self) -> Option<&Snapshot> {
        self.transport.last_synced()
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.bridge.is_some()
    }

    pub fn detector_stats(&self) -> DetectorStats {
        self.detector.stats()
    }

    pub fn timer_deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.scheduler.deadline(kind)
    }

    /// Earliest pending timer; a driver sleeps until then
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Listen to qualifying mutation batches
    pub fn subscribe(&mut self, listener: impl FnMut(&MutationBatch) + 'static) -> ListenerId {
        self.detector.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.detector.unsubscribe(id)
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serialize the live tree under the root
    pub fn serialize(&mut self) -> Result<Snapshot, EditorError> {
        let root = self.tree.root();
        Ok(self.serializer.serialize(&mut self.tree, root)?)
    }

    /// Run a host edit against the tree and observe it
    pub fn edit<R>(&mut self, now: Instant, f: impl FnOnce(&mut VisualTree) -> R) -> Result<R, EditorError> {
        self.advance(now)?;
        let result = f(&mut self.tree);
        self.observe(now);
        self.advance(now)?;
        Ok(result)
    }

    /// Hand journaled mutations to the detector
    pub fn observe(&mut self, now: Instant) {
        let batches = self.tree.take_mutations();
        if batches.is_empty() {
            return;
        }
        let deadline = self.detector.dispatch(batches, now);
        // listeners still hear about edits when sync is off
        if let Some(deadline) = deadline.filter(|_| self.bridge.is_some()) {
            self.scheduler.schedule(TimerKind::Debounce, deadline);
            self.transport.mark_dirty();
        }
    }

    /// Observe pending edits, then fire every timer due at `now`
    pub fn advance(&mut self, now: Instant) -> Result<(), EditorError> {
        self.observe(now);
        while let Some((kind, at)) = self.scheduler.pop_due(now) {
            self.fire(kind, at)?;
            self.observe(at);
        }
        Ok(())
    }

    fn fire(&mut self, kind: TimerKind, at: Instant) -> Result<(), EditorError> {
        debug!(timer = ?kind, "Timer fired");
        match kind {
            TimerKind::Debounce => {
                if self.detector.poll(at) {
                    self.sync_now(at)?;
                }
            }
            TimerKind::AckTimeout => {
                let actions = self.transport.ack_timeout(at);
                self.apply_sync(actions, at)?;
            }
            TimerKind::RetryBackoff => {
                let snapshot = self.serialize()?;
                let actions = self.transport.resend(snapshot, at);
                self.apply_sync(actions, at)?;
            }
            TimerKind::Watchdog => {
                let effects = self.drag.check_watchdog(at);
                self.apply_drag(effects, at)?;
            }
            TimerKind::Frame => {
                let effects = self.drag.on_frame(&self.tree, &self.filter, at);
                self.apply_drag(effects, at)?;
            }
        }
        Ok(())
    }

    /// Serialize and submit immediately, skipping any pending debounce
    pub fn sync_now(&mut self, now: Instant) -> Result<(), EditorError> {
        self.detector.cancel();
        self.scheduler.cancel(TimerKind::Debounce);
        if self.bridge.is_none() {
            debug!("Sync requested without a host bridge, ignoring");
            return Ok(());
        }
        let snapshot = self.serialize()?;
        let actions = self.transport.submit(snapshot, now);
        self.apply_sync(actions, now)
    }

    /// Host accepted the in-flight snapshot
    pub fn ack_success(&mut self, now: Instant) -> Result<(), EditorError> {
        self.advance(now)?;
        let actions = self.transport.ack_success(now);
        self.apply_sync(actions, now)?;
        self.advance(now)
    }

    /// Host rejected the in-flight snapshot
    pub fn ack_failure(&mut self, now: Instant) -> Result<(), EditorError> {
        self.advance(now)?;
        let actions = self.transport.ack_failure(now);
        self.apply_sync(actions, now)?;
        self.advance(now)
    }

    /// Manual retry, typically after a terminal failure
    ///
    /// A pending snapshot left in the store is restored first, bringing
    /// back the edits the failed cycle rolled away.
    pub fn retrigger_sync(&mut self, now: Instant) -> Result<(), EditorError> {
        self.advance(now)?;
        if self.bridge.is_none() {
            debug!("Retrigger without a host bridge, ignoring");
            return Ok(());
        }
        if !self.transport.is_busy() {
            if let Some(pending) = self.store.load_pending()? {
                let effects = self.drag.cancel(CancelReason::Rollback);
                self.apply_drag(effects, now)?;
                let root = self.tree.root();
                rebuild_into(&mut self.tree, root, &pending.snapshot)?;
                self.tree.discard_mutations();
                info!(nodes = pending.snapshot.node_count(), "Restored pending snapshot for retry");
            }
        }
        self.detector.cancel();
        self.scheduler.cancel(TimerKind::Debounce);
        let snapshot = self.serialize()?;
        let actions = self.transport.retrigger(snapshot, now);
        self.apply_sync(actions, now)?;
        self.advance(now)
    }

    fn apply_sync(&mut self, actions: Vec<SyncAction>, now: Instant) -> Result<(), EditorError> {
        for action in actions {
            match action {
                SyncAction::Submit(snapshot) => {
                    self.events.push(EditorEvent::SnapshotSubmitted {
                        attempt: self.transport.attempt(),
                        nodes: snapshot.node_count(),
                    });
                    if let Some(bridge) = self.bridge.as_mut() {
                        bridge.submit_snapshot(&snapshot);
                    }
                }
                SyncAction::ScheduleAckTimeout(at) => self.scheduler.schedule(TimerKind::AckTimeout, at),
                SyncAction::CancelAckTimeout => {
                    self.scheduler.cancel(TimerKind::AckTimeout);
                }
                SyncAction::ScheduleRetry(at) => self.scheduler.schedule(TimerKind::RetryBackoff, at),
                SyncAction::PersistPending(snapshot) => {
                    // persistence is best-effort; the cycle continues without it
                    if let Err(e) = self.store.save_pending(&PendingSnapshot::new(snapshot)) {
                        warn!(error = %e, "Failed to persist pending snapshot");
                    }
                }
                SyncAction::ClearPersisted => {
                    if let Err(e) = self.store.clear_pending() {
                        warn!(error = %e, "Failed to clear pending snapshot");
                    }
                }
                SyncAction::Rollback(snapshot) => self.rollback_to(&snapshot, now)?,
                SyncAction::StatusChanged(state) => {
                    self.events.push(EditorEvent::SyncStateChanged { state });
                    if let Some(bridge) = self.bridge.as_mut() {
                        bridge.sync_state_changed(state);
                    }
                }
                SyncAction::Failed(SyncError::Transient { attempt, reason }) => {
                    self.events.push(EditorEvent::SyncRetrying { attempt, reason });
                }
                SyncAction::Failed(error) => {
                    if let Some(bridge) = self.bridge.as_mut() {
                        bridge.sync_failed(&error);
                    }
                    self.events.push(EditorEvent::SyncFailed { error });
                }
                SyncAction::Resync => self.sync_now(now)?,
            }
        }
        Ok(())
    }

    /// Replace the live tree with a known-good snapshot
    fn rollback_to(&mut self, snapshot: &Snapshot, now: Instant) -> Result<(), EditorError> {
        let effects = self.drag.cancel(CancelReason::Rollback);
        self.apply_drag(effects, now)?;

        let root = self.tree.root();
        rollback(&mut self.tree, root, snapshot)?;
        self.detector.cancel();
        self.scheduler.cancel(TimerKind::Debounce);

        self.events.push(EditorEvent::RolledBack {
            nodes: snapshot.node_count(),
        });
        Ok(())
    }

    /// Pointer down on a drag source
    pub fn pointer_down(
        &mut self,
        source: DragSource,
        modifiers: Modifiers,
        point: Point,
        now: Instant,
    ) -> Result<(), EditorError> {
        self.advance(now)?;
        let effects = self
            .drag
            .begin(&self.tree, &self.filter, source, modifiers, point, now)?;
        self.apply_drag(effects, now)?;
        self.advance(now)
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) -> Result<(), EditorError> {
        self.advance(now)?;
        let effects = self.drag.pointer_move(point, now);
        self.apply_drag(effects, now)?;
        self.advance(now)
    }

    /// Pointer up; returns the committed drop, if any
    pub fn pointer_up(&mut self, point: Point, now: Instant) -> Result<Option<DropCommit>, EditorError> {
        self.advance(now)?;
        let effects = self.drag.release(&self.tree, &self.filter, point, now);
        let commit = self.apply_drag(effects, now)?;
        self.advance(now)?;
        Ok(commit)
    }

    pub fn cancel_drag(&mut self, now: Instant) -> Result<(), EditorError> {
        let effects = self.drag.cancel(CancelReason::User);
        self.apply_drag(effects, now)?;
        self.advance(now)
    }

    /// Host-initiated drop of a palette item at `point`
    ///
    /// Goes through the same session and zone pipeline as a pointer drag.
    /// Returns whether anything was committed.
    pub fn request_drop_at_point(
        &mut self,
        item: PaletteItem,
        point: Point,
        now: Instant,
    ) -> Result<bool, EditorError> {
        self.advance(now)?;
        let effects = match self
            .drag
            .drop_at(&self.tree, &self.filter, DragSource::Palette(item), point, now)
        {
            Ok(effects) => effects,
            Err(err) => {
                debug!(error = %err, "Synthetic drop refused");
                return Ok(false);
            }
        };
        let commit = self.apply_drag(effects, now)?;
        self.advance(now)?;
        Ok(commit.is_some())
    }

    /// Delete an element and tell the host
    pub fn remove_element(&mut self, key: NodeKey, now: Instant) -> Result<(), EditorError> {
        self.advance(now)?;
        if key == self.tree.root() {
            return Err(TreeError::RootImmovable.into());
        }
        let node = self.tree.get(key).ok_or(TreeError::NodeNotFound(key))?;
        if !self.filter.is_content(node) || !node.is_element() {
            return Err(TreeError::NotContent(key).into());
        }
        let parent = self.tree.parent(key).ok_or(TreeError::NodeNotFound(key))?;

        let element_id = self.tree.ensure_id(key, self.serializer.ids_mut())?;
        let parent_id = self.tree.ensure_id(parent, self.serializer.ids_mut())?;
        let index = content_index(&self.tree, &self.filter, key);
        self.tree.remove_node(key)?;

        info!(element = %element_id, parent = %parent_id, index, "Element removed");
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.notify_element_deleted(&element_id, &parent_id, index);
        }
        self.events.push(EditorEvent::ElementRemoved {
            element_id,
            parent_id,
            index,
        });
        self.observe(now);
        self.advance(now)
    }

    fn apply_drag(&mut self, effects: Vec<DragEffect>, now: Instant) -> Result<Option<DropCommit>, EditorError> {
        let mut committed = None;
        for effect in effects {
            match effect {
                DragEffect::ScheduleWatchdog(at) => self.scheduler.schedule(TimerKind::Watchdog, at),
                DragEffect::CancelWatchdog => {
                    self.scheduler.cancel(TimerKind::Watchdog);
                }
                DragEffect::ScheduleFrame(at) => self.scheduler.schedule(TimerKind::Frame, at),
                DragEffect::CancelFrame => {
                    self.scheduler.cancel(TimerKind::Frame);
                }
                DragEffect::Started { session_id, mode } => {
                    self.events.push(EditorEvent::DragStarted { session_id, mode });
                }
                DragEffect::ShowFeedback { zone, auto_apply } => {
                    self.feedback.show(&mut self.tree, &zone, auto_apply)?;
                    self.events.push(EditorEvent::DropZoneChanged {
                        zone: Some(zone.id),
                        score: zone.score,
                        auto_apply,
                    });
                }
                DragEffect::ClearFeedback => {
                    self.feedback.clear(&mut self.tree)?;
                    // still dragging means the selection was lost, not resolved
                    if self.drag.state() == DragState::Dragging {
                        self.events.push(EditorEvent::DropZoneChanged {
                            zone: None,
                            score: 0.0,
                            auto_apply: false,
                        });
                    }
                }
                DragEffect::Drop(request) => committed = self.execute_drop(request, now)?,
                DragEffect::Cancelled { session_id, reason } => {
                    self.events.push(EditorEvent::DragCancelled {
                        session_id,
                        reason: reason.to_string(),
                    });
                }
            }
        }
        self.observe(now);
        Ok(committed)
    }

    fn execute_drop(&mut self, request: DropRequest, now: Instant) -> Result<Option<DropCommit>, EditorError> {
        let payload = DropPayload::from(request.source);
        let result = execute(
            &mut self.tree,
            &self.filter,
            self.serializer.ids_mut(),
            &payload,
            &request.zone,
        );

        let committed = match result {
            Ok(commit) => {
                if let Some(bridge) = self.bridge.as_mut() {
                    match &commit {
                        DropCommit::Added {
                            element_id,
                            parent_id,
                            index,
                        } => bridge.notify_element_added(element_id, parent_id, *index),
                        DropCommit::Moved {
                            element_id,
                            parent_id,
                            index,
                        } => bridge.notify_element_moved(element_id, parent_id, *index),
                    }
                }
                self.events.push(EditorEvent::DropCommitted {
                    commit: commit.clone(),
                });
                Some(commit)
            }
            Err(err) => {
                debug!(session = request.session_id, error = %err, "Drop not applied");
                self.events.push(EditorEvent::DropRejected {
                    reason: err.to_string(),
                });
                None
            }
        };

        let effects = self.drag.finish();
        self.apply_drag(effects, now)?;
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_common::Rect;
    use easel_sync::RecordingBridge;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn canvas_with_bridge(t0: Instant) -> (Canvas, Rc<RefCell<RecordingBridge>>) {
        let bridge = Rc::new(RefCell::new(RecordingBridge::new()));
        let canvas = Canvas::builder(EditorConfig::default())
            .with_ids(IdGenerator::from_parts("el", "aaaaaa"))
            .with_bridge(bridge.clone())
            .build(t0)
            .unwrap();
        (canvas, bridge)
    }

    #[test]
    fn test_startup_sets_baseline() {
        let t0 = Instant::now();
        let (canvas, bridge) = canvas_with_bridge(t0);

        assert_eq!(canvas.sync_state(), SyncState::Synced);
        assert_eq!(canvas.last_synced().unwrap().node_count(), 1);
        assert!(bridge.borrow().submitted.is_empty());
        assert_eq!(canvas.next_deadline(), None);
    }

    #[test]
    fn test_edit_arms_debounce() {
        let t0 = Instant::now();
        let (mut canvas, _) = canvas_with_bridge(t0);

        canvas
            .edit(t0, |tree| {
                let root = tree.root();
                let p = tree.create_element("p");
                tree.append_child(root, p)
            })
            .unwrap()
            .unwrap();

        assert_eq!(canvas.timer_deadline(TimerKind::Debounce), Some(t0 + ms(150)));
    }

    #[test]
    fn test_geometry_updates_do_not_sync() {
        let t0 = Instant::now();
        let (mut canvas, bridge) = canvas_with_bridge(t0);

        let root = canvas.tree().root();
        canvas
            .tree_mut()
            .set_bounds(root, Rect::new(0.0, 0.0, 800.0, 600.0))
            .unwrap();
        canvas.advance(t0 + ms(500)).unwrap();

        assert!(bridge.borrow().submitted.is_empty());
        assert_eq!(canvas.detector_stats().observed, 0);
    }

    #[test]
    fn test_missing_bridge_disables_sync() {
        let t0 = Instant::now();
        let mut canvas = Canvas::builder(EditorConfig::default()).build(t0).unwrap();

        assert!(!canvas.is_sync_enabled());
        assert_eq!(canvas.take_events(), vec![EditorEvent::BridgeUnavailable]);

        canvas
            .edit(t0, |tree| {
                let root = tree.root();
                let p = tree.create_element("p");
                tree.append_child(root, p)
            })
            .unwrap()
            .unwrap();
        assert_eq!(canvas.next_deadline(), None);
        canvas.advance(t0 + ms(1000)).unwrap();

        assert_eq!(canvas.sync_state(), SyncState::Synced);
        assert!(canvas.take_events().is_empty());
    }

    #[test]
    fn test_remove_element_notifies_host() {
        let t0 = Instant::now();
        let (mut canvas, bridge) = canvas_with_bridge(t0);

        let (a, b) = canvas
            .edit(t0, |tree| {
                let root = tree.root();
                let a = tree.create_element("p");
                let b = tree.create_element("p");
                tree.append_child(root, a).unwrap();
                tree.append_child(root, b).unwrap();
                (a, b)
            })
            .unwrap();
        canvas.remove_element(b, t0 + ms(10)).unwrap();

        assert!(!canvas.tree().contains(b));
        assert!(canvas.tree().contains(a));
        let bridge = bridge.borrow();
        assert!(matches!(
            bridge.notifications.last(),
            Some(easel_sync::BridgeNotification::Deleted { index: 1, .. })
        ));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let t0 = Instant::now();
        let (mut canvas, _) = canvas_with_bridge(t0);
        let root = canvas.tree().root();

        assert!(matches!(
            canvas.remove_element(root, t0),
            Err(EditorError::Tree(TreeError::RootImmovable))
        ));
    }
}
