//! Interface to the host application that owns the element-tree model.

use crate::errors::SyncError;
use crate::transport::SyncState;
use easel_tree::Snapshot;
use std::cell::RefCell;
use std::rc::Rc;

/// Host-side collaborator of the canvas
///
/// `submit_snapshot` is fire-and-forget: the host answers later through
/// the canvas acknowledgment entry points.
pub trait HostBridge {
    fn submit_snapshot(&mut self, snapshot: &Snapshot);

    fn notify_element_added(&mut self, element_id: &str, parent_id: &str, index: usize);

    fn notify_element_moved(&mut self, element_id: &str, parent_id: &str, index: usize);

    fn notify_element_deleted(&mut self, element_id: &str, parent_id: &str, index: usize);

    fn sync_state_changed(&mut self, _state: SyncState) {}

    fn sync_failed(&mut self, _error: &SyncError) {}
}

/// Shared bridge, so the caller can keep inspecting it after handing it over
impl<B: HostBridge> HostBridge for Rc<RefCell<B>> {
    fn submit_snapshot(&mut self, snapshot: &Snapshot) {
        self.borrow_mut().submit_snapshot(snapshot);
    }

    fn notify_element_added(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.borrow_mut().notify_element_added(element_id, parent_id, index);
    }

    fn notify_element_moved(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.borrow_mut().notify_element_moved(element_id, parent_id, index);
    }

    fn notify_element_deleted(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.borrow_mut().notify_element_deleted(element_id, parent_id, index);
    }

    fn sync_state_changed(&mut self, state: SyncState) {
        self.borrow_mut().sync_state_changed(state);
    }

    fn sync_failed(&mut self, error: &SyncError) {
        self.borrow_mut().sync_failed(error);
    }
}

/// Bridge that records every call, for tests and scripted replays
#[derive(Debug, Default, Clone)]
pub struct RecordingBridge {
    pub submitted: Vec<Snapshot>,
    pub notifications: Vec<BridgeNotification>,
    pub states: Vec<SyncState>,
    pub failures: Vec<SyncError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeNotification {
    Added { element_id: String, parent_id: String, index: usize },
    Moved { element_id: String, parent_id: String, index: usize },
    Deleted { element_id: String, parent_id: String, index: usize },
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_submitted(&self) -> Option<&Snapshot> {
        self.submitted.last()
    }
}

impl HostBridge for RecordingBridge {
    fn submit_snapshot(&mut self, snapshot: &Snapshot) {
        self.submitted.push(snapshot.clone());
    }

    fn notify_element_added(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.notifications.push(BridgeNotification::Added {
            element_id: element_id.to_string(),
            parent_id: parent_id.to_string(),
            index,
        });
    }

    fn notify_element_moved(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.notifications.push(BridgeNotification::Moved {
            element_id: element_id.to_string(),
            parent_id: parent_id.to_string(),
            index,
        });
    }

    fn notify_element_deleted(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.notifications.push(BridgeNotification::Deleted {
            element_id: element_id.to_string(),
            parent_id: parent_id.to_string(),
            index,
        });
    }

    fn sync_state_changed(&mut self, state: SyncState) {
        self.states.push(state);
    }

    fn sync_failed(&mut self, error: &SyncError) {
        self.failures.push(error.clone());
    }
}
