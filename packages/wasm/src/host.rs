//! JavaScript host object.
//!
//! The host is a plain JS object; every method is optional:
//!
//! ```javascript
//! const host = {
//!   submitSnapshot(json) {},
//!   notifyElementAdded(elementId, parentId, index) {},
//!   notifyElementMoved(elementId, parentId, index) {},
//!   notifyElementDeleted(elementId, parentId, index) {},
//!   syncStateChanged(state) {},
//!   syncFailed(message) {},
//!   // pending snapshot slot, e.g. backed by localStorage
//!   loadPending() { return localStorage.getItem("easel") },
//!   savePending(json) { localStorage.setItem("easel", json) },
//!   clearPending() { localStorage.removeItem("easel") },
//! };
//! ```

use easel_sync::{HostBridge, PendingSnapshot, SnapshotStore, StoreError, SyncError, SyncState};
use easel_tree::Snapshot;
use js_sys::{Array, Function, Reflect};
use tracing::{error, warn};
use wasm_bindgen::{JsCast, JsValue};

#[derive(Clone)]
pub struct JsHost {
    host: JsValue,
}

impl JsHost {
    pub fn new(host: JsValue) -> Self {
        Self { host }
    }

    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.host, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    /// Call `name` if the host defines it; a throwing callback is logged
    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let method = self.method(name)?;
        let args: Array = args.iter().collect();
        match method.apply(&self.host, &args) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(method = name, error = ?err, "Host callback threw");
                None
            }
        }
    }

    /// Whether the host keeps the pending snapshot itself
    pub fn has_store(&self) -> bool {
        self.method("loadPending").is_some()
    }

    fn notify(&self, name: &str, element_id: &str, parent_id: &str, index: usize) {
        self.call(
            name,
            &[
                JsValue::from_str(element_id),
                JsValue::from_str(parent_id),
                JsValue::from_f64(index as f64),
            ],
        );
    }
}

impl HostBridge for JsHost {
    fn submit_snapshot(&mut self, snapshot: &Snapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                self.call("submitSnapshot", &[JsValue::from_str(&json)]);
            }
            Err(err) => error!(error = %err, "Cannot encode snapshot for the host"),
        }
    }

    fn notify_element_added(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.notify("notifyElementAdded", element_id, parent_id, index);
    }

    fn notify_element_moved(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.notify("notifyElementMoved", element_id, parent_id, index);
    }

    fn notify_element_deleted(&mut self, element_id: &str, parent_id: &str, index: usize) {
        self.notify("notifyElementDeleted", element_id, parent_id, index);
    }

    fn sync_state_changed(&mut self, state: SyncState) {
        self.call("syncStateChanged", &[JsValue::from_str(&state.to_string())]);
    }

    fn sync_failed(&mut self, error: &SyncError) {
        self.call("syncFailed", &[JsValue::from_str(&error.to_string())]);
    }
}

impl SnapshotStore for JsHost {
    fn load_pending(&mut self) -> Result<Option<PendingSnapshot>, StoreError> {
        let Some(json) = self.call("loadPending", &[]).and_then(|v| v.as_string()) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save_pending(&mut self, pending: &PendingSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(pending)?;
        self.call("savePending", &[JsValue::from_str(&json)]);
        Ok(())
    }

    fn clear_pending(&mut self) -> Result<(), StoreError> {
        self.call("clearPending", &[]);
        Ok(())
    }
}
