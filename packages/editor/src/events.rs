//! Observable canvas events.
//!
//! The canvas queues these as it works; drivers drain them with
//! [`Canvas::take_events`](crate::Canvas::take_events) and forward them to
//! whatever UI or log consumes them.

use easel_drag::{DragMode, DropCommit};
use easel_sync::{FailureReason, SyncError, SyncState};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EditorEvent {
    #[serde(rename_all = "camelCase")]
    SnapshotSubmitted { attempt: u32, nodes: usize },

    SyncStateChanged { state: SyncState },

    #[serde(rename_all = "camelCase")]
    SyncRetrying { attempt: u32, reason: FailureReason },

    SyncFailed { error: SyncError },

    RolledBack { nodes: usize },

    Recovered { nodes: usize },

    BridgeUnavailable,

    #[serde(rename_all = "camelCase")]
    DragStarted { session_id: u64, mode: DragMode },

    /// Selected zone changed; `zone` is `None` when nothing qualifies
    #[serde(rename_all = "camelCase")]
    DropZoneChanged {
        zone: Option<String>,
        score: f64,
        auto_apply: bool,
    },

    DropCommitted { commit: DropCommit },

    DropRejected { reason: String },

    #[serde(rename_all = "camelCase")]
    DragCancelled { session_id: u64, reason: String },

    #[serde(rename_all = "camelCase")]
    ElementRemoved {
        element_id: String,
        parent_id: String,
        index: usize,
    },
}

impl std::fmt::Display for EditorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorEvent::SnapshotSubmitted { attempt, nodes } => {
                write!(f, "submitted snapshot ({} nodes, attempt {})", nodes, attempt)
            }
            EditorEvent::SyncStateChanged { state } => write!(f, "sync state: {}", state),
            EditorEvent::SyncRetrying { attempt, reason } => {
                write!(f, "attempt {} failed ({}), retrying", attempt, reason)
            }
            EditorEvent::SyncFailed { error } => write!(f, "{}", error),
            EditorEvent::RolledBack { nodes } => write!(f, "rolled back ({} nodes)", nodes),
            EditorEvent::Recovered { nodes } => write!(f, "recovered pending snapshot ({} nodes)", nodes),
            EditorEvent::BridgeUnavailable => write!(f, "host bridge unavailable, sync disabled"),
            EditorEvent::DragStarted { session_id, mode } => {
                write!(f, "drag #{} started ({})", session_id, mode)
            }
            EditorEvent::DropZoneChanged { zone: Some(zone), score, auto_apply } => {
                write!(f, "zone {} ({:.2}{})", zone, score, if *auto_apply { ", auto" } else { "" })
            }
            EditorEvent::DropZoneChanged { zone: None, .. } => write!(f, "no drop target"),
            EditorEvent::DropCommitted { commit } => match commit {
                DropCommit::Added { element_id, parent_id, index } => {
                    write!(f, "added {} to {} at {}", element_id, parent_id, index)
                }
                DropCommit::Moved { element_id, parent_id, index } => {
                    write!(f, "moved {} to {} at {}", element_id, parent_id, index)
                }
            },
            EditorEvent::DropRejected { reason } => write!(f, "drop rejected: {}", reason),
            EditorEvent::DragCancelled { session_id, reason } => {
                write!(f, "drag #{} cancelled: {}", session_id, reason)
            }
            EditorEvent::ElementRemoved { element_id, parent_id, index } => {
                write!(f, "removed {} from {} at {}", element_id, parent_id, index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = EditorEvent::DragStarted {
            session_id: 3,
            mode: DragMode::Positioning,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "dragStarted");
        assert_eq!(json["sessionId"], 3);
        assert_eq!(json["mode"], "positioning");
    }

    #[test]
    fn test_commit_event_json() {
        let event = EditorEvent::DropCommitted {
            commit: DropCommit::Moved {
                element_id: "el-1".to_string(),
                parent_id: "el-2".to_string(),
                index: 0,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["commit"]["kind"], "moved");
        assert_eq!(json["commit"]["elementId"], "el-1");
        assert_eq!(event.to_string(), "moved el-1 to el-2 at 0");
    }
}
