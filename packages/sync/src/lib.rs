//! # Easel Sync
//!
//! Keeps the host's element-tree model in step with the live canvas.
//!
//! ```text
//! journal ──▶ ChangeDetector ──debounce──▶ Serializer ──▶ SyncTransport ──▶ HostBridge
//!                                                             │
//!                                   terminal failure ◀────────┘──▶ rollback
//! ```
//!
//! Everything here is clock-free: callers pass `now` and schedule the
//! returned deadlines themselves.

mod backoff;
mod bridge;
mod config;
mod detector;
mod errors;
mod rollback;
mod store;
mod transport;

pub use backoff::{next_delay, RetryPolicy};
pub use bridge::{BridgeNotification, HostBridge, RecordingBridge};
pub use config::SyncConfig;
pub use detector::{ChangeDetector, DetectorStats, ListenerId};
pub use errors::{FailureReason, RecoveryError, StoreError, SyncError};
pub use rollback::{recover, rollback};
pub use store::{FileStore, MemoryStore, PendingSnapshot, SnapshotStore};
pub use transport::{SyncAction, SyncState, SyncTransport};
