//! Error types for synchronization

use easel_tree::TreeError;
use serde::Serialize;
use thiserror::Error;

/// Why a single submission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// Host answered with a failure acknowledgment
    Rejected,
    /// No acknowledgment before the timeout
    Timeout,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Rejected => write!(f, "rejected by host"),
            FailureReason::Timeout => write!(f, "acknowledgment timed out"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SyncError {
    /// Retried with backoff; invisible to the user until retries run out
    #[error("Sync attempt {attempt} failed ({reason}), retrying")]
    Transient { attempt: u32, reason: FailureReason },

    /// Retries exhausted; the canvas rolls back to the last good snapshot
    #[error("Sync failed after {attempts} attempts ({reason})")]
    Terminal { attempts: u32, reason: FailureReason },

    /// No host bridge; edits stay local and are never persisted
    #[error("Host bridge unavailable: synchronization disabled")]
    BridgeUnavailable,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed pending snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}
