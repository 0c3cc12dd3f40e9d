//! Error types for the editor

use crate::config::ConfigError;
use easel_drag::{DragError, DropError};
use easel_sync::{RecoveryError, StoreError, SyncError};
use easel_tree::TreeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Drag error: {0}")]
    Drag(#[from] DragError),

    #[error("Drop error: {0}")]
    Drop(#[from] DropError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}
