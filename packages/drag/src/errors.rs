//! Error types for drag sessions and drops

use easel_tree::TreeError;
use serde::Serialize;
use thiserror::Error;

/// Why a zone (or a drop onto it) is structurally invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidReason {
    /// Void elements and text nodes never take children
    NotAContainer,
    /// Target is the dragged node or one of its descendants
    Cycle,
    /// The canvas root itself cannot be dragged
    RootImmovable,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::NotAContainer => write!(f, "target cannot hold children"),
            InvalidReason::Cycle => write!(f, "target is inside the dragged element"),
            InvalidReason::RootImmovable => write!(f, "canvas root cannot be moved"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DragError {
    #[error("A drag session is already active")]
    SessionActive,

    #[error("Drag is disabled for this source")]
    Disabled,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DropError {
    /// Silent no-op for the user
    #[error("Invalid drop target: {0}")]
    InvalidDropTarget(InvalidReason),

    /// The zone points at nodes that no longer exist where it expects them
    #[error("Drop zone refers to a node that no longer exists")]
    StaleZoneReference,

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}
