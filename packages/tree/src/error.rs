//! Error types for the visual tree

use crate::node::NodeKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node cannot have children: {0}")]
    NotAContainer(NodeKey),

    #[error("The canvas root cannot be moved or removed")]
    RootImmovable,

    #[error("Node is not an element: {0}")]
    NotAnElement(NodeKey),

    #[error("Node is not text: {0}")]
    NotText(NodeKey),

    #[error("Node is not content: {0}")]
    NotContent(NodeKey),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
