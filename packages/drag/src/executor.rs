//! # Drop Executor
//!
//! Commits a drop to the live tree. The zone is re-validated against the
//! tree as it is now, since it was computed up to a frame earlier:
//!
//! - target and anchor must still exist, with the anchor still a child of
//!   the target (else [`DropError::StaleZoneReference`])
//! - the target must accept children and must not lie inside the moved node
//!
//! The detach and insert (or create and insert) run inside one tree batch,
//! so observers get a single notification. A failed drop changes nothing.

use crate::classifier::{DragSource, PaletteItem};
use crate::errors::{DropError, InvalidReason};
use crate::zones::{validate_target, DropZone};
use easel_tree::{ContentFilter, IdGenerator, NodeKey, VisualTree};
use serde::Serialize;
use tracing::{debug, info};

/// What gets dropped
#[derive(Debug, Clone, PartialEq)]
pub enum DropPayload {
    Move(NodeKey),
    Create(PaletteItem),
}

impl From<DragSource> for DropPayload {
    fn from(source: DragSource) -> Self {
        match source {
            DragSource::Element(key) => DropPayload::Move(key),
            DragSource::Palette(item) => DropPayload::Create(item),
        }
    }
}

/// A committed drop, as reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropCommit {
    #[serde(rename_all = "camelCase")]
    Added {
        element_id: String,
        parent_id: String,
        index: usize,
    },
    #[serde(rename_all = "camelCase")]
    Moved {
        element_id: String,
        parent_id: String,
        index: usize,
    },
}

impl DropCommit {
    pub fn element_id(&self) -> &str {
        match self {
            DropCommit::Added { element_id, .. } | DropCommit::Moved { element_id, .. } => element_id,
        }
    }
}

pub fn execute(
    tree: &mut VisualTree,
    filter: &ContentFilter,
    ids: &mut IdGenerator,
    payload: &DropPayload,
    zone: &DropZone,
) -> Result<DropCommit, DropError> {
    if let Some(reason) = zone.invalid_reason {
        debug!(zone = %zone.id, %reason, "Rejected drop onto invalid zone");
        return Err(DropError::InvalidDropTarget(reason));
    }

    let target = zone.target;
    if !tree.contains(target) || !tree.is_attached(target) {
        return Err(DropError::StaleZoneReference);
    }
    if let Some(reference) = zone.reference {
        if tree.parent(reference) != Some(target) {
            return Err(DropError::StaleZoneReference);
        }
    }

    let moved = match payload {
        DropPayload::Move(node) => {
            if !tree.contains(*node) {
                return Err(DropError::StaleZoneReference);
            }
            if *node == tree.root() {
                return Err(DropError::InvalidDropTarget(InvalidReason::RootImmovable));
            }
            Some(*node)
        }
        DropPayload::Create(_) => None,
    };
    if let Some(reason) = validate_target(tree, target, moved) {
        debug!(zone = %zone.id, %reason, "Rejected drop");
        return Err(DropError::InvalidDropTarget(reason));
    }

    let index = insertion_index(tree, target, zone.reference, moved);

    let node = tree.batch(|tree| -> Result<NodeKey, DropError> {
        let node = match payload {
            DropPayload::Move(node) => *node,
            DropPayload::Create(item) => {
                let node = tree.create_element_with(item.element_data());
                if let Some(text) = &item.text {
                    let text = tree.create_text(text.clone());
                    tree.append_child(node, text)?;
                }
                node
            }
        };
        tree.insert_child(target, index, node)?;
        Ok(node)
    })?;

    let element_id = tree.ensure_id(node, ids)?;
    let parent_id = tree.ensure_id(target, ids)?;
    let index = content_index(tree, filter, node);

    let commit = match payload {
        DropPayload::Move(_) => DropCommit::Moved {
            element_id,
            parent_id,
            index,
        },
        DropPayload::Create(_) => DropCommit::Added {
            element_id,
            parent_id,
            index,
        },
    };
    info!(zone = %zone.id, ?commit, "Drop committed");
    Ok(commit)
}

/// Index in `target`'s child list once `moved` has been detached
fn insertion_index(
    tree: &VisualTree,
    target: NodeKey,
    reference: Option<NodeKey>,
    moved: Option<NodeKey>,
) -> usize {
    let siblings: Vec<NodeKey> = tree
        .children(target)
        .iter()
        .copied()
        .filter(|k| Some(*k) != moved)
        .collect();

    match reference {
        // dropping right before itself keeps the node where it is
        Some(r) if Some(r) == moved => tree.index_in_parent(r).unwrap_or(siblings.len()),
        Some(r) => siblings.iter().position(|k| *k == r).unwrap_or(siblings.len()),
        None => siblings.len(),
    }
}

/// Position among the parent's content children, as the host model counts
pub fn content_index(tree: &VisualTree, filter: &ContentFilter, node: NodeKey) -> usize {
    let Some(parent) = tree.parent(node) else {
        return 0;
    };
    tree.children(parent)
        .iter()
        .take_while(|k| **k != node)
        .filter(|k| tree.get(**k).is_some_and(|n| filter.is_content(n)))
        .count()
}
