//! Rollback to a known-good snapshot and startup recovery.

use crate::errors::RecoveryError;
use crate::store::{PendingSnapshot, SnapshotStore};
use easel_tree::{rebuild_into, NodeKey, Snapshot, TreeError, VisualTree};
use tracing::{info, warn};

/// Replace the live subtree under `root` with `snapshot`
///
/// The rebuild's own mutations are dropped from the journal so they are
/// never mistaken for user edits.
pub fn rollback(tree: &mut VisualTree, root: NodeKey, snapshot: &Snapshot) -> Result<(), TreeError> {
    rebuild_into(tree, root, snapshot)?;
    let discarded = tree.discard_mutations();
    warn!(
        nodes = snapshot.node_count(),
        discarded_batches = discarded,
        "Rolled back canvas to last known-good snapshot"
    );
    Ok(())
}

/// Restore a pending snapshot left behind by a previous session
///
/// Returns the restored snapshot, or `None` when the store was empty. The
/// caller is expected to attempt one sync afterwards.
pub fn recover(
    tree: &mut VisualTree,
    root: NodeKey,
    store: &mut dyn SnapshotStore,
) -> Result<Option<PendingSnapshot>, RecoveryError> {
    let Some(pending) = store.load_pending()? else {
        return Ok(None);
    };

    rebuild_into(tree, root, &pending.snapshot)?;
    tree.discard_mutations();
    info!(
        saved_at = %pending.saved_at,
        nodes = pending.snapshot.node_count(),
        "Recovered pending snapshot"
    );
    Ok(Some(pending))
}
