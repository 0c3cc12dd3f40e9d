//! Reconstruct live nodes from a [`Snapshot`].
//!
//! Every rebuilt node gets a fresh [`NodeKey`]; nothing from the previous
//! live subtree is reused.

use crate::node::{ElementData, NodeKey};
use crate::snapshot::{ElementSnapshot, Snapshot};
use crate::{TreeError, VisualTree};

fn element_data(snapshot: &ElementSnapshot) -> ElementData {
    ElementData {
        tag: snapshot.tag.clone(),
        id: (!snapshot.id.is_empty()).then(|| snapshot.id.clone()),
        classes: snapshot.classes.clone(),
        attributes: snapshot.attrs.clone(),
        styles: snapshot.styles.clone(),
    }
}

/// Build a detached subtree from a snapshot
pub fn build_subtree(tree: &mut VisualTree, snapshot: &Snapshot) -> Result<NodeKey, TreeError> {
    match snapshot {
        Snapshot::Text(text) => Ok(tree.create_text(text.text.clone())),
        Snapshot::Element(element) => {
            let key = tree.create_element_with(element_data(element));
            for child in &element.children {
                let child_key = build_subtree(tree, child)?;
                tree.append_child(key, child_key)?;
            }
            Ok(key)
        }
    }
}

/// Replace `root`'s payload and children with the snapshot's
///
/// The root keeps its key (it is the canvas mount point); everything below
/// it is freed and rebuilt. All mutations land in one batch.
pub fn rebuild_into(
    tree: &mut VisualTree,
    root: NodeKey,
    snapshot: &Snapshot,
) -> Result<(), TreeError> {
    let Snapshot::Element(element) = snapshot else {
        return Err(TreeError::InvalidSnapshot(
            "canvas root must be an element".to_string(),
        ));
    };

    tree.batch(|tree| {
        tree.clear_children(root)?;
        tree.reset_element(root, element_data(element))?;
        for child in &element.children {
            let child_key = build_subtree(tree, child)?;
            tree.append_child(root, child_key)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_replaces_subtree_with_fresh_keys() {
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        let stale = tree.create_element("aside");
        tree.append_child(root, stale).unwrap();

        let snapshot = Snapshot::element("main", "root-1")
            .with_class("canvas")
            .with_child(
                Snapshot::element("p", "p-1")
                    .with_attr("title", "greeting")
                    .with_child(Snapshot::text("Hi")),
            );

        rebuild_into(&mut tree, root, &snapshot).unwrap();

        assert!(!tree.contains(stale));
        let root_node = tree.get(root).unwrap();
        assert_eq!(root_node.id(), Some("root-1"));
        assert_eq!(root_node.classes(), &["canvas"]);

        let p = tree.children(root)[0];
        assert_ne!(p, stale);
        assert_eq!(tree.get(p).unwrap().id(), Some("p-1"));
        let text = tree.children(p)[0];
        assert_eq!(tree.get(text).unwrap().text(), Some("Hi"));
    }

    #[test]
    fn test_text_root_rejected() {
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        assert!(matches!(
            rebuild_into(&mut tree, root, &Snapshot::text("x")),
            Err(TreeError::InvalidSnapshot(_))
        ));
    }
}
