//! # Tree Serializer
//!
//! Converts a live subtree into a canonical [`Snapshot`].
//!
//! - Non-content nodes (skipped tags, marker-class bookkeeping nodes) are
//!   left out together with their subtrees.
//! - Elements without an identifier get one from the [`IdGenerator`], and
//!   it is written back to the live node. Re-serializing is a no-op for
//!   identity.
//! - Attributes and styles are copied as written; nothing is resolved or
//!   inherited.

use crate::content::ContentFilter;
use crate::id_generator::IdGenerator;
use crate::node::{NodeKey, NodeKind};
use crate::snapshot::{ElementSnapshot, Snapshot, TextSnapshot};
use crate::{TreeError, VisualTree};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializerConfig {
    /// Prefix of generated element ids
    pub id_prefix: String,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            id_prefix: "el".to_string(),
        }
    }
}

pub struct Serializer {
    filter: ContentFilter,
    ids: IdGenerator,
}

impl Serializer {
    pub fn new(filter: ContentFilter, ids: IdGenerator) -> Self {
        Self { filter, ids }
    }

    pub fn from_config(config: &SerializerConfig, filter: ContentFilter) -> Self {
        Self::new(filter, IdGenerator::new(config.id_prefix.clone()))
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    /// Shared with the drop executor so both assign from one counter
    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    /// Serialize the subtree rooted at `root`
    pub fn serialize(&mut self, tree: &mut VisualTree, root: NodeKey) -> Result<Snapshot, TreeError> {
        let before = self.ids.count();
        let snapshot = self
            .serialize_node(tree, root)?
            .ok_or(TreeError::NotContent(root))?;

        let assigned = self.ids.count() - before;
        debug!(nodes = snapshot.node_count(), assigned_ids = assigned, "Serialized canvas tree");
        Ok(snapshot)
    }

    fn serialize_node(
        &mut self,
        tree: &mut VisualTree,
        key: NodeKey,
    ) -> Result<Option<Snapshot>, TreeError> {
        let node = tree.get(key).ok_or(TreeError::NodeNotFound(key))?;
        if !self.filter.is_content(node) {
            return Ok(None);
        }

        let (tag, classes, attrs, styles) = match node.kind() {
            NodeKind::Text(text) => {
                return Ok(Some(Snapshot::Text(TextSnapshot { text: text.clone() })));
            }
            NodeKind::Element(element) => (
                element.tag.clone(),
                element.classes.clone(),
                element.attributes.clone(),
                element.styles.clone(),
            ),
        };
        let child_keys = node.children().to_vec();

        let id = tree.ensure_id(key, &mut self.ids)?;

        let mut children = Vec::with_capacity(child_keys.len());
        for child in child_keys {
            if let Some(snapshot) = self.serialize_node(tree, child)? {
                children.push(snapshot);
            }
        }

        Ok(Some(Snapshot::Element(ElementSnapshot {
            tag,
            id,
            classes,
            attrs,
            styles,
            children,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementData;

    fn serializer() -> Serializer {
        Serializer::new(ContentFilter::default(), IdGenerator::from_parts("el", "aaaaaa"))
    }

    #[test]
    fn test_assigns_and_writes_back_ids() {
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        let div = tree.create_element("div");
        tree.append_child(root, div).unwrap();

        let mut serializer = serializer();
        let snapshot = serializer.serialize(&mut tree, root).unwrap();

        let element = snapshot.as_element().unwrap();
        assert_eq!(element.id, "el-1-aaaaaa");
        assert_eq!(element.children[0].as_element().unwrap().id, "el-2-aaaaaa");
        assert_eq!(tree.get(div).unwrap().id(), Some("el-2-aaaaaa"));
    }

    #[test]
    fn test_skips_non_content_subtrees() {
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        let script = tree.create_element("script");
        let inner = tree.create_text("alert(1)");
        let ghost = tree.create_element_with(ElementData::new("div").with_class("easel-ghost"));
        let text = tree.create_text("visible");
        tree.append_child(root, script).unwrap();
        tree.append_child(script, inner).unwrap();
        tree.append_child(root, ghost).unwrap();
        tree.append_child(root, text).unwrap();

        let snapshot = serializer().serialize(&mut tree, root).unwrap();

        assert_eq!(snapshot.as_element().unwrap().children, vec![Snapshot::text("visible")]);
        assert_eq!(tree.get(ghost).unwrap().id(), None);
    }

    #[test]
    fn test_non_content_root_is_an_error() {
        let mut tree = VisualTree::with_root(ElementData::new("div").with_class("easel-ghost"));
        let root = tree.root();
        assert_eq!(
            serializer().serialize(&mut tree, root),
            Err(TreeError::NotContent(root))
        );
    }
}
