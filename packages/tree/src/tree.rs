//! # Live Visual Tree
//!
//! Arena-backed tree of [`VisualNode`]s rooted at the canvas root.
//!
//! Every content mutation appends a [`MutationRecord`] to an internal
//! journal, grouped into [`MutationBatch`]es. Mutations performed inside
//! [`VisualTree::batch`] land in one batch, so an observer sees a
//! remove-then-insert move as a single notification.
//!
//! Geometry updates (`set_bounds`, `set_visible`) and identity write-back
//! (`ensure_id`) are bookkeeping, not content, and are never journaled.

use crate::id_generator::IdGenerator;
use crate::node::{ElementData, NodeKey, NodeKind, VisualNode};
use crate::TreeError;
use easel_common::Rect;
use std::collections::HashMap;

/// What changed in a single mutation
#[derive(Debug, Clone, PartialEq)]
pub enum MutationKind {
    /// Children were added to and/or removed from the target
    ChildList,

    /// An attribute changed (`class` and `id` included)
    Attribute {
        name: String,
        old_value: Option<String>,
    },

    /// An inline style property changed
    Style {
        property: String,
        old_value: Option<String>,
    },

    /// Text content of a text node changed
    Text { old_value: String },
}

/// A node as it looked when the mutation happened
///
/// Classes are captured eagerly because removed nodes may no longer exist
/// by the time the record is observed.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTrace {
    pub key: NodeKey,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeTrace,

    /// Whether the target was attached under the canvas root
    pub attached: bool,

    pub added: Vec<NodeTrace>,
    pub removed: Vec<NodeTrace>,
}

/// Records delivered to observers as one notification
#[derive(Debug, Clone, PartialEq)]
pub struct MutationBatch {
    pub seq: u64,
    pub records: Vec<MutationRecord>,
}

/// The live, directly editable visual tree
#[derive(Debug)]
pub struct VisualTree {
    nodes: HashMap<NodeKey, VisualNode>,
    root: NodeKey,
    next_key: u64,

    journal: Vec<MutationBatch>,
    open_batch: Option<Vec<MutationRecord>>,
    batch_depth: usize,
    next_batch_seq: u64,
}

impl VisualTree {
    /// Create a tree whose root is a bare element with the given tag
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self::with_root(ElementData::new(root_tag))
    }

    pub fn with_root(root: ElementData) -> Self {
        let key = NodeKey(0);
        let mut nodes = HashMap::new();
        nodes.insert(key, VisualNode::new(key, NodeKind::Element(root)));

        Self {
            nodes,
            root: key,
            next_key: 1,
            journal: Vec::new(),
            open_batch: None,
            batch_depth: 0,
            next_batch_seq: 0,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn get(&self, key: NodeKey) -> Option<&VisualNode> {
        self.nodes.get(&key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, key: NodeKey) -> Result<&VisualNode, TreeError> {
        self.nodes.get(&key).ok_or(TreeError::NodeNotFound(key))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut VisualNode, TreeError> {
        self.nodes.get_mut(&key).ok_or(TreeError::NodeNotFound(key))
    }

    fn element_mut(&mut self, key: NodeKey) -> Result<&mut ElementData, TreeError> {
        self.node_mut(key)?
            .element_mut()
            .ok_or(TreeError::NotAnElement(key))
    }

    // ---------------------------------------------------------------------
    // Structure queries
    // ---------------------------------------------------------------------

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|c| *c == key)
    }

    /// Whether `node` is reachable from the canvas root
    pub fn is_attached(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == self.root {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Strict ancestry: a node is not its own ancestor
    pub fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.parent(node);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// All descendants of `key` in pre-order, excluding `key` itself
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        out
    }

    /// Find an attached element by its identifier
    pub fn find_by_id(&self, id: &str) -> Option<NodeKey> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|k| self.nodes.get(k).and_then(|n| n.id()) == Some(id))
    }

    // ---------------------------------------------------------------------
    // Journal
    // ---------------------------------------------------------------------

    /// Group every mutation performed by `f` into one batch
    ///
    /// Nested calls join the outermost batch.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        if self.batch_depth == 1 {
            self.open_batch = Some(Vec::new());
        }

        let result = f(self);

        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            if let Some(records) = self.open_batch.take() {
                if !records.is_empty() {
                    self.push_batch(records);
                }
            }
        }

        result
    }

    /// Drain pending mutation batches in occurrence order
    pub fn take_mutations(&mut self) -> Vec<MutationBatch> {
        std::mem::take(&mut self.journal)
    }

    /// Drop pending batches without delivering them
    pub fn discard_mutations(&mut self) -> usize {
        let count = self.journal.len();
        self.journal.clear();
        count
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.journal.is_empty()
    }

    fn push_batch(&mut self, records: Vec<MutationRecord>) {
        let seq = self.next_batch_seq;
        self.next_batch_seq += 1;
        self.journal.push(MutationBatch { seq, records });
    }

    fn record(&mut self, record: MutationRecord) {
        match &mut self.open_batch {
            Some(records) => records.push(record),
            None => self.push_batch(vec![record]),
        }
    }

    fn trace(&self, key: NodeKey) -> NodeTrace {
        NodeTrace {
            key,
            classes: self
                .nodes
                .get(&key)
                .map(|n| n.classes().to_vec())
                .unwrap_or_default(),
        }
    }

    fn record_change(&mut self, target: NodeKey, kind: MutationKind) {
        let record = MutationRecord {
            kind,
            target: self.trace(target),
            attached: self.is_attached(target),
            added: Vec::new(),
            removed: Vec::new(),
        };
        self.record(record);
    }

    // ---------------------------------------------------------------------
    // Creation and structure mutations
    // ---------------------------------------------------------------------

    fn allocate(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(key, VisualNode::new(key, kind));
        key
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeKey {
        self.allocate(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_element_with(&mut self, data: ElementData) -> NodeKey {
        self.allocate(NodeKind::Element(data))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.allocate(NodeKind::Text(text.into()))
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` under `parent` at `index` (clamped)
    ///
    /// An attached child is moved: its detach and insert land in the same
    /// batch. `index` refers to the parent's child list after the detach.
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<(), TreeError> {
        let parent_node = self.node(parent)?;
        if !parent_node.accepts_children() {
            return Err(TreeError::NotAContainer(parent));
        }
        self.node(child)?;
        if child == self.root {
            return Err(TreeError::RootImmovable);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::CycleDetected);
        }

        self.batch(|tree| {
            if tree.parent(child).is_some() {
                tree.detach(child)?;
            }

            let parent_node = tree.node_mut(parent)?;
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, child);
            tree.node_mut(child)?.parent = Some(parent);

            let added = vec![tree.trace(child)];
            let record = MutationRecord {
                kind: MutationKind::ChildList,
                target: tree.trace(parent),
                attached: tree.is_attached(parent),
                added,
                removed: Vec::new(),
            };
            tree.record(record);
            Ok(())
        })
    }

    /// Detach a node from its parent, keeping it (and its subtree) alive
    pub fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root {
            return Err(TreeError::RootImmovable);
        }
        let Some(parent) = self.node(key)?.parent else {
            return Ok(());
        };

        let attached = self.is_attached(parent);
        let removed = vec![self.trace(key)];

        self.node_mut(parent)?.children.retain(|c| *c != key);
        self.node_mut(key)?.parent = None;

        let record = MutationRecord {
            kind: MutationKind::ChildList,
            target: self.trace(parent),
            attached,
            added: Vec::new(),
            removed,
        };
        self.record(record);
        Ok(())
    }

    /// Detach a node and free it together with its subtree
    pub fn remove_node(&mut self, key: NodeKey) -> Result<(), TreeError> {
        self.detach(key)?;
        let mut doomed = self.descendants(key);
        doomed.push(key);
        for k in doomed {
            self.nodes.remove(&k);
        }
        Ok(())
    }

    /// Free every child of `parent`
    pub fn clear_children(&mut self, parent: NodeKey) -> Result<(), TreeError> {
        let children = self.node(parent)?.children.clone();
        self.batch(|tree| {
            for child in children {
                tree.remove_node(child)?;
            }
            Ok(())
        })
    }

    // ---------------------------------------------------------------------
    // Content mutations
    // ---------------------------------------------------------------------

    /// Set an attribute. `id` and `class` update the node's identity and
    /// class list; `style` is rejected in favor of [`Self::set_style`].
    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        let value = value.into();
        if name == "style" {
            return self.batch(|tree| {
                for (property, v) in parse_style_attribute(&value) {
                    tree.set_style(key, &property, v)?;
                }
                Ok(())
            });
        }

        let element = self.element_mut(key)?;
        let old_value = match name {
            "id" => element.id.replace(value),
            "class" => {
                let old = element.classes.join(" ");
                element.classes = split_classes(&value);
                Some(old)
            }
            _ => element.attributes.insert(name.to_string(), value),
        };

        self.record_change(
            key,
            MutationKind::Attribute {
                name: name.to_string(),
                old_value,
            },
        );
        Ok(())
    }

    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<(), TreeError> {
        let element = self.element_mut(key)?;
        let old_value = match name {
            "id" => element.id.take(),
            "class" => {
                let old = element.classes.join(" ");
                element.classes.clear();
                Some(old)
            }
            _ => element.attributes.remove(name),
        };

        if old_value.is_some() {
            self.record_change(
                key,
                MutationKind::Attribute {
                    name: name.to_string(),
                    old_value,
                },
            );
        }
        Ok(())
    }

    pub fn add_class(&mut self, key: NodeKey, class: &str) -> Result<(), TreeError> {
        let element = self.element_mut(key)?;
        if element.has_class(class) {
            return Ok(());
        }
        let old = element.classes.join(" ");
        element.classes.push(class.to_string());

        self.record_change(
            key,
            MutationKind::Attribute {
                name: "class".to_string(),
                old_value: Some(old),
            },
        );
        Ok(())
    }

    pub fn remove_class(&mut self, key: NodeKey, class: &str) -> Result<(), TreeError> {
        let element = self.element_mut(key)?;
        if !element.has_class(class) {
            return Ok(());
        }
        let old = element.classes.join(" ");
        element.classes.retain(|c| c != class);

        self.record_change(
            key,
            MutationKind::Attribute {
                name: "class".to_string(),
                old_value: Some(old),
            },
        );
        Ok(())
    }

    pub fn set_style(
        &mut self,
        key: NodeKey,
        property: &str,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        let old_value = self
            .element_mut(key)?
            .styles
            .insert(property.to_string(), value.into());

        self.record_change(
            key,
            MutationKind::Style {
                property: property.to_string(),
                old_value,
            },
        );
        Ok(())
    }

    pub fn remove_style(&mut self, key: NodeKey, property: &str) -> Result<(), TreeError> {
        let old_value = self.element_mut(key)?.styles.remove(property);
        if old_value.is_some() {
            self.record_change(
                key,
                MutationKind::Style {
                    property: property.to_string(),
                    old_value,
                },
            );
        }
        Ok(())
    }

    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> Result<(), TreeError> {
        let node = self.node_mut(key)?;
        let NodeKind::Text(current) = &mut node.kind else {
            return Err(TreeError::NotText(key));
        };
        let old_value = std::mem::replace(current, text.into());

        self.record_change(key, MutationKind::Text { old_value });
        Ok(())
    }

    /// Make `key` read as `text`
    ///
    /// A text node is updated in place, as is an element whose only child is
    /// a text node. Any other element has its children replaced by one text
    /// node, in a single batch.
    pub fn set_text_content(&mut self, key: NodeKey, text: impl Into<String>) -> Result<(), TreeError> {
        let node = self.node(key)?;
        if node.text().is_some() {
            return self.set_text(key, text);
        }
        if !node.is_element() {
            return Err(TreeError::NotText(key));
        }
        if let [only] = node.children() {
            let only = *only;
            if self.node(only)?.text().is_some() {
                return self.set_text(only, text);
            }
        }
        let text = text.into();
        self.batch(|tree| {
            tree.clear_children(key)?;
            let child = tree.create_text(text);
            tree.append_child(key, child)
        })
    }

    /// Replace an element's payload wholesale (used when rebuilding the root)
    pub fn reset_element(&mut self, key: NodeKey, data: ElementData) -> Result<(), TreeError> {
        let element = self.element_mut(key)?;
        let old_value = Some(element.classes.join(" "));
        *element = data;

        self.record_change(
            key,
            MutationKind::Attribute {
                name: "class".to_string(),
                old_value,
            },
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Bookkeeping (not journaled)
    // ---------------------------------------------------------------------

    /// Return the element's identifier, assigning one if it has none
    ///
    /// Idempotent: an element that already has an id keeps it and the
    /// generator is not advanced.
    pub fn ensure_id(&mut self, key: NodeKey, ids: &mut IdGenerator) -> Result<String, TreeError> {
        let element = self.element_mut(key)?;
        match &element.id {
            Some(id) if !id.is_empty() => Ok(id.clone()),
            _ => {
                let id = ids.next_id();
                element.id = Some(id.clone());
                Ok(id)
            }
        }
    }

    pub fn set_bounds(&mut self, key: NodeKey, bounds: Rect) -> Result<(), TreeError> {
        self.node_mut(key)?.bounds = bounds;
        Ok(())
    }

    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<(), TreeError> {
        self.node_mut(key)?.visible = visible;
        Ok(())
    }
}

fn split_classes(value: &str) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for class in value.split_whitespace() {
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }
    classes
}

fn parse_style_attribute(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|decl| {
            let (property, v) = decl.split_once(':')?;
            let property = property.trim();
            if property.is_empty() {
                return None;
            }
            Some((property.to_string(), v.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (VisualTree, NodeKey, NodeKey, NodeKey) {
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        let section = tree.create_element("section");
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        tree.append_child(root, section).unwrap();
        tree.append_child(section, a).unwrap();
        tree.append_child(section, b).unwrap();
        tree.discard_mutations();
        (tree, section, a, b)
    }

    #[test]
    fn test_insert_records_child_list() {
        let (mut tree, section, _, _) = sample();
        let c = tree.create_element("p");
        tree.insert_child(section, 0, c).unwrap();

        let batches = tree.take_mutations();
        assert_eq!(batches.len(), 1);
        let record = &batches[0].records[0];
        assert_eq!(record.kind, MutationKind::ChildList);
        assert_eq!(record.target.key, section);
        assert_eq!(record.added[0].key, c);
        assert!(record.attached);
        assert_eq!(tree.children(section)[0], c);
    }

    #[test]
    fn test_move_is_single_batch() {
        let (mut tree, section, a, b) = sample();
        tree.insert_child(section, 1, a).unwrap();

        let batches = tree.take_mutations();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].records.len(), 2);
        assert_eq!(tree.children(section), &[b, a]);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, section, a, _) = sample();
        assert_eq!(tree.insert_child(a, 0, section), Err(TreeError::CycleDetected));
        assert_eq!(tree.insert_child(section, 0, section), Err(TreeError::CycleDetected));
        assert_eq!(tree.parent(section), Some(tree.root()));
    }

    #[test]
    fn test_void_parent_rejected() {
        let (mut tree, section, a, _) = sample();
        let img = tree.create_element("img");
        tree.append_child(section, img).unwrap();
        assert_eq!(tree.insert_child(img, 0, a), Err(TreeError::NotAContainer(img)));
    }

    #[test]
    fn test_remove_node_frees_subtree() {
        let (mut tree, section, a, b) = sample();
        tree.remove_node(section).unwrap();
        assert!(!tree.contains(section));
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn test_class_attribute_records_old_value() {
        let (mut tree, _, a, _) = sample();
        tree.add_class(a, "card").unwrap();
        tree.set_attribute(a, "class", "card  hero card").unwrap();

        assert_eq!(tree.get(a).unwrap().classes(), &["card", "hero"]);
        let batches = tree.take_mutations();
        assert_eq!(
            batches[1].records[0].kind,
            MutationKind::Attribute {
                name: "class".to_string(),
                old_value: Some("card".to_string()),
            }
        );
    }

    #[test]
    fn test_style_attribute_expands_to_properties() {
        let (mut tree, _, a, _) = sample();
        tree.set_attribute(a, "style", "display: flex; gap: 4px;").unwrap();

        let element = tree.get(a).unwrap().element().unwrap();
        assert_eq!(element.styles.get("display").map(String::as_str), Some("flex"));
        assert_eq!(element.styles.get("gap").map(String::as_str), Some("4px"));
        assert!(element.attributes.is_empty());
    }

    #[test]
    fn test_detached_mutations_are_flagged() {
        let mut tree = VisualTree::new("main");
        let orphan = tree.create_element("div");
        tree.set_attribute(orphan, "title", "x").unwrap();

        let batches = tree.take_mutations();
        assert!(!batches[0].records[0].attached);
    }

    #[test]
    fn test_ensure_id_is_idempotent_and_silent() {
        let (mut tree, _, a, _) = sample();
        let mut ids = IdGenerator::from_parts("el", "abc123");

        let first = tree.ensure_id(a, &mut ids).unwrap();
        let second = tree.ensure_id(a, &mut ids).unwrap();

        assert_eq!(first, "el-1-abc123");
        assert_eq!(first, second);
        assert_eq!(ids.count(), 1);
        assert!(!tree.has_pending_mutations());
    }

    #[test]
    fn test_find_by_id_ignores_detached() {
        let (mut tree, _, a, _) = sample();
        tree.set_attribute(a, "id", "hero").unwrap();
        assert_eq!(tree.find_by_id("hero"), Some(a));

        tree.detach(a).unwrap();
        assert_eq!(tree.find_by_id("hero"), None);
    }

    #[test]
    fn test_set_text_content() {
        let (mut tree, section, a, _) = sample();
        let label = tree.create_text("old");
        tree.append_child(a, label).unwrap();
        tree.discard_mutations();

        tree.set_text_content(a, "new").unwrap();
        assert_eq!(tree.children(a), &[label]);
        assert_eq!(tree.get(label).unwrap().text(), Some("new"));

        // mixed content collapses to one text node
        tree.set_text_content(section, "flat").unwrap();
        let batches = tree.take_mutations();
        assert_eq!(batches.len(), 2);
        assert_eq!(tree.children(section).len(), 1);
        assert_eq!(tree.get(tree.children(section)[0]).unwrap().text(), Some("flat"));
    }

    #[test]
    fn test_nested_batches_flatten() {
        let (mut tree, section, a, b) = sample();
        tree.batch(|tree| {
            tree.set_style(a, "color", "red").unwrap();
            tree.batch(|tree| tree.set_style(b, "color", "blue").unwrap());
            tree.detach(a).unwrap();
        });

        let batches = tree.take_mutations();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].records.len(), 3);
        assert_eq!(tree.children(section), &[b]);
    }
}
