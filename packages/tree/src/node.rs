use easel_common::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Elements that can never hold children
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Handle to a node in a [`VisualTree`](crate::VisualTree)
///
/// Keys are allocated from a monotonic counter and never reused, so a key
/// held across a rebuild can never resolve to a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub(crate) u64);

impl NodeKey {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Layout flow of an element, derived from its inline styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    Block,
    Row,
    Column,
    Grid,
    Hidden,
}

impl LayoutMode {
    pub fn from_styles(styles: &BTreeMap<String, String>) -> Self {
        let display = styles
            .get("display")
            .map(|d| d.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match display.as_str() {
            "none" => LayoutMode::Hidden,
            "flex" | "inline-flex" => {
                let direction = styles
                    .get("flex-direction")
                    .map(|d| d.trim().to_ascii_lowercase())
                    .unwrap_or_default();
                if direction.starts_with("column") {
                    LayoutMode::Column
                } else {
                    LayoutMode::Row
                }
            }
            "grid" | "inline-grid" => LayoutMode::Grid,
            _ => LayoutMode::Block,
        }
    }

    /// Flex or grid container
    pub fn is_flow(&self) -> bool {
        matches!(self, LayoutMode::Row | LayoutMode::Column | LayoutMode::Grid)
    }

    /// Single-axis flow (row or column)
    pub fn is_linear_flow(&self) -> bool {
        matches!(self, LayoutMode::Row | LayoutMode::Column)
    }
}

/// Element payload: tag, identity, classes, attributes and inline styles
///
/// `id` and `classes` are held apart from `attributes`; the attribute map
/// never contains `id`, `class` or `style` keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementData {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn layout_mode(&self) -> LayoutMode {
        LayoutMode::from_styles(&self.styles)
    }

    pub fn is_void(&self) -> bool {
        let tag = self.tag.to_ascii_lowercase();
        VOID_ELEMENTS.contains(&tag.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

/// A node of the live visual tree
///
/// Geometry (`bounds`, `visible`) is supplied by the host's layout pass and
/// is not part of the node's content.
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub(crate) key: NodeKey,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) bounds: Rect,
    pub(crate) visible: bool,
}

impl VisualNode {
    pub(crate) fn new(key: NodeKey, kind: NodeKind) -> Self {
        Self {
            key,
            parent: None,
            kind,
            children: Vec::new(),
            bounds: Rect::default(),
            visible: true,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.element().map(|e| e.tag.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.element().and_then(|e| e.id.as_deref())
    }

    pub fn classes(&self) -> &[String] {
        self.element().map(|e| e.classes.as_slice()).unwrap_or(&[])
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn layout_mode(&self) -> LayoutMode {
        match &self.kind {
            NodeKind::Element(data) => data.layout_mode(),
            NodeKind::Text(_) => LayoutMode::Block,
        }
    }

    /// Rendered: not hidden by the host, not `display: none`, non-empty box
    pub fn is_visible(&self) -> bool {
        self.visible && self.layout_mode() != LayoutMode::Hidden && !self.bounds.is_empty()
    }

    /// Whether a dropped node may become a child of this node
    pub fn accepts_children(&self) -> bool {
        match &self.kind {
            NodeKind::Element(data) => !data.is_void(),
            NodeKind::Text(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_mode_from_styles() {
        let row = ElementData::new("div").with_style("display", "flex");
        assert_eq!(row.layout_mode(), LayoutMode::Row);

        let column = ElementData::new("div")
            .with_style("display", "inline-flex")
            .with_style("flex-direction", "column-reverse");
        assert_eq!(column.layout_mode(), LayoutMode::Column);

        let grid = ElementData::new("div").with_style("display", " Grid ");
        assert_eq!(grid.layout_mode(), LayoutMode::Grid);
        assert!(grid.layout_mode().is_flow());
        assert!(!grid.layout_mode().is_linear_flow());

        assert_eq!(ElementData::new("div").layout_mode(), LayoutMode::Block);
        assert_eq!(
            ElementData::new("div").with_style("display", "none").layout_mode(),
            LayoutMode::Hidden
        );
    }

    #[test]
    fn test_void_elements() {
        assert!(ElementData::new("IMG").is_void());
        assert!(!ElementData::new("section").is_void());
    }

    #[test]
    fn test_with_class_deduplicates() {
        let data = ElementData::new("div").with_class("card").with_class("card");
        assert_eq!(data.classes, vec!["card"]);
    }
}
