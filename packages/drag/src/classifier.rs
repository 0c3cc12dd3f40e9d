//! # Drag Mode Classifier
//!
//! Decides what kind of drag a pointer-down starts. First matching rule wins:
//!
//! ```text
//! palette item                                   -> external
//! canvas element + any modifier                  -> positioning
//! canvas element in a row/column flow parent     -> positioning
//! canvas element                                 -> internal
//! anything else                                  -> disabled
//! ```
//!
//! The mode is a pure function of source kind, modifiers and parent layout.

use easel_tree::{ContentFilter, ElementData, LayoutMode, NodeKey, VisualTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element template offered by the host's palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteItem {
    pub tag: String,

    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    #[serde(default)]
    pub styles: BTreeMap<String, String>,

    /// Initial text content
    #[serde(default)]
    pub text: Option<String>,
}

impl PaletteItem {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn element_data(&self) -> ElementData {
        let mut data = ElementData::new(self.tag.clone());
        for class in &self.classes {
            data = data.with_class(class.clone());
        }
        for (name, value) in &self.attrs {
            data = data.with_attr(name.clone(), value.clone());
        }
        for (property, value) in &self.styles {
            data = data.with_style(property.clone(), value.clone());
        }
        data
    }
}

/// What the pointer went down on
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    Palette(PaletteItem),
    Element(NodeKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Palette,
    CanvasElement,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragMode {
    /// New element from the palette
    External,
    /// Move an element anywhere in the tree
    Internal,
    /// Reorder within the current parent
    Positioning,
    /// Drag never starts
    Disabled,
}

impl std::fmt::Display for DragMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DragMode::External => write!(f, "external"),
            DragMode::Internal => write!(f, "internal"),
            DragMode::Positioning => write!(f, "positioning"),
            DragMode::Disabled => write!(f, "disabled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.alt || self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub source: SourceKind,
    pub mode: DragMode,
    /// Advisory only; never used for decisions
    pub confidence: f64,
}

pub fn classify(
    source: SourceKind,
    modifiers: Modifiers,
    parent_layout: Option<LayoutMode>,
) -> Classification {
    let (mode, confidence) = match source {
        SourceKind::Palette => (DragMode::External, 1.0),
        SourceKind::CanvasElement if modifiers.any() => (DragMode::Positioning, 0.95),
        SourceKind::CanvasElement if parent_layout.is_some_and(|l| l.is_linear_flow()) => {
            (DragMode::Positioning, 0.8)
        }
        SourceKind::CanvasElement => (DragMode::Internal, 0.9),
        SourceKind::Unknown => (DragMode::Disabled, 0.0),
    };

    Classification {
        source,
        mode,
        confidence,
    }
}

/// Kind of a canvas node as a drag source
///
/// The root, text nodes, detached nodes and bookkeeping nodes are unknown.
pub fn source_for(tree: &VisualTree, filter: &ContentFilter, key: NodeKey) -> SourceKind {
    let Some(node) = tree.get(key) else {
        return SourceKind::Unknown;
    };
    if key == tree.root() || !node.is_element() || !filter.is_content(node) || !tree.is_attached(key) {
        return SourceKind::Unknown;
    }
    SourceKind::CanvasElement
}

/// Classify a drag source against the live tree
pub fn classify_source(
    tree: &VisualTree,
    filter: &ContentFilter,
    source: &DragSource,
    modifiers: Modifiers,
) -> Classification {
    match source {
        DragSource::Palette(_) => classify(SourceKind::Palette, modifiers, None),
        DragSource::Element(key) => {
            let kind = source_for(tree, filter, *key);
            let parent_layout = tree
                .parent(*key)
                .and_then(|p| tree.get(p))
                .map(|p| p.layout_mode());
            classify(kind, modifiers, parent_layout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_in_order() {
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };

        assert_eq!(classify(SourceKind::Palette, shift, Some(LayoutMode::Row)).mode, DragMode::External);
        assert_eq!(classify(SourceKind::CanvasElement, shift, None).mode, DragMode::Positioning);
        assert_eq!(
            classify(SourceKind::CanvasElement, Modifiers::NONE, Some(LayoutMode::Column)).mode,
            DragMode::Positioning
        );
        assert_eq!(
            classify(SourceKind::CanvasElement, Modifiers::NONE, Some(LayoutMode::Grid)).mode,
            DragMode::Internal
        );
        assert_eq!(classify(SourceKind::Unknown, shift, None).mode, DragMode::Disabled);
    }

    #[test]
    fn test_source_kinds() {
        let filter = ContentFilter::default();
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        let card = tree.create_element("div");
        let text = tree.create_text("hi");
        let orphan = tree.create_element("div");
        let ghost = tree.create_element_with(ElementData::new("div").with_class("easel-ghost"));
        tree.append_child(root, card).unwrap();
        tree.append_child(card, text).unwrap();
        tree.append_child(root, ghost).unwrap();

        assert_eq!(source_for(&tree, &filter, card), SourceKind::CanvasElement);
        assert_eq!(source_for(&tree, &filter, root), SourceKind::Unknown);
        assert_eq!(source_for(&tree, &filter, text), SourceKind::Unknown);
        assert_eq!(source_for(&tree, &filter, orphan), SourceKind::Unknown);
        assert_eq!(source_for(&tree, &filter, ghost), SourceKind::Unknown);
    }

    #[test]
    fn test_palette_item_from_json() {
        let item: PaletteItem =
            serde_json::from_str(r#"{"tag":"button","classes":["btn"],"text":"Buy"}"#).unwrap();
        let data = item.element_data();
        assert_eq!(data.tag, "button");
        assert!(data.has_class("btn"));
        assert_eq!(item.text.as_deref(), Some("Buy"));
    }
}
