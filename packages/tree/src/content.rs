use crate::node::{NodeKind, VisualNode};
use serde::{Deserialize, Serialize};

/// Decides which nodes are canvas content
///
/// Non-content nodes are skipped by the serializer, never become drop
/// candidates, and mutations touching them never trigger a sync. Marker
/// classes identify the bookkeeping nodes inserted for transient drag
/// feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentFilter {
    /// Tags that never carry user content
    pub skip_tags: Vec<String>,

    /// Classes marking internal bookkeeping nodes
    pub marker_classes: Vec<String>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self {
            skip_tags: ["style", "script", "noscript", "template"]
                .into_iter()
                .map(String::from)
                .collect(),
            marker_classes: ["easel-ghost", "easel-drop-indicator", "easel-highlight"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ContentFilter {
    pub fn is_marker_class(&self, class: &str) -> bool {
        self.marker_classes.iter().any(|m| m == class)
    }

    pub fn has_marker(&self, classes: &[String]) -> bool {
        classes.iter().any(|c| self.is_marker_class(c))
    }

    /// Whitespace-separated class attribute value carries a marker
    pub fn class_value_has_marker(&self, value: &str) -> bool {
        value.split_whitespace().any(|c| self.is_marker_class(c))
    }

    pub fn is_skipped_tag(&self, tag: &str) -> bool {
        self.skip_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_content(&self, node: &VisualNode) -> bool {
        match node.kind() {
            NodeKind::Text(_) => true,
            NodeKind::Element(data) => !self.is_skipped_tag(&data.tag) && !self.has_marker(&data.classes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementData, VisualTree};

    #[test]
    fn test_content_classification() {
        let filter = ContentFilter::default();
        let mut tree = VisualTree::new("main");
        let style = tree.create_element("STYLE");
        let indicator =
            tree.create_element_with(ElementData::new("div").with_class("easel-drop-indicator"));
        let card = tree.create_element_with(ElementData::new("div").with_class("card"));
        let text = tree.create_text("hello");

        assert!(!filter.is_content(tree.get(style).unwrap()));
        assert!(!filter.is_content(tree.get(indicator).unwrap()));
        assert!(filter.is_content(tree.get(card).unwrap()));
        assert!(filter.is_content(tree.get(text).unwrap()));
    }

    #[test]
    fn test_class_value_marker() {
        let filter = ContentFilter::default();
        assert!(filter.class_value_has_marker("card easel-highlight"));
        assert!(!filter.class_value_has_marker("card highlight"));
    }
}
