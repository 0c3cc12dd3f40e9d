//! Transient visual feedback for the selected drop zone.
//!
//! Feedback nodes carry a marker class, so the change detector ignores
//! them and the serializer never sees them.

use crate::zones::DropZone;
use easel_tree::{ElementData, NodeKey, TreeError, VisualTree};

pub trait DragFeedback {
    /// Show (or move) the indicator for `zone`
    fn show(&mut self, tree: &mut VisualTree, zone: &DropZone, auto_apply: bool) -> Result<(), TreeError>;

    /// Remove any indicator
    fn clear(&mut self, tree: &mut VisualTree) -> Result<(), TreeError>;
}

/// Feedback that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl DragFeedback for NoFeedback {
    fn show(&mut self, _tree: &mut VisualTree, _zone: &DropZone, _auto_apply: bool) -> Result<(), TreeError> {
        Ok(())
    }

    fn clear(&mut self, _tree: &mut VisualTree) -> Result<(), TreeError> {
        Ok(())
    }
}

/// Inserts a marker element where the drop would land
#[derive(Debug, Clone)]
pub struct IndicatorFeedback {
    class: String,
    indicator: Option<NodeKey>,
}

impl IndicatorFeedback {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            indicator: None,
        }
    }

    pub fn indicator(&self) -> Option<NodeKey> {
        self.indicator
    }
}

impl DragFeedback for IndicatorFeedback {
    fn show(&mut self, tree: &mut VisualTree, zone: &DropZone, auto_apply: bool) -> Result<(), TreeError> {
        self.clear(tree)?;

        let mut data = ElementData::new("div").with_class(self.class.clone());
        if auto_apply {
            data = data.with_attr("data-auto-apply", "true");
        }
        let indicator = tree.create_element_with(data);
        tree.set_bounds(indicator, zone.bounds)?;

        let index = zone
            .reference
            .and_then(|r| tree.index_in_parent(r).filter(|_| tree.parent(r) == Some(zone.target)))
            .unwrap_or(tree.children(zone.target).len());
        tree.insert_child(zone.target, index, indicator)?;

        self.indicator = Some(indicator);
        Ok(())
    }

    fn clear(&mut self, tree: &mut VisualTree) -> Result<(), TreeError> {
        if let Some(indicator) = self.indicator.take() {
            // the indicator may already be gone after a rollback
            if tree.contains(indicator) {
                tree.remove_node(indicator)?;
            }
        }
        Ok(())
    }
}
