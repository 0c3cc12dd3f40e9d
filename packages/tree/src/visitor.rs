use crate::node::{ElementData, NodeKey, VisualNode};
use crate::VisualTree;

/// What the walker should do after visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    SkipChildren,
    Stop,
}

/// Visitor pattern for traversing the visual tree immutably
///
/// Default implementations walk the entire subtree. Override the
/// `visit_*` methods to act on nodes; return [`VisitControl::SkipChildren`]
/// to prune a branch.
pub trait Visitor: Sized {
    fn visit_element(
        &mut self,
        _tree: &VisualTree,
        _node: &VisualNode,
        _element: &ElementData,
    ) -> VisitControl {
        VisitControl::Continue
    }

    fn visit_text(&mut self, _tree: &VisualTree, _node: &VisualNode, _text: &str) -> VisitControl {
        VisitControl::Continue
    }
}

/// Walk the subtree rooted at `start` in pre-order
///
/// Returns `false` if a visitor stopped the walk early.
pub fn walk<V: Visitor>(visitor: &mut V, tree: &VisualTree, start: NodeKey) -> bool {
    let mut stack = vec![start];

    while let Some(key) = stack.pop() {
        let Some(node) = tree.get(key) else {
            continue;
        };

        let control = match node.element() {
            Some(element) => visitor.visit_element(tree, node, element),
            None => visitor.visit_text(tree, node, node.text().unwrap_or_default()),
        };

        match control {
            VisitControl::Continue => stack.extend(node.children().iter().rev().copied()),
            VisitControl::SkipChildren => {}
            VisitControl::Stop => return false,
        }
    }

    true
}
