//! # Drop Zone Generation
//!
//! Zones are rebuilt from current geometry on every pointer sample:
//!
//! - **Container**: every candidate element (append as last child)
//! - **Insertion**: the gap nearest the pointer inside a candidate that
//!   contains it, along the candidate's flow axis
//! - **Directional**: edge bands of the sibling under the pointer
//!   (insert before or after it)
//! - **Boundary**: the canvas root, appended to as the last resort
//!
//! Candidates are visible content elements of at least the configured
//! size. The dragged node and its subtree are never candidates.

use crate::classifier::DragMode;
use crate::config::ZoneConfig;
use crate::errors::InvalidReason;
use crate::scoring;
use easel_common::{Point, Rect, Vector};
use easel_tree::{
    walk, ContentFilter, ElementData, LayoutMode, NodeKey, VisitControl, Visitor, VisualNode,
    VisualTree,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Whether a velocity points toward this side
    pub fn matches(&self, velocity: Vector) -> bool {
        match self {
            Direction::Above => velocity.dy < 0.0,
            Direction::Below => velocity.dy > 0.0,
            Direction::Left => velocity.dx < 0.0,
            Direction::Right => velocity.dx > 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneType {
    Insertion,
    Directional(Direction),
    Container,
    Boundary,
}

impl ZoneType {
    /// Precedence when several zones contain the pointer (higher wins)
    pub fn priority(&self) -> u8 {
        match self {
            ZoneType::Insertion => 3,
            ZoneType::Directional(_) => 2,
            ZoneType::Container => 1,
            ZoneType::Boundary => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ZoneType::Insertion => "insertion",
            ZoneType::Directional(_) => "directional",
            ZoneType::Container => "container",
            ZoneType::Boundary => "boundary",
        }
    }
}

/// A scored candidate location for the drop
#[derive(Debug, Clone, PartialEq)]
pub struct DropZone {
    /// Stable identifier, also the final ranking tie-breaker
    pub id: String,
    pub zone_type: ZoneType,

    /// Node that receives the dropped element
    pub target: NodeKey,

    /// Insert before this child of `target`; `None` appends
    pub reference: Option<NodeKey>,

    pub bounds: Rect,
    pub score: f64,
    pub valid: bool,
    pub invalid_reason: Option<InvalidReason>,
}

impl DropZone {
    fn new(
        id: String,
        zone_type: ZoneType,
        target: NodeKey,
        reference: Option<NodeKey>,
        bounds: Rect,
        score: f64,
        invalid_reason: Option<InvalidReason>,
    ) -> Self {
        Self {
            id,
            zone_type,
            target,
            reference,
            bounds,
            score: score.clamp(0.0, 1.0),
            valid: invalid_reason.is_none(),
            invalid_reason,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }
}

/// Inputs of one zone computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneQuery {
    /// Canvas node being moved; `None` for palette drags
    pub dragged: Option<NodeKey>,
    pub mode: DragMode,
    pub pointer: Point,
    pub velocity: Vector,
}

struct CandidateCollector<'a> {
    filter: &'a ContentFilter,
    config: &'a ZoneConfig,
    root: NodeKey,
    dragged: Option<NodeKey>,
    found: Vec<NodeKey>,
}

impl Visitor for CandidateCollector<'_> {
    fn visit_element(
        &mut self,
        _tree: &VisualTree,
        node: &VisualNode,
        _element: &ElementData,
    ) -> VisitControl {
        let key = node.key();
        if Some(key) == self.dragged || !self.filter.is_content(node) {
            return VisitControl::SkipChildren;
        }
        if key == self.root {
            self.found.push(key);
            return VisitControl::Continue;
        }
        if !node.is_visible() {
            return VisitControl::SkipChildren;
        }

        let bounds = node.bounds();
        if bounds.width >= self.config.min_width && bounds.height >= self.config.min_height {
            self.found.push(key);
        }
        VisitControl::Continue
    }
}

/// Visible content elements that may receive a drop, in tree order
pub fn candidates(
    tree: &VisualTree,
    filter: &ContentFilter,
    config: &ZoneConfig,
    dragged: Option<NodeKey>,
) -> Vec<NodeKey> {
    let mut collector = CandidateCollector {
        filter,
        config,
        root: tree.root(),
        dragged,
        found: Vec::new(),
    };
    walk(&mut collector, tree, tree.root());
    collector.found
}

/// Structural check of a drop target, independent of score
pub fn validate_target(
    tree: &VisualTree,
    target: NodeKey,
    dragged: Option<NodeKey>,
) -> Option<InvalidReason> {
    let accepts = tree.get(target).is_some_and(|n| n.accepts_children());
    if !accepts {
        return Some(InvalidReason::NotAContainer);
    }
    match dragged {
        Some(node) if node == target || tree.is_ancestor(node, target) => Some(InvalidReason::Cycle),
        _ => None,
    }
}

/// Generate every zone for the current pointer position, unranked
pub fn generate_zones(
    tree: &VisualTree,
    filter: &ContentFilter,
    query: &ZoneQuery,
    config: &ZoneConfig,
) -> Vec<DropZone> {
    let root = tree.root();
    let mut scope = candidates(tree, filter, config, query.dragged);

    // Positioning keeps the element in its parent: siblings only offer the
    // bands beside them, and the parent offers no bands of its own.
    let positioning_parent = match query.mode {
        DragMode::Positioning => query.dragged.and_then(|d| tree.parent(d)),
        _ => None,
    };
    if let Some(parent) = positioning_parent {
        scope.retain(|c| *c == parent || tree.parent(*c) == Some(parent));
    }

    let mut zones = Vec::new();
    for &key in &scope {
        let Some(node) = tree.get(key) else {
            continue;
        };
        let contains_pointer = node.bounds().contains(query.pointer);
        let sibling = positioning_parent.is_some_and(|p| p != key);

        if key == root {
            zones.push(boundary_zone(tree, node, query, config));
        } else if !sibling {
            zones.push(container_zone(tree, filter, node, query, config));
        }

        if !contains_pointer {
            continue;
        }

        if !sibling {
            if let Some(zone) = insertion_zone(tree, filter, node, query, config) {
                zones.push(zone);
            }
        }

        if key != root && positioning_parent != Some(key) {
            zones.extend(directional_zones(tree, filter, node, query, config));
        }
    }

    zones
}

fn boundary_zone(
    tree: &VisualTree,
    root: &VisualNode,
    query: &ZoneQuery,
    config: &ZoneConfig,
) -> DropZone {
    let bounds = root.bounds();
    let score = if bounds.contains(query.pointer) {
        config.boundary_score
    } else {
        0.0
    };
    DropZone::new(
        format!("boundary-{}", root.key()),
        ZoneType::Boundary,
        root.key(),
        None,
        bounds,
        score,
        validate_target(tree, root.key(), query.dragged),
    )
}

fn container_zone(
    tree: &VisualTree,
    filter: &ContentFilter,
    node: &VisualNode,
    query: &ZoneQuery,
    config: &ZoneConfig,
) -> DropZone {
    let children = content_children(tree, filter, node.key(), query.dragged).len();
    let score = scoring::container_score(
        node.bounds(),
        query.pointer,
        node.layout_mode(),
        children,
        config,
    );
    DropZone::new(
        format!("container-{}", node.key()),
        ZoneType::Container,
        node.key(),
        None,
        node.bounds(),
        score,
        validate_target(tree, node.key(), query.dragged),
    )
}

fn insertion_zone(
    tree: &VisualTree,
    filter: &ContentFilter,
    node: &VisualNode,
    query: &ZoneQuery,
    config: &ZoneConfig,
) -> Option<DropZone> {
    let content = content_children(tree, filter, node.key(), query.dragged);
    let placed: Vec<(NodeKey, Rect)> = content
        .iter()
        .filter_map(|k| tree.get(*k))
        .filter(|c| c.is_element() && c.is_visible())
        .map(|c| (c.key(), c.bounds()))
        .collect();
    let (&(last_key, last_bounds), _) = placed.split_last()?;

    let horizontal = node.layout_mode() == LayoutMode::Row;
    let span = |r: &Rect| {
        if horizontal {
            (r.left(), r.right())
        } else {
            (r.top(), r.bottom())
        }
    };

    // Gap before each placed child, then after the last one
    let mut gaps: Vec<(f64, Option<NodeKey>)> = Vec::with_capacity(placed.len() + 1);
    for (i, (key, bounds)) in placed.iter().enumerate() {
        let position = match i {
            0 => span(bounds).0,
            _ => (span(&placed[i - 1].1).1 + span(bounds).0) / 2.0,
        };
        gaps.push((position, Some(*key)));
    }
    let after_last = content
        .iter()
        .position(|k| *k == last_key)
        .and_then(|i| content.get(i + 1).copied());
    gaps.push((span(&last_bounds).1, after_last));

    let axis = if horizontal { query.pointer.x } else { query.pointer.y };
    let (position, reference) = gaps.into_iter().min_by(|a, b| {
        (a.0 - axis).abs().total_cmp(&(b.0 - axis).abs())
    })?;

    let reach = config.insertion_reach_px;
    let container = node.bounds();
    let bounds = if horizontal {
        Rect::new(position - reach, container.y, reach * 2.0, container.height)
    } else {
        Rect::new(container.x, position - reach, container.width, reach * 2.0)
    };
    if !bounds.contains(query.pointer) {
        return None;
    }

    let id = match reference {
        Some(r) => format!("insertion-{}-{}", node.key(), r),
        None => format!("insertion-{}-end", node.key()),
    };
    Some(DropZone::new(
        id,
        ZoneType::Insertion,
        node.key(),
        reference,
        bounds,
        scoring::proximity((position - axis).abs(), reach),
        validate_target(tree, node.key(), query.dragged),
    ))
}

fn directional_zones(
    tree: &VisualTree,
    filter: &ContentFilter,
    node: &VisualNode,
    query: &ZoneQuery,
    config: &ZoneConfig,
) -> Vec<DropZone> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    let b = node.bounds();
    let p = query.pointer;
    let vertical = config.band_thickness(b.height);
    let horizontal = config.band_thickness(b.width);

    let next_sibling = {
        let siblings = content_children(tree, filter, parent, query.dragged);
        siblings
            .iter()
            .position(|k| *k == node.key())
            .and_then(|i| siblings.get(i + 1).copied())
    };

    let bands = [
        (
            Direction::Above,
            Rect::new(b.x, b.y, b.width, vertical),
            p.y - b.top(),
            vertical,
            Some(node.key()),
        ),
        (
            Direction::Below,
            Rect::new(b.x, b.bottom() - vertical, b.width, vertical),
            b.bottom() - p.y,
            vertical,
            next_sibling,
        ),
        (
            Direction::Left,
            Rect::new(b.x, b.y, horizontal, b.height),
            p.x - b.left(),
            horizontal,
            Some(node.key()),
        ),
        (
            Direction::Right,
            Rect::new(b.right() - horizontal, b.y, horizontal, b.height),
            b.right() - p.x,
            horizontal,
            next_sibling,
        ),
    ];

    let invalid = validate_target(tree, parent, query.dragged);
    bands
        .into_iter()
        .filter(|(_, band, ..)| band.contains(p))
        .map(|(direction, band, distance, thickness, reference)| {
            let score = scoring::directional_score(
                distance,
                thickness,
                direction,
                query.velocity,
                config,
            );
            DropZone::new(
                format!("directional-{}-{}", direction.label(), node.key()),
                ZoneType::Directional(direction),
                parent,
                reference,
                band,
                score,
                invalid,
            )
        })
        .collect()
}

/// Content children of `parent`, minus the dragged node
fn content_children(
    tree: &VisualTree,
    filter: &ContentFilter,
    parent: NodeKey,
    dragged: Option<NodeKey>,
) -> Vec<NodeKey> {
    tree.children(parent)
        .iter()
        .copied()
        .filter(|k| Some(*k) != dragged)
        .filter(|k| tree.get(*k).is_some_and(|n| filter.is_content(n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// main (0,0 800x600)
    ///   section.list (0,0 400x300), column flow
    ///     div a (0,0 400x100)
    ///     div b (0,100 400x100)
    ///   img (500,0 100x100)
    struct Fixture {
        tree: VisualTree,
        list: NodeKey,
        a: NodeKey,
        b: NodeKey,
        img: NodeKey,
    }

    fn fixture() -> Fixture {
        let mut tree = VisualTree::new("main");
        let root = tree.root();
        tree.set_bounds(root, Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();

        let list = tree.create_element_with(
            ElementData::new("section")
                .with_style("display", "flex")
                .with_style("flex-direction", "column"),
        );
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let img = tree.create_element("img");
        tree.append_child(root, list).unwrap();
        tree.append_child(list, a).unwrap();
        tree.append_child(list, b).unwrap();
        tree.append_child(root, img).unwrap();

        tree.set_bounds(list, Rect::new(0.0, 0.0, 400.0, 300.0)).unwrap();
        tree.set_bounds(a, Rect::new(0.0, 0.0, 400.0, 100.0)).unwrap();
        tree.set_bounds(b, Rect::new(0.0, 100.0, 400.0, 100.0)).unwrap();
        tree.set_bounds(img, Rect::new(500.0, 0.0, 100.0, 100.0)).unwrap();

        Fixture { tree, list, a, b, img }
    }

    fn query(dragged: Option<NodeKey>, x: f64, y: f64) -> ZoneQuery {
        ZoneQuery {
            dragged,
            mode: DragMode::Internal,
            pointer: Point::new(x, y),
            velocity: Vector::ZERO,
        }
    }

    #[test]
    fn test_priority_order() {
        assert!(ZoneType::Insertion.priority() > ZoneType::Directional(Direction::Above).priority());
        assert!(ZoneType::Directional(Direction::Left).priority() > ZoneType::Container.priority());
        assert!(ZoneType::Container.priority() > ZoneType::Boundary.priority());
    }

    #[test]
    fn test_candidates_exclude_dragged_subtree_and_small_nodes() {
        let mut f = fixture();
        let root = f.tree.root();
        let tiny = f.tree.create_element("span");
        f.tree.append_child(root, tiny).unwrap();
        f.tree.set_bounds(tiny, Rect::new(700.0, 0.0, 20.0, 20.0)).unwrap();

        let found = candidates(&f.tree, &ContentFilter::default(), &ZoneConfig::default(), Some(f.list));
        assert_eq!(found, vec![f.tree.root(), f.img]);
    }

    #[test]
    fn test_insertion_gap_between_children() {
        let f = fixture();
        let zones = generate_zones(
            &f.tree,
            &ContentFilter::default(),
            &query(None, 200.0, 104.0),
            &ZoneConfig::default(),
        );

        let insertion = zones
            .iter()
            .find(|z| z.zone_type == ZoneType::Insertion && z.target == f.list)
            .unwrap();
        assert_eq!(insertion.reference, Some(f.b));
        assert!((insertion.score - (1.0 - 4.0 / 24.0)).abs() < 1e-9);

        let zones = generate_zones(
            &f.tree,
            &ContentFilter::default(),
            &query(None, 200.0, 2.0),
            &ZoneConfig::default(),
        );
        let insertion = zones
            .iter()
            .find(|z| z.zone_type == ZoneType::Insertion && z.target == f.list)
            .unwrap();
        assert_eq!(insertion.reference, Some(f.a));
    }

    #[test]
    fn test_directional_bands_reference_sibling() {
        let f = fixture();
        let zones = generate_zones(
            &f.tree,
            &ContentFilter::default(),
            &query(None, 200.0, 195.0),
            &ZoneConfig::default(),
        );

        let below = zones
            .iter()
            .find(|z| z.zone_type == ZoneType::Directional(Direction::Below))
            .unwrap();
        assert_eq!(below.target, f.list);
        assert_eq!(below.reference, None);

        assert!(zones
            .iter()
            .all(|z| z.zone_type != ZoneType::Directional(Direction::Above)));
    }

    #[test]
    fn test_void_container_is_invalid() {
        let f = fixture();
        let zones = generate_zones(
            &f.tree,
            &ContentFilter::default(),
            &query(None, 550.0, 50.0),
            &ZoneConfig::default(),
        );

        let img_zone = zones.iter().find(|z| z.id == format!("container-{}", f.img)).unwrap();
        assert!(!img_zone.valid);
        assert_eq!(img_zone.invalid_reason, Some(InvalidReason::NotAContainer));
    }

    #[test]
    fn test_positioning_restricts_scope() {
        let f = fixture();
        let mut q = query(Some(f.a), 550.0, 50.0);
        q.mode = DragMode::Positioning;

        let zones = generate_zones(&f.tree, &ContentFilter::default(), &q, &ZoneConfig::default());
        assert!(zones.iter().all(|z| z.target == f.list));

        // near the list's own bottom edge: no band leading out to main
        q.pointer = Point::new(200.0, 290.0);
        let zones = generate_zones(&f.tree, &ContentFilter::default(), &q, &ZoneConfig::default());
        assert!(!zones.is_empty());
        assert!(zones.iter().all(|z| z.target == f.list));
    }

    #[test]
    fn test_positioning_never_nests_into_sibling() {
        let f = fixture();
        let mut q = query(Some(f.a), 200.0, 195.0);
        q.mode = DragMode::Positioning;

        let zones = generate_zones(&f.tree, &ContentFilter::default(), &q, &ZoneConfig::default());
        assert!(zones.iter().all(|z| z.target != f.b));

        // the band along b's lower edge still reorders within the list
        let below = zones
            .iter()
            .find(|z| z.zone_type == ZoneType::Directional(Direction::Below))
            .unwrap();
        assert_eq!(below.target, f.list);
        assert_eq!(below.reference, None);
        assert!(zones.iter().any(|z| z.id == format!("container-{}", f.list)));

        // an internal drag over the same spot may still enter b
        let zones = generate_zones(
            &f.tree,
            &ContentFilter::default(),
            &query(Some(f.a), 200.0, 195.0),
            &ZoneConfig::default(),
        );
        assert!(zones.iter().any(|z| z.id == format!("container-{}", f.b)));
    }
}
