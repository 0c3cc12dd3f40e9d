//! # Zone Scoring and Ranking
//!
//! Ranking order:
//!
//! ```text
//! 1. every zone by score desc, id asc
//! 2. the zones containing the pointer keep the slots they earned, but are
//!    reordered among themselves: type priority desc, score desc, id asc
//!    (insertion > directional > container > boundary)
//! ```
//!
//! The selection is the first valid zone at or above the accept threshold.
//! Type priority only settles overlaps: a lower-scored insertion strip inside
//! a high-scoring container still wins, but a weak boundary under the pointer
//! never beats a stronger container nearby.

use crate::config::ZoneConfig;
use crate::zones::{generate_zones, Direction, DropZone, ZoneQuery};
use easel_common::{Point, Rect, Vector};
use easel_tree::{ContentFilter, LayoutMode, VisualTree};
use std::cmp::Ordering;
use tracing::debug;

/// Linear falloff: 1 at distance 0, 0 at `reach` and beyond
pub fn proximity(distance: f64, reach: f64) -> f64 {
    if reach <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / reach).max(0.0)
}

pub fn container_score(
    bounds: Rect,
    pointer: Point,
    layout: LayoutMode,
    children: usize,
    config: &ZoneConfig,
) -> f64 {
    let mut score = proximity(pointer.distance(bounds.center()), bounds.half_diagonal());
    if layout.is_flow() {
        score *= config.flow_layout_boost;
    }
    if children > 1 {
        score += config.multi_child_bonus;
    }
    score.clamp(0.0, 1.0)
}

pub fn directional_score(
    distance_to_edge: f64,
    thickness: f64,
    direction: Direction,
    velocity: Vector,
    config: &ZoneConfig,
) -> f64 {
    let mut score = proximity(distance_to_edge, thickness);
    if velocity.length() > config.momentum_speed && direction.matches(velocity) {
        score *= config.momentum_boost;
    }
    score.clamp(0.0, 1.0)
}

fn by_score(a: &DropZone, b: &DropZone) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

fn by_priority(a: &DropZone, b: &DropZone) -> Ordering {
    b.zone_type
        .priority()
        .cmp(&a.zone_type.priority())
        .then_with(|| by_score(a, b))
}

/// Sort zones into selection order
pub fn rank_zones(zones: &mut [DropZone], pointer: Point) {
    zones.sort_by(by_score);

    let slots: Vec<usize> = (0..zones.len())
        .filter(|&i| zones[i].contains(pointer))
        .collect();
    let mut overlapping: Vec<DropZone> = slots.iter().map(|&i| zones[i].clone()).collect();
    overlapping.sort_by(by_priority);

    for (slot, zone) in slots.into_iter().zip(overlapping) {
        zones[slot] = zone;
    }
}

/// First valid zone scoring at least the accept threshold
pub fn select_zone<'a>(ranked: &'a [DropZone], config: &ZoneConfig) -> Option<&'a DropZone> {
    ranked
        .iter()
        .find(|z| z.valid && z.score >= config.accept_threshold)
}

/// Outcome of one zone computation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneResolution {
    /// Every zone, in ranking order
    pub zones: Vec<DropZone>,
    pub selected: Option<DropZone>,
    /// Selection is strong enough for live feedback
    pub auto_apply: bool,
}

/// Generate, rank and select in one step
pub fn score_zones(
    tree: &VisualTree,
    filter: &ContentFilter,
    query: &ZoneQuery,
    config: &ZoneConfig,
) -> ZoneResolution {
    let mut zones = generate_zones(tree, filter, query, config);
    rank_zones(&mut zones, query.pointer);

    let selected = select_zone(&zones, config).cloned();
    let auto_apply = selected
        .as_ref()
        .is_some_and(|z| z.score >= config.auto_apply_threshold);

    match &selected {
        Some(zone) => debug!(
            zone = %zone.id,
            score = zone.score,
            auto_apply,
            candidates = zones.len(),
            "Selected drop zone"
        ),
        None => debug!(candidates = zones.len(), "No valid drop target"),
    }

    ZoneResolution {
        zones,
        selected,
        auto_apply,
    }
}
