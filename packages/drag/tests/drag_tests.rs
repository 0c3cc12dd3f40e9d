use easel_common::{Point, Rect, Vector};
use easel_drag::{
    classify_source, execute, score_zones, DragConfig, DragController, DragEffect, DragMode,
    DragSource, DropError, DropPayload, InvalidReason, Modifiers, ZoneConfig, ZoneQuery, ZoneType,
};
use easel_tree::{ContentFilter, ElementData, IdGenerator, NodeKey, VisualTree};
use std::time::{Duration, Instant};

/// main (0,0 800x600)
///   div.toolbar (0,0 600x100), row flow
///     button (0,0 100x100)
///     button (100,0 100x100)
///   section (0,150 600x300)
///     article (0,150 600x100)
///     article (0,250 600x100)
struct Page {
    tree: VisualTree,
    toolbar: NodeKey,
    first_button: NodeKey,
    section: NodeKey,
    first_article: NodeKey,
    second_article: NodeKey,
}

fn page() -> Page {
    let mut tree = VisualTree::new("main");
    let root = tree.root();
    tree.set_bounds(root, Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();

    let toolbar = tree.create_element_with(
        ElementData::new("div")
            .with_class("toolbar")
            .with_style("display", "flex"),
    );
    let first_button = tree.create_element("button");
    let second_button = tree.create_element("button");
    let section = tree.create_element("section");
    let first_article = tree.create_element("article");
    let second_article = tree.create_element("article");

    tree.append_child(root, toolbar).unwrap();
    tree.append_child(toolbar, first_button).unwrap();
    tree.append_child(toolbar, second_button).unwrap();
    tree.append_child(root, section).unwrap();
    tree.append_child(section, first_article).unwrap();
    tree.append_child(section, second_article).unwrap();

    tree.set_bounds(toolbar, Rect::new(0.0, 0.0, 600.0, 100.0)).unwrap();
    tree.set_bounds(first_button, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    tree.set_bounds(second_button, Rect::new(100.0, 0.0, 100.0, 100.0)).unwrap();
    tree.set_bounds(section, Rect::new(0.0, 150.0, 600.0, 300.0)).unwrap();
    tree.set_bounds(first_article, Rect::new(0.0, 150.0, 600.0, 100.0)).unwrap();
    tree.set_bounds(second_article, Rect::new(0.0, 250.0, 600.0, 100.0)).unwrap();
    tree.discard_mutations();

    Page {
        tree,
        toolbar,
        first_button,
        section,
        first_article,
        second_article,
    }
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
fn test_row_flow_child_drags_in_positioning_mode() {
    let page = page();
    let filter = ContentFilter::default();
    assert_eq!(page.tree.parent(page.first_button), Some(page.toolbar));

    let button = classify_source(
        &page.tree,
        &filter,
        &DragSource::Element(page.first_button),
        Modifiers::NONE,
    );
    assert_eq!(button.mode, DragMode::Positioning);

    let article = classify_source(
        &page.tree,
        &filter,
        &DragSource::Element(page.first_article),
        Modifiers::NONE,
    );
    assert_eq!(article.mode, DragMode::Internal);

    let with_alt = classify_source(
        &page.tree,
        &filter,
        &DragSource::Element(page.first_article),
        Modifiers {
            alt: true,
            ..Modifiers::NONE
        },
    );
    assert_eq!(with_alt.mode, DragMode::Positioning);
}

#[test]
fn test_insertion_strip_beats_stronger_container() {
    let page = page();
    let filter = ContentFilter::default();

    // 10px from the gap between the two articles, 40px from the section center
    let resolution = score_zones(
        &page.tree,
        &filter,
        &query(None, 300.0, 260.0),
        &ZoneConfig::default(),
    );

    let container = resolution
        .zones
        .iter()
        .find(|z| z.id == format!("container-{}", page.section))
        .unwrap();
    let selected = resolution.selected.unwrap();

    assert!(container.score > selected.score);
    assert_eq!(selected.zone_type, ZoneType::Insertion);
    assert_eq!(selected.target, page.section);
    assert_eq!(selected.reference, Some(page.second_article));
}

#[test]
fn test_nearby_container_beats_boundary_under_pointer() {
    // main (0,0 800x600) > section (0,300 600x100) > two stacked articles
    let mut tree = VisualTree::new("main");
    let root = tree.root();
    tree.set_bounds(root, Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();
    let section = tree.create_element("section");
    let upper = tree.create_element("article");
    let lower = tree.create_element("article");
    tree.append_child(root, section).unwrap();
    tree.append_child(section, upper).unwrap();
    tree.append_child(section, lower).unwrap();
    tree.set_bounds(section, Rect::new(0.0, 300.0, 600.0, 100.0)).unwrap();
    tree.set_bounds(upper, Rect::new(0.0, 300.0, 600.0, 50.0)).unwrap();
    tree.set_bounds(lower, Rect::new(0.0, 350.0, 600.0, 50.0)).unwrap();

    // 50px above the section: only the root is under the pointer
    let pointer = Point::new(300.0, 250.0);
    let resolution = score_zones(
        &tree,
        &ContentFilter::default(),
        &query(None, pointer.x, pointer.y),
        &ZoneConfig::default(),
    );

    let boundary = resolution
        .zones
        .iter()
        .find(|z| z.zone_type == ZoneType::Boundary)
        .unwrap();
    assert!(boundary.contains(pointer));
    assert!(resolution
        .zones
        .iter()
        .filter(|z| z.contains(pointer))
        .all(|z| z.zone_type == ZoneType::Boundary));

    let selected = resolution.selected.unwrap();
    assert_eq!(selected.zone_type, ZoneType::Container);
    assert_eq!(selected.target, section);
    assert!(!selected.contains(pointer));
    assert!(selected.score > boundary.score);
    assert!(resolution.auto_apply);
    assert_eq!(resolution.zones[0].id, selected.id);
}

#[test]
fn test_descendants_never_offered_or_accepted() {
    let mut page = page();
    let filter = ContentFilter::default();

    let resolution = score_zones(
        &page.tree,
        &filter,
        &query(Some(page.section), 300.0, 200.0),
        &ZoneConfig::default(),
    );
    for zone in &resolution.zones {
        assert_ne!(zone.target, page.section);
        assert!(!page.tree.is_ancestor(page.section, zone.target));
    }

    let forged = easel_drag::DropZone {
        id: "container-forged".to_string(),
        zone_type: ZoneType::Container,
        target: page.first_article,
        reference: None,
        bounds: Rect::new(0.0, 150.0, 600.0, 100.0),
        score: 1.0,
        valid: true,
        invalid_reason: None,
    };
    let mut ids = IdGenerator::new("el");
    let result = execute(
        &mut page.tree,
        &filter,
        &mut ids,
        &DropPayload::Move(page.section),
        &forged,
    );
    assert_eq!(result, Err(DropError::InvalidDropTarget(InvalidReason::Cycle)));
}

#[test]
fn test_ranking_is_stable_across_calls() {
    let page = page();
    let filter = ContentFilter::default();
    let config = ZoneConfig::default();

    let first = score_zones(&page.tree, &filter, &query(None, 50.0, 40.0), &config);
    for _ in 0..5 {
        assert_eq!(score_zones(&page.tree, &filter, &query(None, 50.0, 40.0), &config), first);
    }
}

#[test]
fn test_full_gesture_moves_element() {
    let t0 = Instant::now();
    let mut page = page();
    let filter = ContentFilter::default();
    let mut drag = DragController::new(DragConfig::default(), ZoneConfig::default());

    drag.begin(
        &page.tree,
        &filter,
        DragSource::Element(page.second_article),
        Modifiers::NONE,
        Point::new(300.0, 300.0),
        t0,
    )
    .unwrap();
    drag.pointer_move(Point::new(300.0, 200.0), t0 + Duration::from_millis(20));
    drag.on_frame(&page.tree, &filter, t0 + Duration::from_millis(20));

    // drop just above the first article's top edge gap
    let effects = drag.release(
        &page.tree,
        &filter,
        Point::new(300.0, 152.0),
        t0 + Duration::from_millis(40),
    );
    let request = effects
        .iter()
        .find_map(|e| match e {
            DragEffect::Drop(request) => Some(request.clone()),
            _ => None,
        })
        .unwrap();

    let mut ids = IdGenerator::new("el");
    execute(
        &mut page.tree,
        &filter,
        &mut ids,
        &request.source.clone().into(),
        &request.zone,
    )
    .unwrap();
    drag.finish();

    assert_eq!(
        page.tree.children(page.section),
        &[page.second_article, page.first_article]
    );
    assert!(!drag.is_active());
}
