//! Serializer properties: idempotence and rebuild round-trips

use easel_tree::{
    rebuild_into, ContentFilter, ElementData, IdGenerator, Serializer, Snapshot, VisualTree,
};

fn build_page() -> VisualTree {
    let mut tree = VisualTree::with_root(ElementData::new("main").with_id("canvas"));
    let root = tree.root();

    let header = tree.create_element_with(
        ElementData::new("header")
            .with_class("site-header")
            .with_style("display", "flex"),
    );
    let logo = tree.create_element_with(ElementData::new("img").with_attr("src", "/logo.png"));
    let title = tree.create_element("h1");
    let title_text = tree.create_text("Welcome");
    let style = tree.create_element("style");
    let css = tree.create_text(".x { color: red }");

    tree.append_child(root, header).unwrap();
    tree.append_child(header, logo).unwrap();
    tree.append_child(header, title).unwrap();
    tree.append_child(title, title_text).unwrap();
    tree.append_child(root, style).unwrap();
    tree.append_child(style, css).unwrap();
    tree.discard_mutations();
    tree
}

fn serializer() -> Serializer {
    Serializer::new(ContentFilter::default(), IdGenerator::from_parts("el", "c0ffee"))
}

#[test]
fn test_serialize_twice_is_identical() {
    let mut tree = build_page();
    let root = tree.root();
    let mut serializer = serializer();

    let first = serializer.serialize(&mut tree, root).unwrap();
    let assigned = serializer.ids_mut().count();
    let second = serializer.serialize(&mut tree, root).unwrap();

    assert_eq!(first, second);
    assert_eq!(serializer.ids_mut().count(), assigned, "no new ids on re-serialize");
    assert!(!tree.has_pending_mutations(), "id write-back is not a content mutation");
}

#[test]
fn test_rebuild_then_reserialize_round_trips() {
    let mut tree = build_page();
    let root = tree.root();
    let mut serializer = serializer();
    let snapshot = serializer.serialize(&mut tree, root).unwrap();

    let mut fresh = VisualTree::new("main");
    let fresh_root = fresh.root();
    rebuild_into(&mut fresh, fresh_root, &snapshot).unwrap();

    let reserialized = serializer.serialize(&mut fresh, fresh_root).unwrap();
    assert_eq!(reserialized, snapshot);
}

#[test]
fn test_snapshot_excludes_style_nodes() {
    let mut tree = build_page();
    let root = tree.root();
    let snapshot = serializer().serialize(&mut tree, root).unwrap();

    let json = snapshot.to_json().unwrap();
    assert!(!json.contains("color: red"));
    assert_eq!(snapshot.as_element().unwrap().children.len(), 1);
    assert_eq!(snapshot.as_element().unwrap().id, "canvas");
}

#[test]
fn test_json_round_trip_preserves_structure() {
    let mut tree = build_page();
    let root = tree.root();
    let snapshot = serializer().serialize(&mut tree, root).unwrap();

    let parsed = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(parsed, snapshot);
}
