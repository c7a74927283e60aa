mod common;

use common::MemorySource;
use futures::executor::block_on;
use mapview_core::error::SourceError;
use mapview_core::model::{ChildRef, MapDescriptor};
use mapview_core::resolve::all_ids;
use mapview_core::{Catalog, CatalogError, CatalogLoader, ViewerConfig};
use serde_json::json;

fn load(source: &MemorySource) -> Result<Catalog, CatalogError> {
    block_on(CatalogLoader::new(source, &ViewerConfig::default()).load())
}

fn child<'a>(m: &'a MapDescriptor, i: usize) -> &'a MapDescriptor {
    match &m.children[i] {
        ChildRef::Map(c) => c,
        other => panic!("child {i} of {} not resolved: {other:?}", m.id),
    }
}

#[test]
fn string_children_are_fetched_and_failures_degrade() {
    let source = MemorySource::new(json!([
        {"id": "world", "name": "World", "type": "folder",
         "children": ["vale", "lost", "broken", "down", 7, ""]}
    ]))
    .with_map("vale", json!({"name": "Vale", "imageUrl": "vale.png"}))
    .with_raw("broken", Ok("{ not json".into()))
    .with_raw(
        "down",
        Err(SourceError::Status {
            code: 500,
            text: "Server Error".into(),
        }),
    );

    let catalog = load(&source).unwrap();
    let world = &catalog.roots[0];
    assert_eq!(world.children.len(), 6);

    let vale = child(world, 0);
    assert_eq!(vale.id, "vale");
    assert_eq!(vale.name, "Vale");
    assert!(!vale.is_coming_soon());

    for (i, id) in [(1, "lost"), (2, "broken"), (3, "down")] {
        let p = child(world, i);
        assert_eq!(p.id, id);
        assert_eq!(p.name, id);
        assert!(p.is_coming_soon());
        assert!(p.error.is_some());
    }
    assert_eq!(child(world, 1).error.as_deref(), Some("not found"));
    assert_eq!(
        child(world, 3).error.as_deref(),
        Some("fetch failed (500 Server Error)")
    );
    assert!(child(world, 4).is_coming_soon());
    assert!(child(world, 5).is_coming_soon());
    assert_eq!(source.requests_for(""), 0);
}

#[test]
fn depth_limit_stops_fetching() {
    let mut source = MemorySource::new(json!([{"id": "root", "children": ["c1"]}]));
    for i in 1..=7 {
        source = source.with_map(
            &format!("c{i}"),
            json!({"id": format!("c{i}"), "children": [format!("c{}", i + 1)]}),
        );
    }
    let catalog = load(&source).unwrap();

    let mut node = &catalog.roots[0];
    for i in 1..=5 {
        node = child(node, 0);
        assert_eq!(node.id, format!("c{i}"));
        assert!(!node.is_coming_soon());
    }
    let cut = child(node, 0);
    assert_eq!(cut.id, "c6");
    assert_eq!(cut.error.as_deref(), Some("depth limit exceeded"));
    assert_eq!(source.requests_for("c6"), 0);
}

#[test]
fn cycles_become_placeholders() {
    let source = MemorySource::new(json!([{"id": "r", "children": ["x"]}]))
        .with_map("x", json!({"id": "x", "children": ["y"]}))
        .with_map("y", json!({"id": "y", "children": ["x"]}));
    let catalog = load(&source).unwrap();

    let y = child(child(&catalog.roots[0], 0), 0);
    let back = child(y, 0);
    assert_eq!(back.id, "x");
    assert_eq!(back.error.as_deref(), Some("cyclic reference"));
    assert_eq!(source.requests_for("x"), 1);
    assert_eq!(source.requests_for("y"), 1);
}

#[test]
fn shared_children_are_fetched_once() {
    let source = MemorySource::new(json!([
        {"id": "a", "children": ["shared"]},
        {"id": "b", "children": ["shared"]}
    ]))
    .with_map("shared", json!({"name": "Shared"}));
    let catalog = load(&source).unwrap();

    assert_eq!(source.requests_for("shared"), 1);
    assert_eq!(child(&catalog.roots[0], 0).name, "Shared");
    assert_eq!(child(&catalog.roots[1], 0).name, "Shared");
}

#[test]
fn inline_children_are_resolved_too() {
    let source = MemorySource::new(json!([
        {"id": "top", "children": [{"id": "inline", "children": ["leaf"]}]}
    ]))
    .with_map("leaf", json!({"name": "Leaf"}));
    let catalog = load(&source).unwrap();

    let leaf = child(child(&catalog.roots[0], 0), 0);
    assert_eq!(leaf.id, "leaf");
    assert_eq!(all_ids(&catalog.roots), ["top", "inline", "leaf"]);
}

#[test]
fn root_failures_are_fatal() {
    let missing = MemorySource::default();
    assert!(matches!(load(&missing), Err(CatalogError::Index(SourceError::NotFound))));

    let garbage = MemorySource {
        index: Some("[{".into()),
        ..Default::default()
    };
    assert!(matches!(load(&garbage), Err(CatalogError::Parse(_))));
}

#[test]
fn lookups_cover_the_resolved_tree() {
    let source = MemorySource::new(json!([
        {"id": "realm", "status": "coming-soon", "children": ["gone", "hills"]}
    ]))
    .with_map("hills", json!({"name": "Hills"}));
    let catalog = load(&source).unwrap();

    for id in all_ids(&catalog.roots) {
        assert!(catalog.find(id).is_some());
    }
    assert!(catalog.find("elsewhere").is_none());
    assert_eq!(catalog.first_loadable_id(), Some("hills"));
    assert_eq!(catalog.initial_map(Some("gone")).map(|m| m.id.as_str()), Some("hills"));
    assert_eq!(catalog.initial_map(None).map(|m| m.id.as_str()), Some("hills"));
}

#[test]
fn odd_status_type_and_null_names_keep_the_catalog() {
    let source = MemorySource::new(json!([
        {"id": "draft", "name": "Draft", "status": "draft", "imageUrl": "d.png"},
        {"id": "atlas", "name": null, "type": "region-map", "children": ["vale"]}
    ]))
    .with_map(
        "vale",
        json!({"name": "Vale", "imageUrl": "vale.png",
               "pointsOfInterest": [{"name": null, "coords": [1, 1]}]}),
    );

    let catalog = load(&source).unwrap();
    assert_eq!(catalog.roots.len(), 2);
    assert!(!catalog.roots[0].is_coming_soon());
    assert_eq!(catalog.roots[1].name, "");
    let vale = child(&catalog.roots[1], 0);
    assert!(!vale.is_coming_soon());
    assert_eq!(vale.points_of_interest.len(), 1);
}
