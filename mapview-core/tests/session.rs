mod common;

use common::{Kind, RecordingSurface};
use mapview_core::filter::{FilterChange, TriState};
use mapview_core::measure::{Listeners, Phase};
use mapview_core::model::MapDescriptor;
use mapview_core::session::AssetStatus;
use mapview_core::surface::Band;
use mapview_core::{
    ActivateError, Activated, Catalog, Controls, ImageOutcome, LatLng, LoadingPhase, ViewSession,
    ViewerConfig,
};
use serde_json::{Value, json};

fn session(maps: Value) -> ViewSession {
    let roots: Vec<MapDescriptor> = serde_json::from_value(maps).unwrap();
    ViewSession::new(Catalog::new(roots), &ViewerConfig::default())
}

fn atlas() -> Value {
    json!([
        {"id": "a", "name": "A", "imageUrl": "a.png", "width": 100, "height": 100,
         "pointsOfInterest": [
            {"name": "Inside", "type": "Town", "coords": [50, 50]},
            {"name": "Outside", "type": "Town", "coords": [150, 50]}
         ]},
        {"id": "vale", "name": "Vale", "imageUrl": "vale.png", "width": 1000, "height": 800,
         "scalePixels": 10, "scaleKilometers": 1,
         "pointsOfInterest": [
            {"name": "Ashford", "type": "Town", "coords": [100, 100]},
            {"name": "Black Peak", "type": "Peak", "coords": [200, 200]},
            {"name": "Ash Wood", "type": "Forest", "coords": [300, 300]}
         ],
         "regions": [
            {"name": "North", "type": "Kingdom", "value": "Aster",
             "coordinates": [[0, 0], [0, 100], [100, 100]]},
            {"name": "South", "type": "Kingdom", "value": "Briar",
             "coordinates": [[200, 0], [200, 100], [300, 100]]},
            {"name": "Sliver", "value": "Aster", "coordinates": [[0, 0], [1, 1]]}
         ],
         "roads": [
            {"name": "King's Way", "type": "highway", "coordinates": [[0, 0], [500, 500]]},
            {"name": "Trail", "coordinates": [[10, 10], [20, 20]]},
            {"name": "Stub", "coordinates": [[5, 5]]}
         ],
         "filterGroups": {"Regions": {"Kingdoms": ["Aster", "Briar"]}}},
        {"id": "soon", "name": "Soon", "status": "coming-soon"},
        {"id": "bare", "name": "Bare", "width": 10, "height": 10}
    ])
}

fn loaded(s: &mut ViewSession, id: &str, surface: &mut RecordingSurface) -> u64 {
    match s.activate(id, surface) {
        Ok(Activated::Loaded { generation, .. }) => generation,
        other => panic!("activating {id}: {other:?}"),
    }
}

#[test]
fn out_of_bounds_poi_is_skipped() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "a", &mut surface);
    assert_eq!(surface.markers(), 1);
    assert_eq!(s.placed_markers()[0].record, 0);
}

#[test]
fn short_geometry_is_skipped_and_bands_are_ordered() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    assert_eq!(surface.count(|k| *k == Kind::Polygon), 2);
    assert_eq!(surface.count(|k| *k == Kind::Polyline(Band::Roads)), 2);
    assert_eq!(surface.markers(), 3);
    assert!(Band::Regions < Band::Roads && Band::Roads < Band::Overlay);
}

#[test]
fn activating_twice_is_idempotent() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    s.apply_filter(
        &FilterChange::PoiGroup {
            name: "Settlements".into(),
            checked: false,
        },
        &mut surface,
    );
    let layers = surface.layers.len();
    let filters = s.filters().clone();

    assert_eq!(s.activate("vale", &mut surface), Ok(Activated::Unchanged));
    assert_eq!(surface.layers.len(), layers);
    assert_eq!(surface.images_added, 1);
    assert_eq!(s.filters(), &filters);
}

#[test]
fn switching_maps_removes_previous_layers() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    loaded(&mut s, "a", &mut surface);
    assert_eq!(surface.layers.len(), 2);
    assert_eq!(s.filters().master(), TriState::Checked);
}

#[test]
fn invalid_targets_leave_nothing_active() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);

    assert_eq!(
        s.activate("soon", &mut surface),
        Err(ActivateError::ComingSoon("Soon".into()))
    );
    assert!(s.active_map().is_none());
    assert!(surface.layers.is_empty());
    assert_eq!(s.controls(), Controls::default());

    assert_eq!(
        s.activate("bare", &mut surface),
        Err(ActivateError::InvalidDescriptor("bare".into()))
    );
    assert_eq!(
        s.activate("nowhere", &mut surface),
        Err(ActivateError::NotFound("nowhere".into()))
    );
    assert!(s.active_map().is_none());
}

#[test]
fn image_load_settles_once() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    let first = loaded(&mut s, "a", &mut surface);
    let second = loaded(&mut s, "vale", &mut surface);

    assert_eq!(s.finish_loading(first, ImageOutcome::Loaded, &mut surface), None);
    assert_eq!(
        s.finish_loading(second, ImageOutcome::TimedOut, &mut surface),
        Some(LoadingPhase::Done)
    );
    assert_eq!(s.finish_loading(second, ImageOutcome::Failed, &mut surface), None);
    assert_eq!(s.asset_status(), Some(AssetStatus::Ready));
    assert_eq!(surface.fits, 1);
}

#[test]
fn image_failure_disables_controls_until_reload() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    let generation = loaded(&mut s, "vale", &mut surface);
    assert!(s.controls().measure && s.controls().search && s.controls().filters);

    let phase = s.finish_loading(generation, ImageOutcome::Failed, &mut surface);
    assert!(matches!(phase, Some(LoadingPhase::Failed(_))));
    assert_eq!(s.controls(), Controls::default());
    assert_eq!(surface.count(|k| *k == Kind::Image), 0);
    assert_eq!(s.active_id(), None);

    loaded(&mut s, "vale", &mut surface);
    assert!(s.controls().measure);
    assert_eq!(surface.count(|k| *k == Kind::Image), 1);
}

#[test]
fn master_toggle_hides_everything_at_once() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    assert_eq!(s.filters().master(), TriState::Checked);

    s.apply_filter(&FilterChange::All(false), &mut surface);
    assert_eq!(s.filters().master(), TriState::Unchecked);
    let placed = s
        .placed_markers()
        .iter()
        .chain(s.placed_regions())
        .chain(s.placed_roads());
    for p in placed {
        assert!(!surface.shown(p.layer));
    }

    s.apply_filter(&FilterChange::All(true), &mut surface);
    assert!(s.placed_roads().iter().all(|p| surface.shown(p.layer)));
    assert_eq!(surface.shape(s.placed_roads()[0].layer).opacity, 0.8);
}

#[test]
fn visibility_follows_each_domain() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);

    s.apply_filter(
        &FilterChange::RegionValue {
            group: "Kingdoms".into(),
            value: "Briar".into(),
            checked: false,
        },
        &mut surface,
    );
    assert_eq!(s.filters().master(), TriState::Indeterminate);
    let regions = s.placed_regions().to_vec();
    assert!(surface.shown(regions[0].layer));
    assert!(!surface.shown(regions[1].layer));
    assert!(s.placed_markers().iter().all(|p| surface.shown(p.layer)));

    s.apply_filter(
        &FilterChange::RoadType {
            name: "Unnamed Road Type".into(),
            checked: false,
        },
        &mut surface,
    );
    let roads = s.placed_roads().to_vec();
    assert!(surface.shown(roads[0].layer));
    assert_eq!(surface.shape(roads[1].layer).opacity, 0.0);

    s.toggle_markers(&mut surface);
    assert!(s.placed_markers().iter().all(|p| !surface.shown(p.layer)));
    assert!(!surface.shown(regions[0].layer));
    assert!(surface.shown(roads[0].layer));
}

#[test]
fn search_filters_markers_and_lists_hits() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);

    let hits = s.set_search("ASH", &mut surface);
    let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Ashford", "Ash Wood"]);
    assert_eq!(hits[0].html, "<strong>Ash</strong>ford");
    let markers = s.placed_markers().to_vec();
    assert!(!surface.shown(markers[1].layer));

    assert!(s.focus_hit(hits[1].record, &mut surface));
    assert_eq!(surface.focused, [markers[2].layer]);
    assert_eq!(s.search_text(), "");
    assert!(markers.iter().all(|p| surface.shown(p.layer)));
    assert!(s.set_search("  ", &mut surface).is_empty());
}

#[test]
fn search_lists_names_hidden_by_filters() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    let markers = s.placed_markers().to_vec();

    s.toggle_markers(&mut surface);
    let hits = s.set_search("ash", &mut surface);
    let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Ashford", "Ash Wood"]);
    assert!(markers.iter().all(|p| !surface.shown(p.layer)));

    assert!(s.focus_hit(hits[0].record, &mut surface));
    assert_eq!(surface.focused, [markers[0].layer]);
    assert!(surface.shown(markers[0].layer));
    assert!(!surface.shown(markers[2].layer));

    s.toggle_markers(&mut surface);
    s.apply_filter(
        &FilterChange::PoiGroup {
            name: "Settlements".into(),
            checked: false,
        },
        &mut surface,
    );
    let hits = s.set_search("ASHF", &mut surface);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Ashford");
    assert!(!surface.shown(markers[0].layer));
}

#[test]
fn measured_total_matches_scale() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);

    let (p1, p2, p3) = (
        LatLng::new(0.0, 0.0),
        LatLng::new(30.0, 40.0),
        LatLng::new(30.0, 140.0),
    );
    assert_eq!(s.toggle_measure(&mut surface), Listeners::Attach);
    for p in [p1, p2, p3] {
        s.measure_click(p, &mut surface);
    }
    assert!((s.measure().total() - 15.0).abs() < 1e-9);
    assert!(s.measure().total_text().starts_with("Total ≈ 15.00 km"));

    let by_segments: f64 = [(p1, p2), (p2, p3)]
        .iter()
        .map(|(a, b)| mapview_core::measure::pixel_distance(*a, *b) / 10.0)
        .sum();
    assert!((s.measure().total() - by_segments).abs() < 1e-9);
}

#[test]
fn escape_after_two_clicks_discards_everything() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    let baseline = surface.layers.len();

    s.toggle_measure(&mut surface);
    s.measure_click(LatLng::new(10.0, 10.0), &mut surface);
    s.measure_move(LatLng::new(15.0, 15.0), &mut surface);
    s.measure_click(LatLng::new(20.0, 20.0), &mut surface);
    assert!(s.measure().layer_count() > 0);

    assert_eq!(s.cancel_measure(&mut surface), Listeners::Detach);
    assert_eq!(s.measure().phase(), Phase::Cancelled);
    assert_eq!(s.measure().layer_count(), 0);
    assert_eq!(s.measure().total(), 0.0);
    assert_eq!(surface.layers.len(), baseline);
}

#[test]
fn finishing_keeps_only_the_labelled_path() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);
    let baseline = surface.layers.len();

    s.toggle_measure(&mut surface);
    s.measure_click(LatLng::new(0.0, 0.0), &mut surface);
    s.measure_click(LatLng::new(0.0, 100.0), &mut surface);
    s.measure_move(LatLng::new(50.0, 100.0), &mut surface);
    assert_eq!(s.finish_measure(&mut surface), Listeners::Detach);

    assert_eq!(s.measure().phase(), Phase::Finalized);
    assert_eq!(surface.layers.len(), baseline + 1);
    let kept = surface
        .layers
        .values()
        .find(|l| l.kind == Kind::Polyline(Band::Overlay))
        .unwrap();
    assert!(kept.label.as_deref().is_some_and(|l| l.starts_with("Total ≈ 10.00 km")));

    // A fresh start wipes the finalized path.
    assert_eq!(s.toggle_measure(&mut surface), Listeners::Attach);
    assert_eq!(surface.layers.len(), baseline);
}

#[test]
fn one_point_finish_cancels() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);

    s.toggle_measure(&mut surface);
    s.measure_click(LatLng::new(1.0, 1.0), &mut surface);
    assert_eq!(s.finish_measure(&mut surface), Listeners::Detach);
    assert_eq!(s.measure().phase(), Phase::Cancelled);
    assert_eq!(s.measure().layer_count(), 0);
}

#[test]
fn listener_requests_stay_balanced() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "vale", &mut surface);

    let mut attached = 0i32;
    let mut track = |l: Listeners| match l {
        Listeners::Attach => attached += 1,
        Listeners::Detach => attached -= 1,
        Listeners::Keep => {}
    };
    for round in 0..5 {
        track(s.toggle_measure(&mut surface));
        s.measure_click(LatLng::new(1.0, 1.0), &mut surface);
        s.measure_click(LatLng::new(2.0, 2.0), &mut surface);
        match round % 3 {
            0 => track(s.finish_measure(&mut surface)),
            1 => track(s.cancel_measure(&mut surface)),
            _ => track(s.toggle_measure(&mut surface)),
        }
        track(s.cancel_measure(&mut surface));
        track(s.finish_measure(&mut surface));
    }
    assert_eq!(attached, 0);
}

#[test]
fn measuring_needs_a_scale() {
    let mut s = session(atlas());
    let mut surface = RecordingSurface::default();
    loaded(&mut s, "a", &mut surface);
    assert!(!s.controls().measure);
    assert_eq!(s.toggle_measure(&mut surface), Listeners::Keep);
}
