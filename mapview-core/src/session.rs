//! The view session: everything that belongs to the map currently on screen.
//!
//! A session owns the catalog, the active map's overlay handles, the filter
//! tree, search text and the measurement tool. Every operation takes the
//! [`MapSurface`] it draws on, so the same logic runs against Leaflet in the
//! browser and against a recording fake in tests.

use crate::catalog::Catalog;
use crate::config::ViewerConfig;
use crate::constants::{REGION_FILL_OPACITY, ROAD_OPACITY};
use crate::coords::CoordReadout;
use crate::error::ActivateError;
use crate::filter::{FilterChange, FilterTree, Folded, Recompute, Visibility};
use crate::measure::{Listeners, MeasureTool};
use crate::model::{LatLng, MapDescriptor};
use crate::nav::SidebarState;
use crate::popup::popup_html;
use crate::surface::{AreaStyle, Band, LayerId, LineStyle, MapSurface};

/// An overlay on the surface and the index of the record it was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placed {
    pub layer: LayerId,
    pub record: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    Loading,
    Ready,
    Failed,
}

/// How the background image preload ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageOutcome {
    Loaded,
    Failed,
    TimedOut,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Activated {
    /// The map was already on screen.
    Unchanged,
    /// Overlays are in place; the image at `url` is still loading. Report the
    /// result through [`ViewSession::finish_loading`] with `generation`.
    Loaded { generation: u64, url: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadingPhase {
    Loading,
    Done,
    Failed(String),
}

/// Which map-dependent controls may be shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub search: bool,
    pub filters: bool,
    pub markers_toggle: bool,
    pub measure: bool,
    pub blurb: bool,
    pub coords: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub record: usize,
    pub name: String,
    /// Escaped name with the match wrapped in `<strong>`.
    pub html: String,
}

#[derive(Debug)]
struct ActiveMap {
    map: MapDescriptor,
    height: f64,
    width: f64,
    image: Option<LayerId>,
    markers: Vec<Placed>,
    regions: Vec<Placed>,
    roads: Vec<Placed>,
    asset: AssetStatus,
}

pub struct ViewSession {
    catalog: Catalog,
    active: Option<ActiveMap>,
    filters: FilterTree,
    markers_visible: bool,
    search: String,
    sidebar: SidebarState,
    measure: MeasureTool,
    coords: CoordReadout,
    generation: u64,
}

impl ViewSession {
    pub fn new(catalog: Catalog, config: &ViewerConfig) -> Self {
        ViewSession {
            catalog,
            active: None,
            filters: FilterTree::default(),
            markers_visible: true,
            search: String::new(),
            sidebar: SidebarState::Open,
            measure: MeasureTool::new(config.path_paces.clone(), config.segment_paces.clone()),
            coords: CoordReadout::default(),
            generation: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn active_map(&self) -> Option<&MapDescriptor> {
        self.active.as_ref().map(|a| &a.map)
    }

    /// Id of the map on screen. A map whose image failed no longer counts.
    pub fn active_id(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|a| a.asset != AssetStatus::Failed)
            .map(|a| a.map.id.as_str())
    }

    pub fn asset_status(&self) -> Option<AssetStatus> {
        self.active.as_ref().map(|a| a.asset)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filters(&self) -> &FilterTree {
        &self.filters
    }

    pub fn markers_visible(&self) -> bool {
        self.markers_visible
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn sidebar(&self) -> SidebarState {
        self.sidebar
    }

    pub fn set_sidebar(&mut self, state: SidebarState) {
        self.sidebar = state;
    }

    pub fn measure(&self) -> &MeasureTool {
        &self.measure
    }

    pub fn coords_mut(&mut self) -> &mut CoordReadout {
        &mut self.coords
    }

    pub fn placed_markers(&self) -> &[Placed] {
        self.active
            .as_ref()
            .map(|a| a.markers.as_slice())
            .unwrap_or_default()
    }

    pub fn placed_regions(&self) -> &[Placed] {
        self.active
            .as_ref()
            .map(|a| a.regions.as_slice())
            .unwrap_or_default()
    }

    pub fn placed_roads(&self) -> &[Placed] {
        self.active
            .as_ref()
            .map(|a| a.roads.as_slice())
            .unwrap_or_default()
    }

    pub fn blurb(&self) -> Option<&str> {
        self.active_map()
            .and_then(|m| m.blurb.as_deref())
            .filter(|b| !b.trim().is_empty())
    }

    fn visibility(&self) -> Visibility<'_> {
        Visibility {
            filters: &self.filters,
            markers_visible: self.markers_visible,
            search: &self.search,
        }
    }

    /// Remove every layer of the active map and forget it.
    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        let listeners = self.measure.reset(surface, None);
        if let Some(active) = self.active.take() {
            let layers = active
                .image
                .into_iter()
                .chain(active.markers.iter().map(|p| p.layer))
                .chain(active.regions.iter().map(|p| p.layer))
                .chain(active.roads.iter().map(|p| p.layer));
            for layer in layers {
                surface.remove(layer);
            }
            log::debug!("Cleared map {}", active.map.id);
        }
        self.filters = FilterTree::default();
        self.search.clear();
        self.coords.set_frame(None, None);
        listeners
    }

    /// Make `id` the active map.
    ///
    /// Activating the map that is already on screen does nothing. Any other
    /// call clears the previous map first, so a failed activation leaves no map
    /// active. Callers should cancel an in-progress measurement beforehand so
    /// its listeners are released.
    pub fn activate<S: MapSurface + ?Sized>(
        &mut self,
        id: &str,
        surface: &mut S,
    ) -> Result<Activated, ActivateError> {
        if self.active_id() == Some(id) {
            return Ok(Activated::Unchanged);
        }
        self.clear(surface);

        let map = self
            .catalog
            .find(id)
            .cloned()
            .ok_or_else(|| ActivateError::NotFound(id.to_string()))?;
        if map.is_coming_soon() {
            log::warn!("Attempted to load map that is coming soon: {id}");
            let name = if map.name.is_empty() { "this map" } else { map.name.as_str() };
            return Err(ActivateError::ComingSoon(name.to_string()));
        }
        let url = map.image_url.clone().filter(|u| !u.is_empty());
        let (Some(url), Some((height, width))) = (url, map.dimensions()) else {
            log::error!("Invalid dimensions or missing imageUrl for map ID {id}");
            return Err(ActivateError::InvalidDescriptor(id.to_string()));
        };

        let image = surface.add_image(&url, height, width);
        let regions = place_regions(&map, surface);
        let roads = place_roads(&map, surface);
        let markers = place_markers(&map, height, width, surface);
        log::info!(
            "Loaded map {id}: {} markers, {} regions, {} roads",
            markers.len(),
            regions.len(),
            roads.len()
        );

        self.filters = FilterTree::from_map(&map);
        self.measure.reset(surface, map.scale());
        self.coords.set_frame(map.lat_lon_bounds, Some((height, width)));
        self.generation += 1;
        self.active = Some(ActiveMap {
            map,
            height,
            width,
            image: Some(image),
            markers,
            regions,
            roads,
            asset: AssetStatus::Loading,
        });
        self.refresh(Recompute::ALL, surface);
        Ok(Activated::Loaded {
            generation: self.generation,
            url,
        })
    }

    /// Settle the image load of `generation`. Only the first report counts;
    /// later or stale ones return `None`.
    pub fn finish_loading<S: MapSurface + ?Sized>(
        &mut self,
        generation: u64,
        outcome: ImageOutcome,
        surface: &mut S,
    ) -> Option<LoadingPhase> {
        if generation != self.generation {
            return None;
        }
        let active = self.active.as_mut()?;
        if active.asset != AssetStatus::Loading {
            return None;
        }
        surface.fit_bounds(active.height, active.width);
        match outcome {
            ImageOutcome::Loaded | ImageOutcome::TimedOut => {
                if outcome == ImageOutcome::TimedOut {
                    log::warn!("Loading fallback timer triggered for {}", active.map.id);
                }
                active.asset = AssetStatus::Ready;
                Some(LoadingPhase::Done)
            }
            ImageOutcome::Failed => {
                log::error!(
                    "Image overlay failed to load: {}",
                    active.map.image_url.as_deref().unwrap_or_default()
                );
                if let Some(image) = active.image.take() {
                    surface.remove(image);
                }
                active.asset = AssetStatus::Failed;
                Some(LoadingPhase::Failed("Error loading map image.".to_string()))
            }
        }
    }

    pub fn controls(&self) -> Controls {
        let Some(active) = self.active.as_ref().filter(|a| a.asset != AssetStatus::Failed) else {
            return Controls::default();
        };
        let map = &active.map;
        Controls {
            search: !active.markers.is_empty(),
            filters: !self.filters.is_empty(),
            markers_toggle: !map.points_of_interest.is_empty() || !map.regions.is_empty(),
            measure: map.scale().is_some(),
            blurb: self.blurb().is_some(),
            coords: map.lat_lon_bounds.is_some(),
        }
    }

    /// Apply a checkbox change and refresh only the affected overlays.
    pub fn apply_filter<S: MapSurface + ?Sized>(
        &mut self,
        change: &FilterChange,
        surface: &mut S,
    ) -> Recompute {
        let recompute = self.filters.apply(change);
        self.refresh(recompute, surface);
        recompute
    }

    /// Flip the "show markers" flag. Regions follow it; roads do not.
    pub fn toggle_markers<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        self.markers_visible = !self.markers_visible;
        self.refresh(
            Recompute {
                pois: true,
                regions: true,
                roads: false,
            },
            surface,
        );
        self.markers_visible
    }

    /// Update the search text and return the matching markers.
    pub fn set_search<S: MapSurface + ?Sized>(
        &mut self,
        text: &str,
        surface: &mut S,
    ) -> Vec<SearchHit> {
        self.search = text.to_string();
        self.refresh(
            Recompute {
                pois: true,
                ..Default::default()
            },
            surface,
        );
        self.search_hits()
    }

    pub fn search_hits(&self) -> Vec<SearchHit> {
        let (Some(active), needle) = (&self.active, self.search.trim()) else {
            return Vec::new();
        };
        if needle.is_empty() {
            return Vec::new();
        }
        let vis = self.visibility();
        active
            .markers
            .iter()
            .filter_map(|p| {
                let poi = active.map.points_of_interest.get(p.record)?;
                vis.name_matches(&poi.name).then(|| SearchHit {
                    record: p.record,
                    name: poi.name.clone(),
                    html: highlight(&poi.name, needle),
                })
            })
            .collect()
    }

    /// Centre on the marker of POI `record`, open its popup and clear the
    /// search. A marker hidden by the filters is shown for the visit.
    pub fn focus_hit<S: MapSurface + ?Sized>(&mut self, record: usize, surface: &mut S) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        let target = active.markers.iter().find(|p| p.record == record).and_then(|p| {
            let at = active.map.points_of_interest.get(record)?.coords?;
            Some((p.layer, at))
        });
        let Some((layer, at)) = target else {
            return false;
        };
        self.set_search("", surface);
        surface.set_marker_visible(layer, true);
        surface.focus(layer, at);
        true
    }

    pub fn toggle_measure<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        if !self.measure.is_active() && !self.controls().measure {
            return Listeners::Keep;
        }
        self.measure.toggle(surface)
    }

    pub fn measure_click<S: MapSurface + ?Sized>(&mut self, at: LatLng, surface: &mut S) {
        self.measure.click(surface, at);
    }

    pub fn measure_move<S: MapSurface + ?Sized>(&mut self, at: LatLng, surface: &mut S) {
        self.measure.pointer_move(surface, at);
    }

    pub fn finish_measure<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        self.measure.finish(surface)
    }

    pub fn cancel_measure<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        self.measure.cancel(surface)
    }

    fn refresh<S: MapSurface + ?Sized>(&self, what: Recompute, surface: &mut S) {
        let Some(active) = &self.active else {
            return;
        };
        let vis = self.visibility();
        let map = &active.map;
        if what.pois {
            for p in &active.markers {
                if let Some(poi) = map.points_of_interest.get(p.record) {
                    surface.set_marker_visible(p.layer, vis.poi(poi));
                }
            }
        }
        if what.regions {
            for p in &active.regions {
                if let Some(r) = map.regions.get(p.record) {
                    let fill = r.fill_opacity.unwrap_or(REGION_FILL_OPACITY);
                    surface.set_area_visible(p.layer, vis.region(r), fill);
                }
            }
        }
        if what.roads {
            for p in &active.roads {
                if let Some(r) = map.roads.get(p.record) {
                    let opacity = if vis.road(r) { r.opacity.unwrap_or(ROAD_OPACITY) } else { 0.0 };
                    surface.set_line_opacity(p.layer, opacity);
                }
            }
        }
    }
}

fn place_regions<S: MapSurface + ?Sized>(map: &MapDescriptor, surface: &mut S) -> Vec<Placed> {
    let mut placed = Vec::new();
    for (i, r) in map.regions.iter().enumerate() {
        if r.coordinates.len() < 3 || !r.coordinates.iter().all(LatLng::is_finite) {
            log::warn!("Skipping region {:?}: needs at least 3 valid points", r.name);
            continue;
        }
        let layer = surface.add_polygon(&r.coordinates, &AreaStyle::region(r), &popup_html(&r.into()));
        placed.push(Placed { layer, record: i });
    }
    placed
}

fn place_roads<S: MapSurface + ?Sized>(map: &MapDescriptor, surface: &mut S) -> Vec<Placed> {
    let mut placed = Vec::new();
    for (i, r) in map.roads.iter().enumerate() {
        if r.coordinates.len() < 2 || !r.coordinates.iter().all(LatLng::is_finite) {
            log::warn!("Skipping road {:?}: needs at least 2 valid points", r.name);
            continue;
        }
        let popup = popup_html(&r.into());
        let layer = surface.add_polyline(&r.coordinates, &LineStyle::road(r), Band::Roads, Some(&popup));
        placed.push(Placed { layer, record: i });
    }
    placed
}

fn place_markers<S: MapSurface + ?Sized>(
    map: &MapDescriptor,
    height: f64,
    width: f64,
    surface: &mut S,
) -> Vec<Placed> {
    let mut placed = Vec::new();
    for (i, poi) in map.points_of_interest.iter().enumerate() {
        let Some(at) = poi.coords.filter(LatLng::is_finite) else {
            log::warn!("Skipping POI {:?}: invalid coordinates", poi.name);
            continue;
        };
        if !(0.0..=height).contains(&at.lat) || !(0.0..=width).contains(&at.lng) {
            log::warn!(
                "Skipping POI {:?}: [{}, {}] outside {height}x{width}",
                poi.name,
                at.lat,
                at.lng
            );
            continue;
        }
        let layer = surface.add_marker(at, &popup_html(&poi.into()), poi.icon.as_deref());
        placed.push(Placed { layer, record: i });
    }
    placed
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `name` escaped, with the first case-insensitive match of `needle` bolded.
fn highlight(name: &str, needle: &str) -> String {
    let hay = Folded::new(name);
    let pat = needle.to_lowercase();
    let found = (!pat.is_empty())
        .then(|| hay.text.find(&pat))
        .flatten()
        .and_then(|at| hay.source_range(name, at..at + pat.len()));
    let Some(range) = found else {
        return escape_html(name);
    };
    format!(
        "{}<strong>{}</strong>{}",
        escape_html(&name[..range.start]),
        escape_html(&name[range.clone()]),
        escape_html(&name[range.end..])
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_marks_first_match() {
        assert_eq!(highlight("Black Peak", "peak"), "Black <strong>Peak</strong>");
        assert_eq!(highlight("A<b>", "<B"), "A<strong>&lt;b</strong>&gt;");
        assert_eq!(highlight("Well", "x"), "Well");
    }

    #[test]
    fn highlight_maps_expanded_lowercase_back_to_the_name() {
        // 'İ' lowercases to two chars.
        assert_eq!(highlight("İzmir", "i\u{307}z"), "<strong>İz</strong>mir");
        assert_eq!(highlight("İzmir", "i"), "<strong>İ</strong>zmir");
        assert_eq!(highlight("Old İzmir", "mir"), "Old İz<strong>mir</strong>");
    }
}
