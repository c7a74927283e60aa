#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use mapview_core::error::SourceError;
use mapview_core::surface::{AreaStyle, Band, LineStyle, TipPlacement};
use mapview_core::{LatLng, LayerId, MapSource, MapSurface};

#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    Image,
    Marker,
    Polygon,
    Polyline(Band),
    Vertex,
    Tooltip(TipPlacement),
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub kind: Kind,
    pub points: Vec<LatLng>,
    pub html: String,
    pub label: Option<String>,
    pub visible: bool,
    pub opacity: f64,
}

/// Keeps every live layer so tests can inspect what is on screen.
#[derive(Default)]
pub struct RecordingSurface {
    next: u32,
    pub layers: BTreeMap<LayerId, Shape>,
    pub images_added: usize,
    pub fits: usize,
    pub focused: Vec<LayerId>,
}

impl RecordingSurface {
    fn push(&mut self, kind: Kind, points: Vec<LatLng>, html: &str) -> LayerId {
        self.next += 1;
        let id = LayerId(self.next);
        self.layers.insert(
            id,
            Shape {
                kind,
                points,
                html: html.to_string(),
                label: None,
                visible: true,
                opacity: 1.0,
            },
        );
        id
    }

    pub fn count(&self, f: impl Fn(&Kind) -> bool) -> usize {
        self.layers.values().filter(|s| f(&s.kind)).count()
    }

    pub fn markers(&self) -> usize {
        self.count(|k| *k == Kind::Marker)
    }

    pub fn shown(&self, id: LayerId) -> bool {
        self.layers.get(&id).is_some_and(|s| s.visible && s.opacity > 0.0)
    }

    pub fn shape(&self, id: LayerId) -> &Shape {
        &self.layers[&id]
    }
}

impl MapSurface for RecordingSurface {
    fn add_image(&mut self, url: &str, _height: f64, _width: f64) -> LayerId {
        self.images_added += 1;
        self.push(Kind::Image, Vec::new(), url)
    }

    fn add_marker(&mut self, at: LatLng, popup: &str, _icon: Option<&str>) -> LayerId {
        self.push(Kind::Marker, vec![at], popup)
    }

    fn add_polygon(&mut self, points: &[LatLng], _style: &AreaStyle, popup: &str) -> LayerId {
        self.push(Kind::Polygon, points.to_vec(), popup)
    }

    fn add_polyline(
        &mut self,
        points: &[LatLng],
        style: &LineStyle,
        band: Band,
        popup: Option<&str>,
    ) -> LayerId {
        let id = self.push(Kind::Polyline(band), points.to_vec(), popup.unwrap_or_default());
        if let Some(s) = self.layers.get_mut(&id) {
            s.opacity = style.opacity;
        }
        id
    }

    fn add_vertex(&mut self, at: LatLng) -> LayerId {
        self.push(Kind::Vertex, vec![at], "")
    }

    fn add_tooltip(&mut self, at: LatLng, html: &str, placement: TipPlacement) -> LayerId {
        self.push(Kind::Tooltip(placement), vec![at], html)
    }

    fn set_path(&mut self, layer: LayerId, points: &[LatLng]) {
        if let Some(s) = self.layers.get_mut(&layer) {
            s.points = points.to_vec();
        }
    }

    fn bind_label(&mut self, layer: LayerId, html: &str) {
        if let Some(s) = self.layers.get_mut(&layer) {
            s.label = Some(html.to_string());
        }
    }

    fn set_marker_visible(&mut self, layer: LayerId, visible: bool) {
        if let Some(s) = self.layers.get_mut(&layer) {
            s.visible = visible;
        }
    }

    fn set_area_visible(&mut self, layer: LayerId, visible: bool, _fill_opacity: f64) {
        if let Some(s) = self.layers.get_mut(&layer) {
            s.visible = visible;
        }
    }

    fn set_line_opacity(&mut self, layer: LayerId, opacity: f64) {
        if let Some(s) = self.layers.get_mut(&layer) {
            s.opacity = opacity;
        }
    }

    fn remove(&mut self, layer: LayerId) {
        self.layers.remove(&layer);
    }

    fn fit_bounds(&mut self, _height: f64, _width: f64) {
        self.fits += 1;
    }

    fn focus(&mut self, layer: LayerId, _at: LatLng) {
        self.focused.push(layer);
    }
}

/// Serves catalog files from memory and counts requests per id.
#[derive(Default)]
pub struct MemorySource {
    pub index: Option<String>,
    pub maps: HashMap<String, Result<String, SourceError>>,
    pub requests: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new(index: serde_json::Value) -> Self {
        MemorySource {
            index: Some(index.to_string()),
            ..Default::default()
        }
    }

    pub fn with_map(mut self, id: &str, body: serde_json::Value) -> Self {
        self.maps.insert(id.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_raw(mut self, id: &str, body: Result<String, SourceError>) -> Self {
        self.maps.insert(id.to_string(), body);
        self
    }

    pub fn requests_for(&self, id: &str) -> usize {
        self.requests.borrow().iter().filter(|r| *r == id).count()
    }
}

impl MapSource for MemorySource {
    async fn fetch_index(&self) -> Result<String, SourceError> {
        self.index.clone().ok_or(SourceError::NotFound)
    }

    async fn fetch_map(&self, id: &str) -> Result<String, SourceError> {
        self.requests.borrow_mut().push(id.to_string());
        self.maps.get(id).cloned().unwrap_or(Err(SourceError::NotFound))
    }
}

impl MapSource for &MemorySource {
    async fn fetch_index(&self) -> Result<String, SourceError> {
        <MemorySource as MapSource>::fetch_index(self).await
    }

    async fn fetch_map(&self, id: &str) -> Result<String, SourceError> {
        <MemorySource as MapSource>::fetch_map(self, id).await
    }
}
