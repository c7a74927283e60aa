//! Leaflet bindings and the [`MapSurface`] implementation built on them.
//!
//! Only the handful of `L.*` calls the viewer makes are bound. Option objects
//! are written as `serde_json` values and handed to Leaflet through
//! `JSON.parse`.

use std::collections::HashMap;

use js_sys::Function;
use mapview_core::constants::POPUP_MIN_WIDTH;
use mapview_core::surface::{AreaStyle, Band, LineStyle, TipPlacement};
use mapview_core::{LatLng, LayerId, MapSurface};
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;

use crate::utils::asset_url;

const IMAGE_PANE: &str = "imagePane";
const REGIONS_PANE: &str = "regionsPane";
const ROADS_PANE: &str = "roadsPane";

/// Custom panes, bottom to top. All sit under Leaflet's marker (600),
/// tooltip and popup panes.
const PANES: [(&str, &str); 3] = [
    (IMAGE_PANE, "300"),
    (REGIONS_PANE, "350"),
    (ROADS_PANE, "360"),
];

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    pub type Map;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    fn new_map(id: &str, options: &JsValue) -> Map;
    #[wasm_bindgen(method, js_name = createPane)]
    fn create_pane(this: &Map, name: &str) -> web_sys::HtmlElement;
    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &Map, bounds: &JsValue);
    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &Map, layer: &Layer);
    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &Map, at: &JsValue, zoom: f64);
    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &Map) -> f64;
    #[wasm_bindgen(method, js_name = zoomIn)]
    pub fn zoom_in(this: &Map);
    #[wasm_bindgen(method, js_name = zoomOut)]
    pub fn zoom_out(this: &Map);
    #[wasm_bindgen(method, js_name = closePopup)]
    pub fn close_popup(this: &Map);
    #[wasm_bindgen(method, js_name = invalidateSize)]
    pub fn invalidate_size(this: &Map);
    #[wasm_bindgen(method)]
    pub fn on(this: &Map, event: &str, f: &Function);
    #[wasm_bindgen(method)]
    pub fn off(this: &Map, event: &str, f: &Function);

    #[derive(Clone)]
    pub type Layer;

    #[wasm_bindgen(js_namespace = L, js_name = imageOverlay)]
    fn image_overlay(url: &str, bounds: &JsValue, options: &JsValue) -> Layer;
    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(at: &JsValue, options: &JsValue) -> Layer;
    #[wasm_bindgen(js_namespace = L, js_name = icon)]
    fn icon(options: &JsValue) -> JsValue;
    #[wasm_bindgen(js_namespace = L, js_name = polygon)]
    fn polygon(points: &JsValue, options: &JsValue) -> Layer;
    #[wasm_bindgen(js_namespace = L, js_name = polyline)]
    fn polyline(points: &JsValue, options: &JsValue) -> Layer;
    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(at: &JsValue, options: &JsValue) -> Layer;
    #[wasm_bindgen(js_namespace = L, js_name = tooltip)]
    fn tooltip(options: &JsValue) -> Layer;
    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &Map) -> Layer;
    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str, options: &JsValue) -> Layer;
    #[wasm_bindgen(method, js_name = bindTooltip)]
    fn bind_tooltip(this: &Layer, html: &str, options: &JsValue) -> Layer;
    #[wasm_bindgen(method, js_name = openTooltip)]
    fn open_tooltip(this: &Layer);
    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &Layer);
    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &Layer, style: &JsValue);
    #[wasm_bindgen(method, js_name = setLatLngs)]
    fn set_lat_lngs(this: &Layer, points: &JsValue);
    #[wasm_bindgen(method, js_name = setLatLng)]
    fn set_lat_lng(this: &Layer, at: &JsValue) -> Layer;
    #[wasm_bindgen(method, js_name = setContent)]
    fn set_content(this: &Layer, html: &str) -> Layer;
    #[wasm_bindgen(method, js_name = on)]
    pub fn on_layer(this: &Layer, event: &str, f: &Function);
    #[wasm_bindgen(method, js_name = off)]
    pub fn off_layer(this: &Layer, event: &str, f: &Function);

    /// Payload of Leaflet mouse events.
    pub type MouseEvent;

    #[wasm_bindgen(method, getter)]
    fn latlng(this: &MouseEvent) -> JsLatLng;

    type JsLatLng;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &JsLatLng) -> f64;
    #[wasm_bindgen(method, getter)]
    fn lng(this: &JsLatLng) -> f64;
}

impl MouseEvent {
    pub fn position(&self) -> LatLng {
        let at = self.latlng();
        LatLng::new(at.lat(), at.lng())
    }
}

fn js(v: Value) -> JsValue {
    js_sys::JSON::parse(&v.to_string()).unwrap_or(JsValue::UNDEFINED)
}

fn point(at: LatLng) -> Value {
    json!([at.lat, at.lng])
}

fn points(pts: &[LatLng]) -> Value {
    Value::Array(pts.iter().copied().map(point).collect())
}

fn frame(height: f64, width: f64) -> JsValue {
    js(json!([[0.0, 0.0], [height, width]]))
}

fn popup_options() -> JsValue {
    js(json!({ "minWidth": POPUP_MIN_WIDTH }))
}

fn line_options(style: &LineStyle, band: Band) -> Value {
    let mut opts = json!({
        "color": style.color,
        "weight": style.weight,
        "opacity": style.opacity,
    });
    if let Some(dash) = &style.dash_array {
        opts["dashArray"] = json!(dash);
    }
    match band {
        Band::Roads => opts["pane"] = json!(ROADS_PANE),
        Band::Regions => opts["pane"] = json!(REGIONS_PANE),
        Band::Overlay => {}
    }
    opts
}

/// A Leaflet map in `CRS.Simple`, addressed in image pixels.
pub struct LeafletSurface {
    map: Map,
    layers: HashMap<LayerId, Layer>,
    next: u32,
    image: Option<LayerId>,
}

impl LeafletSurface {
    /// Create the map inside the element `container_id`.
    pub fn new(container_id: &str) -> Result<Self, JsValue> {
        let crs = js_sys::Reflect::get(&js_sys::global(), &"L".into())
            .and_then(|l| js_sys::Reflect::get(&l, &"CRS".into()))
            .and_then(|c| js_sys::Reflect::get(&c, &"Simple".into()))?;
        let options = js(json!({
            "minZoom": -5,
            "zoomSnap": 0.25,
            "doubleClickZoom": false,
            "attributionControl": false,
        }));
        js_sys::Reflect::set(&options, &"crs".into(), &crs)?;
        let map = new_map(container_id, &options);
        for (pane, z) in PANES {
            let el = map.create_pane(pane);
            el.style().set_property("z-index", z)?;
        }
        Ok(LeafletSurface {
            map,
            layers: HashMap::new(),
            next: 0,
            image: None,
        })
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    /// The most recently added background image, while it is on the map.
    pub fn image(&self) -> Option<&Layer> {
        self.layers.get(&self.image?)
    }

    fn keep(&mut self, layer: Layer) -> LayerId {
        self.next += 1;
        let id = LayerId(self.next);
        self.layers.insert(id, layer);
        id
    }
}

impl MapSurface for LeafletSurface {
    fn add_image(&mut self, url: &str, height: f64, width: f64) -> LayerId {
        let layer = image_overlay(
            &asset_url(url),
            &frame(height, width),
            &js(json!({ "pane": IMAGE_PANE })),
        );
        layer.add_to(&self.map);
        let id = self.keep(layer);
        self.image = Some(id);
        id
    }

    fn add_marker(&mut self, at: LatLng, popup: &str, icon_url: Option<&str>) -> LayerId {
        let opts = js(json!({}));
        if let Some(url) = icon_url {
            let icon = icon(&js(json!({
                "iconUrl": asset_url(url),
                "iconSize": [32, 32],
                "iconAnchor": [16, 32],
                "popupAnchor": [0, -32],
            })));
            let _ = js_sys::Reflect::set(&opts, &"icon".into(), &icon);
        }
        let layer = marker(&js(point(at)), &opts);
        layer.bind_popup(popup, &popup_options());
        layer.add_to(&self.map);
        self.keep(layer)
    }

    fn add_polygon(&mut self, pts: &[LatLng], style: &AreaStyle, popup: &str) -> LayerId {
        let layer = polygon(
            &js(points(pts)),
            &js(json!({
                "color": style.color,
                "fillColor": style.fill_color,
                "fillOpacity": style.fill_opacity,
                "weight": style.weight,
                "pane": REGIONS_PANE,
            })),
        );
        layer.bind_popup(popup, &popup_options());
        layer.add_to(&self.map);
        self.keep(layer)
    }

    fn add_polyline(
        &mut self,
        pts: &[LatLng],
        style: &LineStyle,
        band: Band,
        popup: Option<&str>,
    ) -> LayerId {
        let layer = polyline(&js(points(pts)), &js(line_options(style, band)));
        if let Some(html) = popup {
            layer.bind_popup(html, &popup_options());
        }
        layer.add_to(&self.map);
        self.keep(layer)
    }

    fn add_vertex(&mut self, at: LatLng) -> LayerId {
        let layer = circle_marker(
            &js(point(at)),
            &js(json!({
                "radius": 4,
                "color": "yellow",
                "fillColor": "yellow",
                "fillOpacity": 1,
                "interactive": false,
            })),
        );
        layer.add_to(&self.map);
        self.keep(layer)
    }

    fn add_tooltip(&mut self, at: LatLng, html: &str, placement: TipPlacement) -> LayerId {
        let (direction, offset) = match placement {
            TipPlacement::Above => ("top", json!([0, -10])),
            TipPlacement::Right => ("right", json!([10, 0])),
        };
        let layer = tooltip(&js(json!({
            "permanent": true,
            "direction": direction,
            "offset": offset,
            "className": "measure-tooltip",
        })));
        layer.set_lat_lng(&js(point(at))).set_content(html);
        layer.add_to(&self.map);
        self.keep(layer)
    }

    fn set_path(&mut self, layer: LayerId, pts: &[LatLng]) {
        if let Some(l) = self.layers.get(&layer) {
            l.set_lat_lngs(&js(points(pts)));
        }
    }

    fn bind_label(&mut self, layer: LayerId, html: &str) {
        if let Some(l) = self.layers.get(&layer) {
            l.bind_tooltip(
                html,
                &js(json!({
                    "permanent": true,
                    "sticky": true,
                    "direction": "center",
                    "className": "measure-tooltip",
                })),
            );
            l.open_tooltip();
        }
    }

    fn set_marker_visible(&mut self, layer: LayerId, visible: bool) {
        if let Some(l) = self.layers.get(&layer) {
            if visible {
                l.add_to(&self.map);
            } else {
                self.map.remove_layer(l);
            }
        }
    }

    fn set_area_visible(&mut self, layer: LayerId, visible: bool, fill_opacity: f64) {
        if let Some(l) = self.layers.get(&layer) {
            l.set_style(&js(json!({
                "stroke": visible,
                "fill": visible,
                "fillOpacity": if visible { fill_opacity } else { 0.0 },
            })));
        }
    }

    fn set_line_opacity(&mut self, layer: LayerId, opacity: f64) {
        if let Some(l) = self.layers.get(&layer) {
            l.set_style(&js(json!({ "opacity": opacity })));
        }
    }

    fn remove(&mut self, layer: LayerId) {
        if let Some(l) = self.layers.remove(&layer) {
            self.map.remove_layer(&l);
        }
    }

    fn fit_bounds(&mut self, height: f64, width: f64) {
        self.map.fit_bounds(&frame(height, width));
    }

    fn focus(&mut self, layer: LayerId, at: LatLng) {
        if let Some(l) = self.layers.get(&layer) {
            let zoom = self.map.get_zoom().max(1.0);
            self.map.fly_to(&js(point(at)), zoom);
            l.open_popup();
        }
    }
}
