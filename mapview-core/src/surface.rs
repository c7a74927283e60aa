//! Drawing primitives the viewer needs from a map renderer.
//!
//! The browser build implements [`MapSurface`] on top of Leaflet; tests use a
//! recording fake. Layers are opaque handles issued by the surface.

use crate::constants::{
    REGION_COLOR, REGION_FILL_OPACITY, REGION_WEIGHT, ROAD_COLOR, ROAD_OPACITY, ROAD_WEIGHT,
};
use crate::model::{LatLng, Region, Road};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

/// Stroke and fill of a polygon.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: f64,
}

impl AreaStyle {
    pub fn region(r: &Region) -> Self {
        let color = r.color.clone().unwrap_or_else(|| REGION_COLOR.to_string());
        AreaStyle {
            fill_color: r.fill_color.clone().unwrap_or_else(|| color.clone()),
            color,
            fill_opacity: r.fill_opacity.unwrap_or(REGION_FILL_OPACITY),
            weight: REGION_WEIGHT,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub dash_array: Option<String>,
}

impl LineStyle {
    pub fn road(r: &Road) -> Self {
        LineStyle {
            color: r.color.clone().unwrap_or_else(|| ROAD_COLOR.to_string()),
            weight: r.weight.unwrap_or(ROAD_WEIGHT),
            opacity: r.opacity.unwrap_or(ROAD_OPACITY),
            dash_array: r.dash_array.clone(),
        }
    }

    /// Committed measurement path.
    pub fn measure_path() -> Self {
        LineStyle {
            color: "yellow".into(),
            weight: 3.0,
            opacity: 1.0,
            dash_array: Some("5, 5".into()),
        }
    }

    /// Segment following the pointer while measuring.
    pub fn measure_ghost() -> Self {
        LineStyle {
            color: "lime".into(),
            weight: 2.0,
            opacity: 1.0,
            dash_array: Some("3, 3".into()),
        }
    }
}

/// Where a free-standing tooltip sits relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TipPlacement {
    Above,
    Right,
}

/// Stacking band of a layer. Regions stay furthest back, markers on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Band {
    Regions,
    Roads,
    Overlay,
}

pub trait MapSurface {
    /// Background image framed by `[0, 0]..[height, width]`.
    fn add_image(&mut self, url: &str, height: f64, width: f64) -> LayerId;
    fn add_marker(&mut self, at: LatLng, popup: &str, icon: Option<&str>) -> LayerId;
    fn add_polygon(&mut self, points: &[LatLng], style: &AreaStyle, popup: &str) -> LayerId;
    fn add_polyline(
        &mut self,
        points: &[LatLng],
        style: &LineStyle,
        band: Band,
        popup: Option<&str>,
    ) -> LayerId;
    /// Small non-interactive circle marking a measurement vertex.
    fn add_vertex(&mut self, at: LatLng) -> LayerId;
    fn add_tooltip(&mut self, at: LatLng, html: &str, placement: TipPlacement) -> LayerId;
    fn set_path(&mut self, layer: LayerId, points: &[LatLng]);
    /// Permanent label centred on a line.
    fn bind_label(&mut self, layer: LayerId, html: &str);
    fn set_marker_visible(&mut self, layer: LayerId, visible: bool);
    /// Show or hide a polygon by toggling its stroke and fill.
    fn set_area_visible(&mut self, layer: LayerId, visible: bool, fill_opacity: f64);
    fn set_line_opacity(&mut self, layer: LayerId, opacity: f64);
    fn remove(&mut self, layer: LayerId);
    fn fit_bounds(&mut self, height: f64, width: f64);
    /// Centre on a marker and open its popup.
    fn focus(&mut self, layer: LayerId, at: LatLng);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_style_falls_back_to_stroke_colour() {
        let r = Region {
            color: Some("#a00".into()),
            ..Default::default()
        };
        let s = AreaStyle::region(&r);
        assert_eq!(s.fill_color, "#a00");
        assert_eq!(s.fill_opacity, REGION_FILL_OPACITY);
        assert_eq!(AreaStyle::region(&Region::default()).color, REGION_COLOR);
    }

    #[test]
    fn road_style_defaults() {
        let s = LineStyle::road(&Road::default());
        assert_eq!(s.opacity, ROAD_OPACITY);
        assert_eq!(s.weight, ROAD_WEIGHT);
        assert!(s.dash_array.is_none());
    }
}
