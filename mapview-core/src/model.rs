use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Position in map-pixel space. `lat` is the row, `lng` the column, matching
/// the simple (non-geographic) projection the viewer draws with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// Accepts a JSON `[row, col]` pair; anything else is rejected.
    pub fn from_json(v: &Value) -> Option<Self> {
        match v.as_array()?.as_slice() {
            [a, b] => Some(LatLng::new(a.as_f64()?, b.as_f64()?)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<(f64, f64)> for LatLng {
    fn from(v: (f64, f64)) -> Self {
        LatLng { lat: v.0, lng: v.1 }
    }
}

impl From<LatLng> for geo_types::Point<f64> {
    fn from(p: LatLng) -> Self {
        geo_types::Point::new(p.lng, p.lat)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapStatus {
    #[default]
    Normal,
    ComingSoon,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    #[default]
    Map,
    Folder,
}

/// Geographic frame used by the coordinate readout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLonBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Pixel-to-distance scale declared by a map.
#[derive(Clone, Debug, PartialEq)]
pub struct Scale {
    pub pixels: f64,
    pub units: f64,
    pub unit_name: String,
}

/// A child reference as it appears in catalog files: either a plain id that
/// still has to be fetched, or an inline descriptor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Id(String),
    Map(Box<MapDescriptor>),
    Invalid(Value),
}

impl ChildRef {
    pub fn as_map(&self) -> Option<&MapDescriptor> {
        match self {
            ChildRef::Map(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDescriptor {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: MapKind,
    pub image_url: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub lat_lon_bounds: Option<LatLonBounds>,
    pub scale_pixels: Option<f64>,
    pub scale_kilometers: Option<f64>,
    pub scale_unit_name: Option<String>,
    pub blurb: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: MapStatus,
    /// Diagnostic attached to placeholder nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub children: Vec<ChildRef>,
    #[serde(default)]
    pub points_of_interest: Vec<PointOfInterest>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub roads: Vec<Road>,
    #[serde(default)]
    pub filter_groups: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl MapDescriptor {
    /// Stand-in for a child that could not be resolved.
    pub fn placeholder(id: &str, reason: impl Into<String>) -> Self {
        MapDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            status: MapStatus::ComingSoon,
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_coming_soon(&self) -> bool {
        self.status == MapStatus::ComingSoon
    }

    /// Resolved children only.
    pub fn child_maps(&self) -> impl Iterator<Item = &MapDescriptor> {
        self.children.iter().filter_map(ChildRef::as_map)
    }

    /// Declared pixel size as `(height, width)` when both are usable.
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        let (h, w) = (self.height?, self.width?);
        (h.is_finite() && w.is_finite() && h > 0.0 && w > 0.0).then_some((h, w))
    }

    /// The scale, if both numbers are present and positive.
    pub fn scale(&self) -> Option<Scale> {
        let pixels = self.scale_pixels.filter(|v| *v > 0.0)?;
        let units = self.scale_kilometers.filter(|v| *v > 0.0)?;
        let unit_name = match self.scale_unit_name.as_deref() {
            Some(n) if !n.is_empty() && n != "units" => n.to_string(),
            _ => "km".to_string(),
        };
        Some(Scale {
            pixels,
            units,
            unit_name,
        })
    }

    /// Region filter groups (`filterGroups.Regions`).
    pub fn region_filter_groups(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.filter_groups.get("Regions")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_point")]
    pub coords: Option<LatLng>,
    #[serde(rename = "type", default, deserialize_with = "lenient_opt_text")]
    pub type_: Option<String>,
    pub wiki_link: Option<String>,
    pub pronunciation: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_path")]
    pub coordinates: Vec<LatLng>,
    #[serde(rename = "type", default, deserialize_with = "lenient_opt_text")]
    pub type_: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub value: Option<String>,
    pub color: Option<String>,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub wiki_link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Road {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_path")]
    pub coordinates: Vec<LatLng>,
    #[serde(rename = "type", default, deserialize_with = "lenient_opt_text")]
    pub type_: Option<String>,
    pub color: Option<String>,
    pub weight: Option<f64>,
    pub opacity: Option<f64>,
    pub dash_array: Option<String>,
    pub wiki_link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

// Unknown or mistyped values fall back to defaults so that one odd record
// never rejects the whole file.
fn lenient_status<'de, D: Deserializer<'de>>(d: D) -> Result<MapStatus, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v.as_ref().and_then(Value::as_str) {
        Some("coming-soon") => MapStatus::ComingSoon,
        _ => MapStatus::Normal,
    })
}

fn lenient_kind<'de, D: Deserializer<'de>>(d: D) -> Result<MapKind, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v.as_ref().and_then(Value::as_str) {
        Some("folder") => MapKind::Folder,
        _ => MapKind::Map,
    })
}

fn text_of(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .and_then(text_of)
        .unwrap_or_default())
}

fn lenient_opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(text_of))
}

fn lenient_point<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LatLng>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(LatLng::from_json))
}

fn lenient_path<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<LatLng>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    let Some(items) = v.as_ref().and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    Ok(items.iter().filter_map(LatLng::from_json).collect())
}
