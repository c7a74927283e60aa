use crate::model::{LatLng, LatLonBounds};

/// Linear projection of a map-pixel position onto declared geographic bounds.
/// Returns `(lat, lon)`.
pub fn project(at: LatLng, bounds: &LatLonBounds, height: f64, width: f64) -> (f64, f64) {
    let lon = bounds.west + (at.lng / width) * (bounds.east - bounds.west);
    let lat = bounds.south + (at.lat / height) * (bounds.north - bounds.south);
    (lat, lon)
}

/// Positive longitudes read as west, following the map data convention.
pub fn format_lat_lon(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'W' } else { 'E' };
    format!("{:.2}° {ns}, {:.2}° {ew}", lat.abs(), lon.abs())
}

/// Pointer readout that a double-click can freeze.
#[derive(Clone, Debug, Default)]
pub struct CoordReadout {
    frame: Option<(LatLonBounds, f64, f64)>,
    locked: bool,
    last: Option<(f64, f64)>,
}

impl CoordReadout {
    /// Adopt a map's frame; maps without `latLonBounds` have no readout.
    pub fn set_frame(&mut self, bounds: Option<LatLonBounds>, dims: Option<(f64, f64)>) {
        self.frame = bounds.zip(dims).map(|(b, (h, w))| (b, h, w));
        self.locked = false;
        self.last = None;
    }

    pub fn available(&self) -> bool {
        self.frame.is_some()
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Pointer moved. Returns the text to show unless frozen.
    pub fn update(&mut self, at: LatLng) -> Option<String> {
        if self.locked {
            return None;
        }
        let (bounds, h, w) = self.frame.as_ref()?;
        let (lat, lon) = project(at, bounds, *h, *w);
        self.last = Some((lat, lon));
        Some(format_lat_lon(lat, lon))
    }

    /// Double-click. Locking takes one last reading at `at`.
    pub fn toggle_lock(&mut self, at: LatLng) -> Option<String> {
        if self.locked {
            self.locked = false;
            return None;
        }
        let text = self.update(at);
        self.locked = self.frame.is_some();
        text
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        self.last
    }
}
