//! Multi-point distance measurement.
//!
//! `Idle → Active → {Finalized, Cancelled}`. Every transition tells the caller
//! whether the pointer/keyboard listener set must be attached or detached, so
//! the host can register them as one unit.

use std::fmt::Write;

use geo::{Distance, Euclidean};
use geo_types::Point;

use crate::config::PaceTable;
use crate::model::{LatLng, Scale};
use crate::surface::{Band, LayerId, LineStyle, MapSurface, TipPlacement};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Finalized,
    Cancelled,
}

/// Listener bookkeeping requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Listeners {
    Attach,
    Detach,
    Keep,
}

/// Planar distance between two map points, in map pixels.
pub fn pixel_distance(a: LatLng, b: LatLng) -> f64 {
    Euclidean.distance(Point::from(a), Point::from(b))
}

pub fn path_pixels(path: &[LatLng]) -> f64 {
    path.windows(2).map(|w| pixel_distance(w[0], w[1])).sum()
}

/// Converts map pixels to scale units.
pub fn to_units(pixels: f64, scale: &Scale) -> f64 {
    pixels / scale.pixels * scale.units
}

/// Running-total text shown after each click.
pub fn total_html(path: &[LatLng], scale: Option<&Scale>, paces: &PaceTable) -> String {
    let pixels = path_pixels(path);
    let mut html = String::new();
    match scale {
        Some(scale) => {
            let total = to_units(pixels, scale);
            let _ = write!(html, "Total ≈ {total:.2} {}", scale.unit_name);
            for pace in &paces.paces {
                let _ = write!(html, "<br>{} ≈ {:.1} Day(s)", pace.label, pace.days(total));
            }
        }
        None if pixels == 0.0 && path.len() == 1 => html.push_str("Start point"),
        None => {
            let _ = write!(html, "Total: {pixels:.0} pixels");
            if pixels > 0.0 {
                html.push_str(" (Scale unknown)");
            }
            for pace in &paces.paces {
                let _ = write!(html, "<br>Days at {} Pace: N/A", pace.label);
            }
        }
    }
    html
}

/// Live text for the segment under the pointer.
pub fn segment_html(pixels: f64, scale: Option<&Scale>, paces: &PaceTable) -> String {
    let Some(scale) = scale else {
        return format!("Segment: {pixels:.0} px");
    };
    let d = to_units(pixels, scale);
    let mut html = format!("Segment: {d:.2} {}", scale.unit_name);
    for pace in &paces.paces {
        let _ = write!(html, "<br>{} Pace: {:.1} Day(s)", pace.label, pace.days(d));
    }
    html
}

#[derive(Debug)]
pub struct MeasureTool {
    phase: Phase,
    path: Vec<LatLng>,
    scale: Option<Scale>,
    path_paces: PaceTable,
    segment_paces: PaceTable,
    vertices: Vec<LayerId>,
    line: Option<LayerId>,
    total_tip: Option<LayerId>,
    total_text: String,
    ghost: Option<LayerId>,
    ghost_tip: Option<LayerId>,
}

impl MeasureTool {
    pub fn new(path_paces: PaceTable, segment_paces: PaceTable) -> Self {
        MeasureTool {
            phase: Phase::Idle,
            path: Vec::new(),
            scale: None,
            path_paces,
            segment_paces,
            vertices: Vec::new(),
            line: None,
            total_tip: None,
            total_text: String::new(),
            ghost: None,
            ghost_tip: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn points(&self) -> &[LatLng] {
        &self.path
    }

    /// Committed path length in scale units, or pixels when the map has no
    /// scale.
    pub fn total(&self) -> f64 {
        let px = path_pixels(&self.path);
        match &self.scale {
            Some(s) => to_units(px, s),
            None => px,
        }
    }

    /// Text of the running total tooltip.
    pub fn total_text(&self) -> &str {
        &self.total_text
    }

    /// Number of layers this tool currently owns on the surface.
    pub fn layer_count(&self) -> usize {
        self.vertices.len()
            + [self.line, self.total_tip, self.ghost, self.ghost_tip]
                .iter()
                .flatten()
                .count()
    }

    /// Forget everything and adopt the scale of a newly active map.
    pub fn reset<S: MapSurface + ?Sized>(&mut self, surface: &mut S, scale: Option<Scale>) -> Listeners {
        let was_active = self.is_active();
        self.clear(surface);
        self.phase = Phase::Idle;
        self.scale = scale;
        if was_active { Listeners::Detach } else { Listeners::Keep }
    }

    /// Measure button. Cancels an active path, otherwise starts a fresh one.
    pub fn toggle<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        if self.is_active() {
            return self.cancel(surface);
        }
        self.clear(surface);
        self.phase = Phase::Active;
        log::debug!("Measurement started");
        Listeners::Attach
    }

    pub fn click<S: MapSurface + ?Sized>(&mut self, surface: &mut S, at: LatLng) {
        if !self.is_active() || !at.is_finite() {
            return;
        }
        self.path.push(at);
        self.vertices.push(surface.add_vertex(at));
        match self.line {
            Some(line) => surface.set_path(line, &self.path),
            None if self.path.len() >= 2 => {
                self.line = Some(surface.add_polyline(
                    &self.path,
                    &LineStyle::measure_path(),
                    Band::Overlay,
                    None,
                ));
            }
            None => {}
        }
        self.total_text = total_html(&self.path, self.scale.as_ref(), &self.path_paces);
        if let Some(tip) = self.total_tip.take() {
            surface.remove(tip);
        }
        self.total_tip = Some(surface.add_tooltip(at, &self.total_text, TipPlacement::Right));
    }

    pub fn pointer_move<S: MapSurface + ?Sized>(&mut self, surface: &mut S, at: LatLng) {
        if !self.is_active() || !at.is_finite() {
            return;
        }
        let Some(&last) = self.path.last() else {
            return;
        };
        self.drop_ghost(surface);
        self.ghost = Some(surface.add_polyline(
            &[last, at],
            &LineStyle::measure_ghost(),
            Band::Overlay,
            None,
        ));
        let text = segment_html(pixel_distance(last, at), self.scale.as_ref(), &self.segment_paces);
        self.ghost_tip = Some(surface.add_tooltip(at, &text, TipPlacement::Above));
    }

    /// Double-click. Keeps the path when it has at least two points.
    pub fn finish<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        if !self.is_active() {
            return Listeners::Keep;
        }
        let Some(line) = self.line.filter(|_| self.path.len() >= 2) else {
            return self.cancel(surface);
        };
        self.drop_ghost(surface);
        if let Some(tip) = self.total_tip.take() {
            surface.remove(tip);
        }
        for v in self.vertices.drain(..) {
            surface.remove(v);
        }
        surface.bind_label(line, &self.total_text);
        self.phase = Phase::Finalized;
        log::debug!("Measurement finalized over {} points", self.path.len());
        Listeners::Detach
    }

    /// Escape. Discards the in-progress path.
    pub fn cancel<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> Listeners {
        if !self.is_active() {
            return Listeners::Keep;
        }
        self.clear(surface);
        self.phase = Phase::Cancelled;
        log::debug!("Measurement cancelled");
        Listeners::Detach
    }

    fn drop_ghost<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(g) = self.ghost.take() {
            surface.remove(g);
        }
        if let Some(t) = self.ghost_tip.take() {
            surface.remove(t);
        }
    }

    fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        self.drop_ghost(surface);
        let owned = self
            .vertices
            .drain(..)
            .chain(self.line.take())
            .chain(self.total_tip.take());
        for layer in owned {
            surface.remove(layer);
        }
        self.path.clear();
        self.total_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km_scale(pixels: f64) -> Scale {
        Scale {
            pixels,
            units: 1.0,
            unit_name: "km".into(),
        }
    }

    #[test]
    fn distances_are_planar() {
        let p = [LatLng::new(0.0, 0.0), LatLng::new(3.0, 4.0), LatLng::new(3.0, 10.0)];
        assert_eq!(pixel_distance(p[0], p[1]), 5.0);
        assert_eq!(path_pixels(&p), 11.0);
    }

    #[test]
    fn total_with_scale_lists_every_pace() {
        let p = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 386.2)];
        let html = total_html(&p, Some(&km_scale(10.0)), &PaceTable::path_default());
        assert_eq!(
            html,
            "Total ≈ 38.62 km<br>Fast ≈ 0.8 Day(s)<br>Normal ≈ 1.0 Day(s)<br>Slow ≈ 1.3 Day(s)"
        );
    }

    #[test]
    fn total_without_scale_reports_pixels() {
        let paces = PaceTable::path_default();
        let one = [LatLng::new(1.0, 1.0)];
        assert_eq!(total_html(&one, None, &paces), "Start point");
        let two = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 25.0)];
        assert_eq!(
            total_html(&two, None, &paces),
            "Total: 25 pixels (Scale unknown)<br>Days at Fast Pace: N/A<br>Days at Normal Pace: N/A<br>Days at Slow Pace: N/A"
        );
    }

    #[test]
    fn segment_uses_its_own_paces() {
        let paces = PaceTable::segment_default();
        assert_eq!(segment_html(42.4, None, &paces), "Segment: 42 px");
        assert_eq!(
            segment_html(320.0, Some(&km_scale(10.0)), &paces),
            "Segment: 32.00 km<br>Normal Pace: 1.3 Day(s)<br>Fast Pace: 0.8 Day(s)"
        );
    }
}
