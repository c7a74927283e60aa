use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::constants::{IMAGE_LOAD_TIMEOUT_MS, INDEX_PATH, MAP_PATH_PREFIX, MAX_CHILD_DEPTH};

// Map ids are usually slugs; keep the common ones readable in request paths.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// One travel pace, in scale units per day.
#[derive(Clone, Debug, PartialEq)]
pub struct Pace {
    pub label: String,
    pub units_per_day: f64,
}

impl Pace {
    pub fn new(label: &str, units_per_day: f64) -> Self {
        Pace {
            label: label.to_string(),
            units_per_day,
        }
    }

    pub fn days(&self, distance: f64) -> f64 {
        distance / self.units_per_day
    }
}

/// Ordered pace list used to phrase travel time in measurement tooltips.
#[derive(Clone, Debug, PartialEq)]
pub struct PaceTable {
    pub paces: Vec<Pace>,
}

impl PaceTable {
    /// Paces for multi-point paths.
    pub fn path_default() -> Self {
        PaceTable {
            paces: vec![
                Pace::new("Fast", 48.28),
                Pace::new("Normal", 38.62),
                Pace::new("Slow", 28.97),
            ],
        }
    }

    /// Paces for a single segment. These differ from [`PaceTable::path_default`]
    /// and are kept separate until the product settles on one model.
    pub fn segment_default() -> Self {
        PaceTable {
            paces: vec![Pace::new("Normal", 25.0), Pace::new("Fast", 40.0)],
        }
    }
}

/// Viewer tunables. `Default` reproduces the shipped behaviour.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub index_path: String,
    pub map_path_prefix: String,
    pub max_child_depth: usize,
    pub image_timeout_ms: i32,
    pub path_paces: PaceTable,
    pub segment_paces: PaceTable,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            index_path: INDEX_PATH.to_string(),
            map_path_prefix: MAP_PATH_PREFIX.to_string(),
            max_child_depth: MAX_CHILD_DEPTH,
            image_timeout_ms: IMAGE_LOAD_TIMEOUT_MS,
            path_paces: PaceTable::path_default(),
            segment_paces: PaceTable::segment_default(),
        }
    }
}

impl ViewerConfig {
    /// Relative path of the descriptor file for `id`.
    pub fn map_path(&self, id: &str) -> String {
        format!(
            "{}{}.json",
            self.map_path_prefix,
            utf8_percent_encode(id, PATH_SEGMENT)
        )
    }
}
