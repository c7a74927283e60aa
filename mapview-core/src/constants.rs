/// Application-wide constants.
/// Distances are expressed in map pixels unless noted otherwise.
/// Deepest level of string-id children the catalog loader will fetch.
pub const MAX_CHILD_DEPTH: usize = 5;
/// Fallback timer for the background image preload (ms).
pub const IMAGE_LOAD_TIMEOUT_MS: i32 = 8000;
/// Minimum popup width passed to the surface (px).
pub const POPUP_MIN_WIDTH: u32 = 250;

pub const INDEX_PATH: &str = "maps/maps.json";
pub const MAP_PATH_PREFIX: &str = "maps/";

pub const REGION_COLOR: &str = "#3388ff";
pub const REGION_FILL_OPACITY: f64 = 0.2;
pub const REGION_WEIGHT: f64 = 2.0;

pub const ROAD_COLOR: &str = "#ffffff";
pub const ROAD_WEIGHT: f64 = 3.0;
pub const ROAD_OPACITY: f64 = 0.8;
pub const UNNAMED_ROAD_TYPE: &str = "Unnamed Road Type";

/// Volume ambient tracks fade towards when sound is on.
pub const AMBIENT_VOLUME: f64 = 0.3;
pub const AMBIENT_FADE_MS: f64 = 1500.0;
