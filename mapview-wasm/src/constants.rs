/// Element ids and fixed timings of the host page.
pub const MAP_CONTAINER: &str = "map";
pub const MAP_LIST: &str = "map-list";
pub const FILTER_PANEL: &str = "poi-filter-container";
pub const FILTER_TOGGLE_ALL: &str = "filter-toggle-all";
pub const SEARCH_CONTROL: &str = "search-control-container";
pub const SEARCH_INPUT: &str = "poi-search-input";
pub const SEARCH_RESULTS: &str = "search-results-container";
pub const LOADING_INDICATOR: &str = "loading-indicator";
pub const HELP_MODAL: &str = "keyboard-help-modal";
pub const CLOSE_HELP_BTN: &str = "close-keyboard-help-btn";
pub const MAP_BLURB: &str = "map-blurb";
pub const THEME_CHECKBOX: &str = "theme-checkbox";
pub const SOUND_ICON: &str = "sound-icon";

pub const TOGGLE_SIDEBAR_BTN: &str = "toggle-sidebar-btn";
pub const TOGGLE_SOUND_BTN: &str = "toggle-sound-btn";
pub const TOGGLE_FILTERS_BTN: &str = "toggle-filters-btn";
pub const TOGGLE_MARKERS_BTN: &str = "toggle-markers-btn";
pub const TOGGLE_BLURB_BTN: &str = "toggle-blurb-btn";
pub const TOGGLE_COORDS_BTN: &str = "toggle-coords-btn";
pub const MEASURE_BTN: &str = "measure-tool-btn";

/// Hidden when the viewer runs inside another page.
pub const EMBED_HIDDEN: [&str; 5] = [
    "wip-popup",
    "bottom-link-bar",
    TOGGLE_BLURB_BTN,
    TOGGLE_SIDEBAR_BTN,
    TOGGLE_SOUND_BTN,
];

pub const CATALOG_ERROR_HTML: &str =
    "<h2>Error</h2><p>Could not load map data. Please check the console for details.</p>";

/// Fake progress never passes this until the image settles (percent).
pub const PROGRESS_CAP: f64 = 90.0;
pub const PROGRESS_TICK_MS: i32 = 150;
pub const HIDE_DELAY_MS: i32 = 300;

pub const SOUND_ON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><polygon points="11 5 6 9 2 9 2 15 6 15 11 19 11 5"/><path d="M15.54 8.46a5 5 0 0 1 0 7.07"/><path d="M19.07 4.93a10 10 0 0 1 0 14.14"/></svg>"#;
pub const SOUND_OFF_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><polygon points="11 5 6 9 2 9 2 15 6 15 11 19 11 5"/><line x1="23" x2="17" y1="9" y2="15"/><line x1="17" x2="23" y1="9" y2="15"/></svg>"#;
