//! Viewer actions. Each one drives the session and then redraws the DOM parts
//! it touched.

use mapview_core::error::ActivateError;
use mapview_core::filter::FilterChange;
use mapview_core::measure::Listeners;
use mapview_core::nav::{HistoryEntry, HistoryOp, SidebarState};
use mapview_core::shortcuts::{Closable, Command, KeyPress, UiState, command_for};
use mapview_core::{Activated, ImageOutcome, LatLng, LoadingPhase};
use wasm_bindgen::JsValue;

use crate::constants::{FILTER_TOGGLE_ALL, HELP_MODAL, SEARCH_RESULTS};
use crate::loading::PendingLoad;
use crate::measure_input::MeasureListeners;
use crate::state::App;
use crate::ui;
use crate::utils::{asset_url, is_shown, set_display};

impl App {
    /// Switch to map `id`, recording the switch in history unless a
    /// back/forward navigation is being replayed.
    pub fn load_map(&mut self, id: &str) {
        let listeners = self.session.cancel_measure(&mut self.surface);
        self.apply_listeners(listeners);
        let sidebar = self.session.sidebar();
        match self.session.activate(id, &mut self.surface) {
            Ok(Activated::Unchanged) => log::debug!("Map {id} is already on screen"),
            Ok(Activated::Loaded { generation, url }) => {
                self.pending = None;
                self.progress = ui::ProgressTicker::start(&self.window, &self.document);
                self.pending = match PendingLoad::start(
                    &self.window,
                    self.surface.image(),
                    generation,
                    &asset_url(&url),
                    self.config.image_timeout_ms,
                ) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        log::error!("Could not start image preload: {e:?}");
                        None
                    }
                };
                self.after_switch();
                if let Some(op) = self.nav.map_loaded(id, sidebar) {
                    self.record(op);
                }
            }
            Err(e) => {
                log::warn!("{e}");
                self.pending = None;
                self.progress = None;
                self.after_switch();
                match &e {
                    ActivateError::ComingSoon(_) => {
                        let _ = self.window.alert_with_message(&e.to_string());
                    }
                    ActivateError::InvalidDescriptor(_) => {
                        ui::show_loading_error(&self.document, "Error: Invalid map data.");
                    }
                    ActivateError::NotFound(_) => {}
                }
                if let Some(op) = self.nav.map_cleared(sidebar) {
                    self.record(op);
                }
            }
        }
    }

    /// Sidebar entry of a map that is not ready yet.
    pub fn announce_coming_soon(&self, id: &str) {
        let name = self
            .session
            .catalog()
            .find(id)
            .map(|m| m.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("this map");
        let msg = ActivateError::ComingSoon(name.to_string()).to_string();
        let _ = self.window.alert_with_message(&msg);
    }

    fn after_switch(&mut self) {
        if let Err(e) = ui::render_filters(&self.document, self.session.filters()) {
            log::error!("Could not build the filter panel: {e:?}");
        }
        ui::set_filter_panel(&self.document, false);
        ui::reset_search(&self.document);
        ui::set_blurb(&self.document, self.session.blurb(), self.launch.embedded);
        ui::set_coords(&self.document, None, false);
        ui::highlight_active(&self.document, &self.nav_tree, self.session.active_id());
        self.sync_controls();
    }

    fn sync_controls(&self) {
        ui::render_controls(
            &self.document,
            self.session.controls(),
            self.session.markers_visible(),
        );
        ui::set_measuring(&self.document, self.session.measure().is_active());
    }

    pub fn finish_loading(&mut self, generation: u64, outcome: ImageOutcome) {
        let Some(phase) = self
            .session
            .finish_loading(generation, outcome, &mut self.surface)
        else {
            return;
        };
        if let Some(p) = self.pending.as_mut() {
            p.settle();
        }
        let progress = self.progress.take();
        match phase {
            LoadingPhase::Done => {
                if let Some(p) = progress {
                    p.finish(&self.document);
                }
            }
            LoadingPhase::Failed(msg) => {
                let listeners = self.session.cancel_measure(&mut self.surface);
                self.apply_listeners(listeners);
                ui::show_loading_error(&self.document, &msg);
                ui::highlight_active(&self.document, &self.nav_tree, None);
                self.sync_controls();
            }
            LoadingPhase::Loading => {}
        }
    }

    pub fn apply_listeners(&mut self, listeners: Listeners) {
        match listeners {
            Listeners::Attach => {
                self.measure_listeners = None;
                match MeasureListeners::attach(&self.window, self.surface.map()) {
                    Ok(l) => self.measure_listeners = Some(l),
                    Err(e) => log::error!("Could not attach measurement listeners: {e:?}"),
                }
                ui::set_filter_panel(&self.document, false);
            }
            Listeners::Detach => self.measure_listeners = None,
            Listeners::Keep => {}
        }
        ui::set_measuring(&self.document, self.session.measure().is_active());
    }

    pub fn toggle_measure(&mut self) {
        let listeners = self.session.toggle_measure(&mut self.surface);
        self.apply_listeners(listeners);
    }

    pub fn measure_click(&mut self, at: LatLng) {
        self.session.measure_click(at, &mut self.surface);
    }

    pub fn measure_move(&mut self, at: LatLng) {
        self.session.measure_move(at, &mut self.surface);
    }

    pub fn finish_measure(&mut self) {
        let listeners = self.session.finish_measure(&mut self.surface);
        self.apply_listeners(listeners);
    }

    fn cancel_measure(&mut self) {
        let listeners = self.session.cancel_measure(&mut self.surface);
        self.apply_listeners(listeners);
    }

    /// Escape while measuring. Cancels only when nothing else would close
    /// first; returns whether it did.
    pub fn escape_measurement(&mut self) -> bool {
        let press = KeyPress {
            key: "Escape",
            command: false,
        };
        let target = command_for(press, &self.ui_state(false));
        if target != Some(Command::Close(Closable::Measurement)) {
            return false;
        }
        self.cancel_measure();
        true
    }

    pub fn apply_filter(&mut self, change: &FilterChange) {
        self.session.apply_filter(change, &mut self.surface);
        ui::sync_filters(&self.document, self.session.filters());
        self.refresh_search();
    }

    pub fn toggle_markers(&mut self) {
        self.session.toggle_markers(&mut self.surface);
        self.refresh_search();
        self.sync_controls();
    }

    pub fn search(&mut self, text: &str) {
        let hits = self.session.set_search(text, &mut self.surface);
        if let Err(e) = ui::render_search_results(&self.document, &hits) {
            log::error!("Could not list search results: {e:?}");
        }
    }

    fn refresh_search(&mut self) {
        if !self.session.search_text().trim().is_empty() {
            let hits = self.session.search_hits();
            let _ = ui::render_search_results(&self.document, &hits);
        }
    }

    pub fn focus_hit(&mut self, record: usize) {
        if self.session.focus_hit(record, &mut self.surface) {
            ui::reset_search(&self.document);
        }
    }

    pub fn toggle_filter_panel(&mut self) {
        let open = !ui::filter_panel_open(&self.document);
        if open && self.session.measure().is_active() {
            self.cancel_measure();
        }
        ui::set_filter_panel(&self.document, open);
    }

    pub fn set_sidebar(&mut self, state: SidebarState) {
        self.session.set_sidebar(state);
        ui::apply_sidebar(&self.document, state);
        self.surface.map().invalidate_size();
        let id = self.session.active_id().unwrap_or_default().to_string();
        if let Some(op) = self.nav.sidebar_changed(&id, state) {
            self.record(op);
        }
    }

    pub fn toggle_theme(&mut self) {
        let theme = self.prefs.toggle_theme(&mut self.store);
        ui::apply_theme(&self.document, theme);
        self.ambient.sync(&self.prefs);
    }

    pub fn toggle_sound(&mut self) {
        let enabled = self.prefs.toggle_sound(&mut self.store);
        ui::set_sound_icon(&self.document, enabled);
        self.ambient.sync(&self.prefs);
    }

    pub fn pointer_moved(&mut self, at: LatLng) {
        if let Some(text) = self.session.coords_mut().update(at) {
            ui::set_coords(&self.document, Some(&text), false);
        }
    }

    pub fn lock_coords(&mut self, at: LatLng) {
        let readout = self.session.coords_mut();
        if !readout.available() {
            return;
        }
        let text = readout.toggle_lock(at);
        let locked = readout.locked();
        ui::set_coords(&self.document, text.as_deref(), locked);
    }

    pub fn ui_state(&self, typing: bool) -> UiState {
        let popup_open = self
            .document
            .query_selector(".leaflet-popup")
            .ok()
            .flatten()
            .is_some();
        UiState {
            typing,
            help_open: is_shown(&self.document, HELP_MODAL),
            popup_open,
            filters_open: ui::filter_panel_open(&self.document),
            search_results_open: is_shown(&self.document, SEARCH_RESULTS),
            measuring: self.session.measure().is_active(),
            controls: self.session.controls(),
        }
    }

    pub fn run(&mut self, command: Command) {
        log::debug!("Shortcut: {command:?}");
        match command {
            Command::ToggleHelp => ui::toggle_help(&self.document, None),
            Command::Close(Closable::HelpModal) => ui::toggle_help(&self.document, Some(false)),
            Command::Close(Closable::Popup) => self.surface.map().close_popup(),
            Command::Close(Closable::FilterPanel) => ui::set_filter_panel(&self.document, false),
            Command::Close(Closable::SearchResults) => {
                set_display(&self.document, SEARCH_RESULTS, false, "block")
            }
            Command::Close(Closable::Measurement) => self.cancel_measure(),
            Command::ZoomIn => self.surface.map().zoom_in(),
            Command::ZoomOut => self.surface.map().zoom_out(),
            Command::ToggleSidebar => {
                if !self.launch.embedded {
                    self.set_sidebar(self.session.sidebar().toggled());
                }
            }
            Command::ToggleTheme => self.toggle_theme(),
            Command::ToggleMeasure => self.toggle_measure(),
            Command::ToggleMarkers => self.toggle_markers(),
            Command::ToggleFilters => self.toggle_filter_panel(),
            Command::FocusSearch => ui::focus_search(&self.document),
        }
    }

    /// Back/forward navigation.
    pub fn on_pop(&mut self, state: &JsValue) {
        let entry = js_sys::JSON::stringify(state)
            .ok()
            .map(String::from)
            .and_then(|s| serde_json::from_str::<HistoryEntry>(&s).ok());
        let hash = self.window.location().hash().unwrap_or_default();
        let action = self.nav.on_pop(
            entry.as_ref(),
            &hash,
            self.session.active_id(),
            self.session.sidebar(),
        );
        self.nav.begin_replay();
        if let Some(sidebar) = action.sidebar {
            self.set_sidebar(sidebar);
        }
        if let Some(id) = action.load {
            self.load_map(&id);
        }
        self.nav.end_replay();
    }

    pub fn record(&self, op: HistoryOp) {
        let Ok(history) = self.window.history() else {
            return;
        };
        let result = match op {
            HistoryOp::Replace(url) => {
                history.replace_state_with_url(&JsValue::NULL, "", Some(&url))
            }
            HistoryOp::Push { url, state } => {
                let state = state
                    .and_then(|s| serde_json::to_string(&s).ok())
                    .and_then(|s| js_sys::JSON::parse(&s).ok())
                    .unwrap_or(JsValue::NULL);
                history.push_state_with_url(&state, "", Some(&url))
            }
        };
        if let Err(e) = result {
            log::warn!("History update failed: {e:?}");
        }
    }
}

/// Checkbox in the filter panel, described by its class, value and group.
pub fn filter_change(
    id: &str,
    class: &str,
    value: &str,
    group: Option<String>,
    checked: bool,
) -> Option<FilterChange> {
    if id == FILTER_TOGGLE_ALL {
        return Some(FilterChange::All(checked));
    }
    let name = value.to_string();
    Some(match class {
        "poi-filter-checkbox" => FilterChange::PoiGroup { name, checked },
        "region-group-filter" => FilterChange::RegionGroup { name, checked },
        "region-type-filter" => FilterChange::RegionValue {
            group: group?,
            value: name,
            checked,
        },
        "line-type-filter" => FilterChange::RoadType { name, checked },
        _ => return None,
    })
}
