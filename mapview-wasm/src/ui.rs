//! DOM rendering. Nothing here keeps state; every function redraws its part of
//! the page from core values.

use std::cell::Cell;
use std::rc::Rc;

use mapview_core::Controls;
use mapview_core::filter::{FilterTree, TriState, road_type_label};
use mapview_core::nav::SidebarState;
use mapview_core::prefs::Theme;
use mapview_core::session::SearchHit;
use mapview_core::sidebar::{EMPTY_CATALOG, EntryAction, NavEntry, ancestors};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, Window};

use crate::constants::*;
use crate::utils::{html_element, set_class, set_display};

fn elements(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i)?.dyn_into().ok())
        .collect()
}

fn element_with_map_id(document: &Document, id: &str) -> Option<Element> {
    elements(document, "#map-list [data-map-id]")
        .into_iter()
        .find(|el| el.get_attribute("data-map-id").as_deref() == Some(id))
}

pub fn apply_theme(document: &Document, theme: Theme) {
    if let Some(body) = document.body() {
        set_class(&body, "dark-theme", theme.is_dark());
    }
    if let Some(cb) = document
        .get_element_by_id(THEME_CHECKBOX)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    {
        cb.set_checked(theme.is_dark());
    }
}

/// Strip the chrome for pages that embed the viewer in an iframe.
pub fn apply_embedded(document: &Document) {
    for id in EMBED_HIDDEN {
        set_display(document, id, false, "");
    }
    if let Some(blurb) = document.get_element_by_id(MAP_BLURB) {
        set_class(&blurb, "visible", false);
    }
    if let Some(body) = document.body() {
        set_class(&body, "embedded-view", true);
    }
}

pub fn apply_sidebar(document: &Document, state: SidebarState) {
    if let Ok(Some(container)) = document.query_selector(".container") {
        set_class(&container, "sidebar-collapsed", !state.is_open());
    }
}

pub fn set_sound_icon(document: &Document, enabled: bool) {
    if let Some(icon) = document.get_element_by_id(SOUND_ICON) {
        icon.set_inner_html(if enabled { SOUND_ON_SVG } else { SOUND_OFF_SVG });
    }
    if let Some(btn) = document.get_element_by_id(TOGGLE_SOUND_BTN) {
        let _ = btn.set_attribute("title", if enabled { "Mute Sound" } else { "Unmute Sound" });
    }
}

fn sidebar_item(document: &Document, entry: &NavEntry) -> Result<Element, JsValue> {
    let li = document.create_element("li")?;
    li.set_attribute("data-map-id", &entry.id)?;
    let action = match entry.action {
        EntryAction::Load => "load",
        EntryAction::ComingSoon => "soon",
        EntryAction::None => "none",
    };
    if entry.is_folder() {
        li.set_class_name("folder closed");
        let header = document.create_element("div")?;
        header.set_class_name("folder-header");
        header.set_attribute("title", &entry.title)?;
        header.set_attribute("data-action", action)?;
        set_class(&header, "coming-soon", entry.action == EntryAction::ComingSoon);
        let icon = document.create_element("span")?;
        icon.set_class_name("folder-toggle-icon");
        let label = document.create_element("span")?;
        label.set_text_content(Some(&entry.label));
        header.append_child(&icon)?;
        header.append_child(&label)?;
        li.append_child(&header)?;

        let nested = document.create_element("ul")?;
        nested.set_class_name("nested-list");
        for child in &entry.children {
            nested.append_child(&sidebar_item(document, child)?.into())?;
        }
        li.append_child(&nested)?;
    } else {
        li.set_class_name("map-item");
        li.set_attribute("title", &entry.title)?;
        li.set_attribute("data-action", action)?;
        set_class(&li, "coming-soon", entry.action == EntryAction::ComingSoon);
        li.set_text_content(Some(&entry.label));
    }
    Ok(li)
}

pub fn render_sidebar(document: &Document, entries: &[NavEntry]) -> Result<(), JsValue> {
    let Some(list) = document.get_element_by_id(MAP_LIST) else {
        return Ok(());
    };
    list.set_inner_html("");
    if entries.is_empty() {
        let li = document.create_element("li")?;
        li.set_text_content(Some(EMPTY_CATALOG));
        list.append_child(&li)?;
        return Ok(());
    }
    let ul = document.create_element("ul")?;
    for entry in entries {
        ul.append_child(&sidebar_item(document, entry)?.into())?;
    }
    list.append_child(&ul)?;
    Ok(())
}

/// Mark the entry of `id` active and open the folders above it.
pub fn highlight_active(document: &Document, entries: &[NavEntry], id: Option<&str>) {
    for el in elements(document, "#map-list .map-item, #map-list .folder-header") {
        set_class(&el, "active", false);
    }
    let Some(id) = id else {
        return;
    };
    for folder in ancestors(entries, id).unwrap_or_default() {
        if let Some(li) = element_with_map_id(document, &folder) {
            set_class(&li, "closed", false);
        }
    }
    let Some(li) = element_with_map_id(document, id) else {
        return;
    };
    if li.class_list().contains("folder") {
        if let Ok(Some(header)) = li.query_selector(".folder-header") {
            set_class(&header, "active", true);
        }
        set_class(&li, "closed", false);
    } else {
        set_class(&li, "active", true);
    }
}

pub fn show_catalog_error(document: &Document) {
    if let Some(list) = document.get_element_by_id(MAP_LIST) {
        list.set_inner_html(CATALOG_ERROR_HTML);
    }
    set_loading_text(document, "Error loading map data. Please check console.");
    if let Some(spinner) = loading_part(document, ".spinner") {
        let _ = spinner.style().set_property("display", "none");
    }
}

fn checkbox(
    document: &Document,
    class: &str,
    value: &str,
    label: &str,
    state: TriState,
) -> Result<Element, JsValue> {
    let div = document.create_element("div")?;
    div.set_class_name("filter-item");
    let input: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    input.set_type("checkbox");
    input.set_class_name(class);
    input.set_value(value);
    input.set_checked(state.checked());
    input.set_indeterminate(state.indeterminate());
    let text = document.create_element("label")?;
    text.set_text_content(Some(label));
    div.append_child(&input)?;
    div.append_child(&text)?;
    Ok(div)
}

fn section(document: &Document, panel: &Element, title: &str) -> Result<(), JsValue> {
    panel.append_child(&document.create_element("hr")?.into())?;
    let h = document.create_element("h3")?;
    h.set_text_content(Some(title));
    panel.append_child(&h)?;
    Ok(())
}

fn tri(checked: bool) -> TriState {
    if checked { TriState::Checked } else { TriState::Unchecked }
}

/// Rebuild the filter panel for a new map.
pub fn render_filters(document: &Document, filters: &FilterTree) -> Result<(), JsValue> {
    let Some(panel) = document.get_element_by_id(FILTER_PANEL) else {
        return Ok(());
    };
    panel.set_inner_html("");
    let h = document.create_element("h3")?;
    h.set_text_content(Some("Filters"));
    panel.append_child(&h)?;
    let master = checkbox(document, "", "all", "Show / Hide All", filters.master())?;
    if let Ok(Some(input)) = master.query_selector("input") {
        input.set_id(FILTER_TOGGLE_ALL);
    }
    panel.append_child(&master)?;

    if !filters.poi_groups.is_empty() {
        section(document, &panel, "Points of Interest")?;
        for g in &filters.poi_groups {
            panel.append_child(&checkbox(document, "poi-filter-checkbox", &g.name, &g.name, tri(g.checked))?.into())?;
        }
    }
    if !filters.region_groups.is_empty() {
        section(document, &panel, "Regions")?;
        for g in &filters.region_groups {
            let group = document.create_element("div")?;
            group.set_class_name("filter-group closed");
            let header = document.create_element("div")?;
            header.set_class_name("filter-group-header");
            header.set_inner_html("<span class=\"folder-toggle-icon\"></span>");
            header.append_child(&checkbox(document, "region-group-filter", &g.name, &g.name, g.state())?.into())?;
            group.append_child(&header)?;
            let nested = document.create_element("div")?;
            nested.set_class_name("nested-filter-list");
            for v in &g.values {
                let item = checkbox(document, "region-type-filter", &v.name, &v.name, tri(v.checked))?;
                if let Ok(Some(input)) = item.query_selector("input") {
                    input.set_attribute("data-group", &g.name)?;
                }
                nested.append_child(&item)?;
            }
            group.append_child(&nested)?;
            panel.append_child(&group)?;
        }
    }
    if !filters.road_types.is_empty() {
        section(document, &panel, "Roads")?;
        for t in &filters.road_types {
            panel.append_child(&checkbox(
                document,
                "line-type-filter",
                &t.name,
                &road_type_label(&t.name),
                tri(t.checked),
            )?.into())?;
        }
    }
    Ok(())
}

/// Push checkbox states back into the panel after a change.
pub fn sync_filters(document: &Document, filters: &FilterTree) {
    for el in elements(document, "#poi-filter-container input[type=checkbox]") {
        let Ok(input) = el.dyn_into::<HtmlInputElement>() else {
            continue;
        };
        let value = input.value();
        let class = input.class_name();
        let state = if input.id() == FILTER_TOGGLE_ALL {
            filters.master()
        } else {
            match class.as_str() {
                "poi-filter-checkbox" => tri(filters.poi_group_checked(&value)),
                "region-group-filter" => filters
                    .region_groups
                    .iter()
                    .find(|g| g.name == value)
                    .map(|g| g.state())
                    .unwrap_or(TriState::Checked),
                "region-type-filter" => {
                    let group = input.get_attribute("data-group").unwrap_or_default();
                    tri(filters.region_value_checked_in(&group, &value))
                }
                "line-type-filter" => tri(filters.road_type_checked(&value)),
                _ => continue,
            }
        };
        input.set_checked(state.checked());
        input.set_indeterminate(state.indeterminate());
    }
}

pub fn set_filter_panel(document: &Document, open: bool) {
    if let Some(panel) = document.get_element_by_id(FILTER_PANEL) {
        set_class(&panel, "visible", open);
    }
    if let Some(btn) = document.get_element_by_id(TOGGLE_FILTERS_BTN) {
        set_class(&btn, "active", open);
    }
}

pub fn filter_panel_open(document: &Document) -> bool {
    document
        .get_element_by_id(FILTER_PANEL)
        .is_some_and(|p| p.class_list().contains("visible"))
}

pub fn render_search_results(document: &Document, hits: &[SearchHit]) -> Result<(), JsValue> {
    let Some(results) = document.get_element_by_id(SEARCH_RESULTS) else {
        return Ok(());
    };
    results.set_inner_html("");
    for hit in hits {
        let item = document.create_element("div")?;
        item.set_class_name("search-result-item");
        item.set_inner_html(&hit.html);
        item.set_attribute("title", &format!("Go to {}", hit.name))?;
        item.set_attribute("data-record", &hit.record.to_string())?;
        results.append_child(&item)?;
    }
    set_display(document, SEARCH_RESULTS, !hits.is_empty(), "block");
    Ok(())
}

pub fn reset_search(document: &Document) {
    if let Some(input) = document
        .get_element_by_id(SEARCH_INPUT)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    {
        input.set_value("");
    }
    set_display(document, SEARCH_RESULTS, false, "block");
}

pub fn focus_search(document: &Document) {
    if let Some(input) = html_element(document, SEARCH_INPUT) {
        let _ = input.focus();
    }
}

/// Show the controls the active map supports.
pub fn render_controls(document: &Document, controls: Controls, markers_visible: bool) {
    set_display(document, SEARCH_CONTROL, controls.search, "block");
    set_display(document, TOGGLE_FILTERS_BTN, controls.filters, "");
    set_display(document, TOGGLE_MARKERS_BTN, controls.markers_toggle, "");
    set_display(document, MEASURE_BTN, controls.measure, "");
    set_display(document, TOGGLE_COORDS_BTN, controls.coords, "");
    if !controls.search {
        set_display(document, SEARCH_RESULTS, false, "block");
    }
    if !controls.filters {
        set_filter_panel(document, false);
    }
    if !controls.coords {
        set_coords(document, None, false);
    }
    if let Some(btn) = document.get_element_by_id(TOGGLE_MARKERS_BTN) {
        set_class(&btn, "markers-hidden", !markers_visible);
    }
}

pub fn set_measuring(document: &Document, active: bool) {
    if let Some(btn) = document.get_element_by_id(MEASURE_BTN) {
        set_class(&btn, "active", active);
    }
    if let Some(map) = document.get_element_by_id(MAP_CONTAINER) {
        set_class(&map, "measuring-cursor", active);
    }
}

/// Fill the blurb panel and show its button when there is text. The panel
/// itself starts closed.
pub fn set_blurb(document: &Document, text: Option<&str>, embedded: bool) {
    if let Some(el) = document.get_element_by_id(MAP_BLURB) {
        el.set_inner_html(text.unwrap_or_default());
        set_class(&el, "visible", false);
    }
    set_display(document, TOGGLE_BLURB_BTN, text.is_some() && !embedded, "");
    if let Some(btn) = document.get_element_by_id(TOGGLE_BLURB_BTN) {
        set_class(&btn, "active", false);
    }
}

pub fn toggle_blurb(document: &Document, open: Option<bool>) {
    let (Some(el), Some(btn)) = (
        document.get_element_by_id(MAP_BLURB),
        document.get_element_by_id(TOGGLE_BLURB_BTN),
    ) else {
        return;
    };
    let open = open.unwrap_or_else(|| !el.class_list().contains("visible"));
    set_class(&el, "visible", open);
    set_class(&btn, "active", open);
}

/// Readout text, or `None` to blank it.
pub fn set_coords(document: &Document, text: Option<&str>, locked: bool) {
    let Ok(Some(el)) = document.query_selector(".coordinate-control") else {
        return;
    };
    if let Some(text) = text {
        el.set_text_content(Some(text));
    } else if !locked {
        el.set_text_content(Some(""));
    }
    set_class(&el, "locked", locked);
}

pub fn toggle_coords(document: &Document) {
    if let (Ok(Some(el)), Some(btn)) = (
        document.query_selector(".coordinate-control"),
        document.get_element_by_id(TOGGLE_COORDS_BTN),
    ) {
        let hidden = el.class_list().contains("hidden");
        set_class(&el, "hidden", !hidden);
        set_class(&btn, "active", hidden);
    }
}

pub fn toggle_help(document: &Document, open: Option<bool>) {
    let Some(modal) = html_element(document, HELP_MODAL) else {
        return;
    };
    let shown = modal.style().get_property_value("display").ok().as_deref() == Some("flex");
    let open = open.unwrap_or(!shown);
    let _ = modal
        .style()
        .set_property("display", if open { "flex" } else { "none" });
}

fn loading_part(document: &Document, selector: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(LOADING_INDICATOR)?
        .query_selector(selector)
        .ok()??
        .dyn_into()
        .ok()
}

fn set_loading_text(document: &Document, text: &str) {
    set_display(document, LOADING_INDICATOR, true, "flex");
    if let Some(el) = loading_part(document, ".loading-text") {
        el.set_text_content(Some(text));
    }
}

fn set_progress(document: &Document, percent: f64) {
    if let Some(bar) = loading_part(document, ".progress-bar") {
        let _ = bar.style().set_property("width", &format!("{percent}%"));
    }
}

/// Show a load error in the indicator; it stays until the next load.
pub fn show_loading_error(document: &Document, text: &str) {
    set_loading_text(document, text);
    set_progress(document, 0.0);
    if let Some(spinner) = loading_part(document, ".spinner") {
        let _ = spinner.style().set_property("display", "none");
    }
}

/// Fake progress shown while the background image loads. Stops when dropped.
pub struct ProgressTicker {
    window: Window,
    handle: i32,
    _tick: Closure<dyn FnMut()>,
}

impl ProgressTicker {
    pub fn start(window: &Window, document: &Document) -> Option<Self> {
        set_loading_text(document, "Loading Map...");
        set_progress(document, 0.0);
        if let Some(spinner) = loading_part(document, ".spinner") {
            let _ = spinner.style().set_property("display", "block");
        }
        let progress = Rc::new(Cell::new(0.0));
        let doc = document.clone();
        let tick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let p = progress.get();
            if p < PROGRESS_CAP {
                let next = (p + 2.0 + js_sys::Math::random() * 3.0).min(PROGRESS_CAP);
                progress.set(next);
                set_progress(&doc, next);
            }
        }));
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                PROGRESS_TICK_MS,
            )
            .ok()?;
        Some(ProgressTicker {
            window: window.clone(),
            handle,
            _tick: tick,
        })
    }

    /// Jump to 100% and hide the indicator shortly after.
    pub fn finish(self, document: &Document) {
        set_progress(document, 100.0);
        let doc = document.clone();
        let hide = Closure::once_into_js(move || set_display(&doc, LOADING_INDICATOR, false, "flex"));
        let _ = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(hide.unchecked_ref(), HIDE_DELAY_MS);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.handle);
    }
}
