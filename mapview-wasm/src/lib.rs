use std::cell::RefCell;
use std::rc::Rc;

use mapview_core::launch::LaunchOptions;
use mapview_core::nav::{Fragment, NavSync, SidebarState};
use mapview_core::popup::expand_label;
use mapview_core::prefs::Preferences;
use mapview_core::{CatalogLoader, ViewSession, ViewerConfig, sidebar};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window};

mod app;
mod audio;
mod constants;
mod events;
mod leaflet;
mod loading;
mod measure_input;
mod source;
mod state;
mod ui;
mod utils;

use crate::audio::Ambient;
use crate::constants::MAP_CONTAINER;
use crate::leaflet::LeafletSurface;
use crate::source::FetchSource;
use crate::state::{App, STATE};
use crate::utils::{LocalStore, init_logging, set_class};

/// Called from the popup markup: swap a popup between summary and full text.
#[wasm_bindgen(js_name = togglePopupExpand)]
pub fn toggle_popup_expand(button: Element) {
    let Some(container) = button.previous_element_sibling() else {
        return;
    };
    let expanded = !container.class_list().contains("expanded");
    set_class(&container, "expanded", expanded);
    button.set_text_content(Some(expand_label(expanded)));
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_logging();
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let search = window.location().search().unwrap_or_default();
    let launch = LaunchOptions::from_query(&search);
    let store = LocalStore::new(&window);
    let prefs = Preferences::load(&store, launch.embedded);
    ui::apply_theme(&document, prefs.theme);
    ui::set_sound_icon(&document, prefs.sound_enabled);
    if launch.embedded {
        ui::apply_embedded(&document);
    }

    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = boot(window, document, search, launch, prefs, store).await {
            log::error!("Viewer failed to start: {err:?}");
        }
    });
    Ok(())
}

async fn boot(
    window: Window,
    document: Document,
    search: String,
    launch: LaunchOptions,
    prefs: Preferences,
    store: LocalStore,
) -> Result<(), JsValue> {
    let config = ViewerConfig::default();
    let catalog = match CatalogLoader::new(FetchSource::new(window.clone(), &config), &config)
        .load()
        .await
    {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            ui::show_catalog_error(&document);
            return Ok(());
        }
    };
    log::info!("Catalog ready: {} root entries", catalog.roots.len());

    let nav_tree = sidebar::build(&catalog.roots);
    ui::render_sidebar(&document, &nav_tree)?;

    let fragment = Fragment::decode(&window.location().hash().unwrap_or_default());
    let sidebar_state = if launch.embedded {
        SidebarState::Closed
    } else {
        fragment.sidebar
    };
    let initial = catalog
        .initial_map(fragment.map_id())
        .map(|m| m.id.clone());

    let mut session = ViewSession::new(catalog, &config);
    session.set_sidebar(sidebar_state);
    ui::apply_sidebar(&document, sidebar_state);

    let surface = LeafletSurface::new(MAP_CONTAINER)?;
    let ambient = Ambient::new(&document);
    ambient.sync(&prefs);
    let state = Rc::new(RefCell::new(App {
        nav: NavSync::new(&search),
        window,
        document,
        config,
        launch,
        session,
        surface,
        nav_tree,
        prefs,
        store,
        ambient,
        measure_listeners: None,
        pending: None,
        progress: None,
    }));
    STATE.with(|st| st.replace(Some(state.clone())));

    {
        let mut app = state.borrow_mut();
        let op = app
            .nav
            .initial(initial.as_deref().unwrap_or_default(), sidebar_state);
        app.record(op);
        match initial {
            Some(id) => {
                // The start-up entry was just written; do not push another.
                app.nav.begin_replay();
                app.load_map(&id);
                app.nav.end_replay();
            }
            None => {
                log::warn!("No loadable map in the catalog");
                ui::render_controls(
                    &app.document,
                    app.session.controls(),
                    app.session.markers_visible(),
                );
            }
        }
    }
    events::attach_ui(state)?;
    Ok(())
}
