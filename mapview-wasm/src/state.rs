use std::cell::RefCell;
use std::rc::Rc;

use mapview_core::ViewSession;
use mapview_core::ViewerConfig;
use mapview_core::launch::LaunchOptions;
use mapview_core::nav::NavSync;
use mapview_core::prefs::Preferences;
use mapview_core::sidebar::NavEntry;
use web_sys::{Document, Window};

use crate::audio::Ambient;
use crate::leaflet::LeafletSurface;
use crate::loading::PendingLoad;
use crate::measure_input::MeasureListeners;
use crate::ui::ProgressTicker;
use crate::utils::LocalStore;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct App {
    pub window: Window,
    pub document: Document,
    pub config: ViewerConfig,
    pub launch: LaunchOptions,
    pub session: ViewSession,
    pub surface: LeafletSurface,
    pub nav: NavSync,
    pub nav_tree: Vec<NavEntry>,
    pub prefs: Preferences,
    pub store: LocalStore,
    pub ambient: Ambient,
    pub measure_listeners: Option<MeasureListeners>,
    pub pending: Option<PendingLoad>,
    pub progress: Option<ProgressTicker>,
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
}

/// Run `f` on the app unless it is missing or already borrowed further up the
/// stack.
pub fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    let app = STATE.with(|st| st.borrow().clone())?;
    let Ok(mut app) = app.try_borrow_mut() else {
        log::debug!("Nested event ignored while the viewer is busy");
        return None;
    };
    Some(f(&mut app))
}
