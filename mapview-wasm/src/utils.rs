use std::sync::Once;

use mapview_core::error::SourceError;
use mapview_core::prefs::KeyValueStore;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlElement, Storage, Window};

static LOGGER: Once = Once::new();

/// Log a message to the browser console.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Route `log` records and panics to the console. Safe to call twice.
pub fn init_logging() {
    LOGGER.call_once(|| {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log("console logger already installed");
        }
    });
}

/// Build an absolute URL for an asset, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_default();
    if base.is_empty() {
        return p.to_string();
    }
    let base = if base.ends_with('/') {
        base
    } else {
        format!("{base}/")
    };
    format!("{base}{}", p.trim_start_matches('/'))
}

/// GET a text resource. 404 is reported apart from other HTTP failures.
pub async fn fetch_text(window: &Window, url: &str) -> Result<String, SourceError> {
    let network = |e: JsValue| SourceError::Network(format!("{e:?}"));
    let resp_value = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(network)?;
    let resp: web_sys::Response = resp_value.dyn_into().map_err(network)?;
    if resp.status() == 404 {
        return Err(SourceError::NotFound);
    }
    if !resp.ok() {
        return Err(SourceError::Status {
            code: resp.status(),
            text: resp.status_text(),
        });
    }
    let text_js = JsFuture::from(resp.text().map_err(network)?)
        .await
        .map_err(network)?;
    text_js
        .as_string()
        .ok_or_else(|| SourceError::Network(format!("{url}: body is not text")))
}

/// `window.localStorage`, when the browser allows it.
pub struct LocalStore(Option<Storage>);

impl LocalStore {
    pub fn new(window: &Window) -> Self {
        LocalStore(window.local_storage().ok().flatten())
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(s) = &self.0
            && s.set_item(key, value).is_err()
        {
            log::warn!("Could not save preference {key}");
        }
    }
}

pub fn html_element(document: &Document, id: &str) -> Option<HtmlElement> {
    document.get_element_by_id(id)?.dyn_into().ok()
}

pub fn set_display(document: &Document, id: &str, shown: bool, display: &str) {
    if let Some(el) = html_element(document, id) {
        let _ = el
            .style()
            .set_property("display", if shown { display } else { "none" });
    }
}

pub fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

pub fn is_shown(document: &Document, id: &str) -> bool {
    html_element(document, id)
        .and_then(|el| el.style().get_property_value("display").ok())
        .is_some_and(|d| !d.is_empty() && d != "none")
}
