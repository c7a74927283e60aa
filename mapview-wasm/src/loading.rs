use mapview_core::ImageOutcome;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlImageElement, Window};

use crate::leaflet::Layer;
use crate::state::with_app;

type Callback = Closure<dyn FnMut()>;

/// Races the image preload, the overlay's own load events and a timer. The
/// first one to fire settles `generation`; the session ignores the rest.
pub struct PendingLoad {
    window: Window,
    img: HtmlImageElement,
    timer: Option<i32>,
    overlay: Option<(Layer, Callback, Callback)>,
    _preload: [Callback; 3],
}

fn report(generation: u64, outcome: ImageOutcome) -> Callback {
    Closure::<dyn FnMut()>::wrap(Box::new(move || {
        with_app(|app| app.finish_loading(generation, outcome));
    }))
}

impl PendingLoad {
    pub fn start(
        window: &Window,
        overlay: Option<&Layer>,
        generation: u64,
        url: &str,
        timeout_ms: i32,
    ) -> Result<Self, JsValue> {
        let img = HtmlImageElement::new()?;
        let loaded = report(generation, ImageOutcome::Loaded);
        let failed = report(generation, ImageOutcome::Failed);
        let expired = report(generation, ImageOutcome::TimedOut);
        img.set_onload(Some(loaded.as_ref().unchecked_ref()));
        img.set_onerror(Some(failed.as_ref().unchecked_ref()));

        let overlay = overlay.map(|layer| {
            let ok = report(generation, ImageOutcome::Loaded);
            let err = report(generation, ImageOutcome::Failed);
            layer.on_layer("load", ok.as_ref().unchecked_ref());
            layer.on_layer("error", err.as_ref().unchecked_ref());
            (layer.clone(), ok, err)
        });

        let timer = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            expired.as_ref().unchecked_ref(),
            timeout_ms,
        )?;
        img.set_src(url);
        Ok(PendingLoad {
            window: window.clone(),
            img,
            timer: Some(timer),
            overlay,
            _preload: [loaded, failed, expired],
        })
    }

    /// Stop the timer and the preload once the load has been decided.
    pub fn settle(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        self.img.set_onload(None);
        self.img.set_onerror(None);
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.settle();
        if let Some((layer, ok, err)) = &self.overlay {
            layer.off_layer("load", ok.as_ref().unchecked_ref());
            layer.off_layer("error", err.as_ref().unchecked_ref());
        }
    }
}
