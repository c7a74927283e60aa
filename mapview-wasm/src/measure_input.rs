use wasm_bindgen::prelude::*;
use web_sys::{KeyboardEvent, Window};

use crate::leaflet::{Map, MouseEvent};
use crate::state::with_app;

type PointerHandler = Closure<dyn FnMut(MouseEvent)>;

/// Pointer and Escape listeners of an active measurement. Registered together
/// and removed together when dropped.
pub struct MeasureListeners {
    map: Map,
    window: Window,
    pointer: Vec<(&'static str, PointerHandler)>,
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
}

impl MeasureListeners {
    pub fn attach(window: &Window, map: &Map) -> Result<Self, JsValue> {
        let click = PointerHandler::wrap(Box::new(|e: MouseEvent| {
            with_app(|app| app.measure_click(e.position()));
        }));
        let mousemove = PointerHandler::wrap(Box::new(|e: MouseEvent| {
            with_app(|app| app.measure_move(e.position()));
        }));
        let dblclick = PointerHandler::wrap(Box::new(|_e: MouseEvent| {
            with_app(|app| app.finish_measure());
        }));
        let pointer = vec![("click", click), ("mousemove", mousemove), ("dblclick", dblclick)];
        for (event, handler) in &pointer {
            map.on(event, handler.as_ref().unchecked_ref());
        }

        // Capture phase, so the shortcut handler does not see an Escape that
        // ended the measurement.
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(|e: KeyboardEvent| {
            if e.key() != "Escape" {
                return;
            }
            if with_app(|app| app.escape_measurement()).unwrap_or(false) {
                e.prevent_default();
                e.stop_immediate_propagation();
            }
        }));
        window.add_event_listener_with_callback_and_bool(
            "keydown",
            keydown.as_ref().unchecked_ref(),
            true,
        )?;
        log::debug!("Measurement listeners attached");
        Ok(MeasureListeners {
            map: map.clone(),
            window: window.clone(),
            pointer,
            keydown,
        })
    }
}

impl Drop for MeasureListeners {
    fn drop(&mut self) {
        for (event, handler) in &self.pointer {
            self.map.off(event, handler.as_ref().unchecked_ref());
        }
        let _ = self.window.remove_event_listener_with_callback_and_bool(
            "keydown",
            self.keydown.as_ref().unchecked_ref(),
            true,
        );
        log::debug!("Measurement listeners detached");
    }
}
